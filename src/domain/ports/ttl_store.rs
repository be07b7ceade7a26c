use crate::domain::models::EntityId;

/// Named interface of a TTL-bounded key/value store.
///
/// Every read path checks expiry first; an expired entry is removed and the
/// call reports absence, exactly as if the key had never been set.
pub trait TtlStore<V> {
    /// Live value for `id`, if any
    fn get(&mut self, id: &EntityId) -> Option<V>;

    /// Insert or replace the entry for `id`
    fn set(&mut self, id: EntityId, value: V, bulk_eligible: bool);

    /// Whether a live entry exists for `id`
    fn contains(&mut self, id: &EntityId) -> bool;

    /// Remove the entry for `id`, returning its value if it was live
    fn delete(&mut self, id: &EntityId) -> Option<V>;

    /// Every live value that was written as part of a complete listing
    fn list_bulk_eligible(&mut self) -> Vec<V>;
}
