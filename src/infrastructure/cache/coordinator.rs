use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use super::store::{CategoryStore, Lookup};
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::{CacheConfig, Cacheable, Category, EntityId};
use crate::domain::ports::TtlStore;

struct CacheState<V> {
    stores: HashMap<Category, CategoryStore<V>>,
    enabled: bool,
    disabled_categories: HashSet<Category>,
    disabled_ids: HashSet<EntityId>,
}

impl<V: Clone> CacheState<V> {
    fn store(&self, category: Category) -> CacheResult<&CategoryStore<V>> {
        self.stores
            .get(&category)
            .ok_or_else(|| CacheError::UnknownCategory(category.to_string()))
    }

    fn store_mut(&mut self, category: Category) -> CacheResult<&mut CategoryStore<V>> {
        self.stores
            .get_mut(&category)
            .ok_or_else(|| CacheError::UnknownCategory(category.to_string()))
    }

    /// Reason the switches bypass this category (and optionally id), if any.
    fn bypass_reason(&self, category: Category, id: Option<&EntityId>) -> Option<&'static str> {
        if !self.enabled {
            Some("cache disabled")
        } else if self.disabled_categories.contains(&category) {
            Some("category disabled")
        } else if id.is_some_and(|id| self.disabled_ids.contains(id)) {
            Some("id disabled")
        } else {
            None
        }
    }
}

/// Owns one TTL store per registered category and the cache switches.
///
/// Every mutation (writes, pops, switch changes and the removal of expired
/// entries) goes through one write guard shared by all categories. Reads
/// take the shared side, so they never observe a half-written entry; when a
/// read runs into an expired entry it drops the shared guard and reclaims
/// the entry under the write guard, reporting a miss either way.
///
/// The switches gate reads as well as writes: a disabled category or id is
/// never served from the cache, so callers always fall through to the network.
pub struct CacheCoordinator<V> {
    state: RwLock<CacheState<V>>,
}

impl<V: Cacheable> CacheCoordinator<V> {
    /// Coordinator with one store per `(category, ttl)` registration.
    pub fn new(registrations: impl IntoIterator<Item = (Category, Duration)>) -> Self {
        let stores = registrations
            .into_iter()
            .map(|(category, ttl)| (category, CategoryStore::new(category, ttl)))
            .collect();

        Self {
            state: RwLock::new(CacheState {
                stores,
                enabled: true,
                disabled_categories: HashSet::new(),
                disabled_ids: HashSet::new(),
            }),
        }
    }

    /// Coordinator registering every category, with TTLs and switches taken from config.
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut state = Self::new(
            Category::ALL
                .into_iter()
                .map(|category| (category, config.ttl_for(category))),
        )
        .state
        .into_inner();

        state.enabled = config.enabled;
        state.disabled_categories = config
            .disabled_categories
            .iter()
            .filter_map(|name| match name.parse::<Category>() {
                Ok(category) => Some(category),
                Err(err) => {
                    warn!(%err, "ignoring unknown category in disabled_categories");
                    None
                }
            })
            .collect();

        Self {
            state: RwLock::new(state),
        }
    }

    /// Live value for `id`, or `None` on a miss.
    pub async fn get(&self, category: Category, id: &EntityId) -> CacheResult<Option<V>> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            let store = state.store(category)?;
            if let Some(reason) = state.bypass_reason(category, Some(id)) {
                debug!(%category, %id, reason, "cache read bypassed");
                return Ok(None);
            }
            match store.peek(id, now) {
                Lookup::Live(value) => {
                    debug!(%category, %id, "cache hit");
                    return Ok(Some(value.clone()));
                }
                Lookup::Missing => {
                    debug!(%category, %id, "cache miss");
                    return Ok(None);
                }
                Lookup::Expired => {}
            }
        }

        // A writer may have replaced the entry since the shared read; `contains`
        // only removes it if it is still expired.
        let mut state = self.state.write().await;
        state.store_mut(category)?.contains(id);
        Ok(None)
    }

    /// Whether a live entry exists for `id`.
    pub async fn contains(&self, category: Category, id: &EntityId) -> CacheResult<bool> {
        Ok(self.get(category, id).await?.is_some())
    }

    /// Insert or overwrite one value. Returns false if the switches suppressed the write.
    pub async fn set(&self, category: Category, value: V, bulk_eligible: bool) -> CacheResult<bool> {
        self.set_many(category, std::iter::once(value), bulk_eligible)
            .await
    }

    /// Insert or overwrite several values under a single guard acquisition.
    ///
    /// The whole call is a no-op if caching is disabled, the category is
    /// disabled, or any value's id is disabled.
    pub async fn set_many(
        &self,
        category: Category,
        values: impl IntoIterator<Item = V>,
        bulk_eligible: bool,
    ) -> CacheResult<bool> {
        let values: Vec<(EntityId, V)> = values
            .into_iter()
            .map(|value| (value.cache_id(), value))
            .collect();

        let mut state = self.state.write().await;
        state.store(category)?;

        let suppressed = state.bypass_reason(category, None).or_else(|| {
            values
                .iter()
                .any(|(id, _)| state.disabled_ids.contains(id))
                .then_some("id disabled")
        });
        if let Some(reason) = suppressed {
            debug!(%category, count = values.len(), reason, "cache write suppressed");
            return Ok(false);
        }

        let now = Instant::now();
        let store = state.store_mut(category)?;
        let count = values.len();
        for (id, value) in values {
            store.insert(id, value, bulk_eligible, now);
        }
        debug!(%category, count, bulk_eligible, "cache write");
        Ok(true)
    }

    /// Remove the entry for `id` if present. Absence is not an error.
    pub async fn pop(&self, category: Category, id: &EntityId) -> CacheResult<Option<V>> {
        let mut state = self.state.write().await;
        let removed = state.store_mut(category)?.delete(id);
        if removed.is_some() {
            debug!(%category, %id, "cache entry removed");
        }
        Ok(removed)
    }

    /// Live entries that were written as part of a complete listing.
    ///
    /// A listing holding a disabled id is reported as a miss rather than
    /// served with that entry filtered out, so callers never take a
    /// shortened listing for the full one.
    pub async fn all(&self, category: Category) -> CacheResult<Vec<V>> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            let store = state.store(category)?;
            if let Some(reason) = state.bypass_reason(category, None) {
                debug!(%category, reason, "cache listing bypassed");
                return Ok(vec![]);
            }
            if Self::lists_disabled_id(&state, store, now) {
                debug!(%category, "cache listing holds a disabled id");
                return Ok(vec![]);
            }
            if let Some(values) = store.bulk_snapshot(now) {
                return Ok(values);
            }
        }

        let mut state = self.state.write().await;
        let values = state.store_mut(category)?.list_bulk_eligible();
        if Self::lists_disabled_id(&state, state.store(category)?, now) {
            debug!(%category, "cache listing holds a disabled id");
            return Ok(vec![]);
        }
        Ok(values)
    }

    fn lists_disabled_id(state: &CacheState<V>, store: &CategoryStore<V>, now: Instant) -> bool {
        !state.disabled_ids.is_empty() && store.lists_any(now, |id| state.disabled_ids.contains(id))
    }

    /// Take every entry of a category out of the cached listing, so the next
    /// `all()` misses. Entries stay available to `get`. Returns how many
    /// entries were unlisted.
    pub async fn invalidate_listing(&self, category: Category) -> CacheResult<usize> {
        let mut state = self.state.write().await;
        Ok(state.store_mut(category)?.unlist_all())
    }

    /// Number of stored entries in a category, including expired ones not yet reclaimed.
    pub async fn len(&self, category: Category) -> CacheResult<usize> {
        Ok(self.state.read().await.store(category)?.len())
    }

    /// Whether a category holds no entries at all.
    pub async fn is_empty(&self, category: Category) -> CacheResult<bool> {
        Ok(self.len(category).await? == 0)
    }

    /// TTL of a registered category.
    pub async fn ttl(&self, category: Category) -> CacheResult<Duration> {
        Ok(self.state.read().await.store(category)?.ttl())
    }

    /// Categories registered at construction.
    pub async fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> =
            self.state.read().await.stores.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Turn caching on or off entirely.
    pub async fn set_enabled(&self, enabled: bool) {
        self.state.write().await.enabled = enabled;
        debug!(enabled, "cache switch changed");
    }

    /// Whether caching is globally enabled.
    pub async fn is_enabled(&self) -> bool {
        self.state.read().await.enabled
    }

    /// Stop caching one category.
    pub async fn disable_category(&self, category: Category) -> CacheResult<()> {
        let mut state = self.state.write().await;
        state.store(category)?;
        state.disabled_categories.insert(category);
        Ok(())
    }

    /// Resume caching one category.
    pub async fn enable_category(&self, category: Category) -> CacheResult<()> {
        let mut state = self.state.write().await;
        state.store(category)?;
        state.disabled_categories.remove(&category);
        Ok(())
    }

    /// Stop caching one specific id, in every category.
    pub async fn disable_id(&self, id: EntityId) {
        self.state.write().await.disabled_ids.insert(id);
    }

    /// Resume caching one specific id.
    pub async fn enable_id(&self, id: &EntityId) {
        self.state.write().await.disabled_ids.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::advance;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: u64,
        label: &'static str,
    }

    impl Cacheable for Item {
        fn cache_id(&self) -> EntityId {
            EntityId::Int(self.id)
        }
    }

    fn item(id: u64) -> Item {
        Item { id, label: "item" }
    }

    fn coordinator(ttl: Duration) -> CacheCoordinator<Item> {
        CacheCoordinator::new([(Category::Console, ttl), (Category::ScheduledTask, ttl)])
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let cache = coordinator(Duration::from_secs(30));
        assert!(cache.set(Category::Console, item(7), false).await.unwrap());

        let cached = cache.get(Category::Console, &EntityId::Int(7)).await.unwrap();
        assert_eq!(cached, Some(item(7)));
    }

    #[tokio::test]
    async fn test_unknown_category_is_an_error() {
        let cache = coordinator(Duration::from_secs(30));

        let err = cache.get(Category::WebApp, &EntityId::Int(1)).await.unwrap_err();
        assert_eq!(err, CacheError::UnknownCategory("webapp".to_string()));
        assert!(cache.set(Category::WebApp, item(1), false).await.is_err());
        assert!(cache.pop(Category::WebApp, &EntityId::Int(1)).await.is_err());
        assert!(cache.all(Category::WebApp).await.is_err());
    }

    #[tokio::test]
    async fn test_miss_is_not_an_error() {
        let cache = coordinator(Duration::from_secs(30));
        assert_eq!(cache.get(Category::Console, &EntityId::Int(99)).await, Ok(None));
        assert_eq!(cache.pop(Category::Console, &EntityId::Int(99)).await, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_read_reclaims_entry() {
        let cache = coordinator(Duration::from_secs(1));
        cache.set(Category::Console, item(7), false).await.unwrap();

        advance(Duration::from_millis(1100)).await;

        assert_eq!(cache.get(Category::Console, &EntityId::Int(7)).await, Ok(None));
        assert_eq!(cache.len(Category::Console).await, Ok(0));
    }

    #[tokio::test]
    async fn test_pop_removes() {
        let cache = coordinator(Duration::from_secs(30));
        cache.set(Category::Console, item(1), false).await.unwrap();

        let popped = cache.pop(Category::Console, &EntityId::Int(1)).await.unwrap();
        assert_eq!(popped, Some(item(1)));
        assert_eq!(cache.get(Category::Console, &EntityId::Int(1)).await, Ok(None));
    }

    #[tokio::test]
    async fn test_bulk_isolation() {
        let cache = coordinator(Duration::from_secs(30));
        cache.set(Category::Console, item(1), false).await.unwrap();
        assert!(cache.all(Category::Console).await.unwrap().is_empty());

        cache
            .set_many(Category::Console, [item(2), item(3)], true)
            .await
            .unwrap();
        let mut listed = cache.all(Category::Console).await.unwrap();
        listed.sort_by_key(|item| item.id);
        assert_eq!(listed, vec![item(2), item(3)]);
    }

    #[tokio::test]
    async fn test_categories_are_isolated() {
        let cache = coordinator(Duration::from_secs(30));
        cache.set(Category::Console, item(1), true).await.unwrap();

        assert_eq!(cache.get(Category::ScheduledTask, &EntityId::Int(1)).await, Ok(None));
        assert!(cache.all(Category::ScheduledTask).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_global_switch_suppresses_reads_and_writes() {
        let cache = coordinator(Duration::from_secs(30));
        cache.set(Category::Console, item(1), true).await.unwrap();
        cache.set_enabled(false).await;

        assert!(!cache.set(Category::Console, item(2), false).await.unwrap());
        assert_eq!(cache.get(Category::Console, &EntityId::Int(1)).await, Ok(None));
        assert!(cache.all(Category::Console).await.unwrap().is_empty());

        cache.set_enabled(true).await;
        assert_eq!(cache.get(Category::Console, &EntityId::Int(2)).await, Ok(None));
        assert_eq!(
            cache.get(Category::Console, &EntityId::Int(1)).await,
            Ok(Some(item(1)))
        );
    }

    #[tokio::test]
    async fn test_category_switch() {
        let cache = coordinator(Duration::from_secs(30));
        cache.disable_category(Category::Console).await.unwrap();

        assert!(!cache.set(Category::Console, item(1), false).await.unwrap());
        assert!(cache.set(Category::ScheduledTask, item(1), false).await.unwrap());
        assert_eq!(cache.len(Category::Console).await, Ok(0));

        cache.enable_category(Category::Console).await.unwrap();
        assert!(cache.set(Category::Console, item(1), false).await.unwrap());
        assert!(cache.disable_category(Category::WebApp).await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_id_suppresses_whole_batch() {
        let cache = coordinator(Duration::from_secs(30));
        cache.disable_id(EntityId::Int(2)).await;

        let written = cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(cache.len(Category::Console).await, Ok(0));

        cache.enable_id(&EntityId::Int(2)).await;
        assert!(cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap());
        assert_eq!(cache.len(Category::Console).await, Ok(2));
    }

    #[tokio::test]
    async fn test_disabled_id_is_never_served() {
        let cache = coordinator(Duration::from_secs(30));
        cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap();
        cache.disable_id(EntityId::Int(1)).await;

        assert_eq!(cache.get(Category::Console, &EntityId::Int(1)).await, Ok(None));
        assert!(
            cache.all(Category::Console).await.unwrap().is_empty(),
            "listing with a disabled id is a miss, not a shortened listing"
        );

        cache.enable_id(&EntityId::Int(1)).await;
        assert_eq!(cache.all(Category::Console).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_id_outside_listing_does_not_hide_it() {
        let cache = coordinator(Duration::from_secs(30));
        cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap();
        cache.disable_id(EntityId::Int(9)).await;

        assert_eq!(cache.all(Category::Console).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_set_keeps_entry_listed() {
        let cache = coordinator(Duration::from_secs(30));
        cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap();
        cache
            .set(Category::Console, Item { id: 1, label: "refetched" }, false)
            .await
            .unwrap();

        let mut listed = cache.all(Category::Console).await.unwrap();
        listed.sort_by_key(|item| item.id);
        assert_eq!(listed, vec![Item { id: 1, label: "refetched" }, item(2)]);
    }

    #[tokio::test]
    async fn test_invalidate_listing_keeps_single_reads() {
        let cache = coordinator(Duration::from_secs(30));
        cache
            .set_many(Category::Console, [item(1), item(2)], true)
            .await
            .unwrap();

        assert_eq!(cache.invalidate_listing(Category::Console).await, Ok(2));
        assert!(cache.all(Category::Console).await.unwrap().is_empty());
        assert_eq!(
            cache.get(Category::Console, &EntityId::Int(2)).await,
            Ok(Some(item(2)))
        );
        assert!(cache.invalidate_listing(Category::WebApp).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_lose_nothing() {
        let cache = Arc::new(coordinator(Duration::from_secs(30)));
        let mut handles = vec![];

        for id in 0..64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .set(Category::Console, Item { id, label: "concurrent" }, false)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(cache.len(Category::Console).await, Ok(64));
    }

    #[tokio::test]
    async fn test_from_config_applies_ttls_and_switches() {
        let mut config = CacheConfig::default();
        config.ttl_overrides.insert("webapp".to_string(), 120);
        config.disabled_categories = vec!["console".to_string(), "bogus".to_string()];

        let cache: CacheCoordinator<Item> = CacheCoordinator::from_config(&config);

        assert_eq!(cache.categories().await, Category::ALL.to_vec());
        assert_eq!(cache.ttl(Category::WebApp).await, Ok(Duration::from_secs(120)));
        assert_eq!(cache.ttl(Category::Console).await, Ok(Duration::from_secs(30)));
        assert!(!cache.set(Category::Console, item(1), false).await.unwrap());
        assert!(cache.is_enabled().await);
    }
}
