use std::collections::HashMap;
use tokio::time::{Duration, Instant};
use tracing::debug;

use super::entry::CacheEntry;
use crate::domain::models::{Category, EntityId};
use crate::domain::ports::TtlStore;

/// Outcome of a read-only lookup.
#[derive(Debug)]
pub enum Lookup<'a, V> {
    /// Entry present and unexpired
    Live(&'a V),
    /// Entry present but past its expiry; must be removed by a writer
    Expired,
    /// No entry for the key
    Missing,
}

/// TTL-bounded store for one entity category.
///
/// Expiration is discovered, not scheduled: there is no background sweep.
/// The [`TtlStore`] methods remove expired entries as they run into them;
/// [`peek`](Self::peek) and [`bulk_snapshot`](Self::bulk_snapshot) only
/// report them, so they can run under a shared lock.
#[derive(Debug)]
pub struct CategoryStore<V> {
    category: Category,
    ttl: Duration,
    entries: HashMap<EntityId, CacheEntry<V>>,
}

impl<V: Clone> CategoryStore<V> {
    /// Empty store whose entries live for `ttl`
    pub fn new(category: Category, ttl: Duration) -> Self {
        Self {
            category,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Category this store holds
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Lifetime given to every entry written here
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored entries, including expired ones nobody has touched yet
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only lookup of one key.
    pub fn peek(&self, id: &EntityId, now: Instant) -> Lookup<'_, V> {
        match self.entries.get(id) {
            Some(entry) if entry.is_live_at(now) => Lookup::Live(entry.value()),
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        }
    }

    /// Live bulk-eligible values, or `None` if an expired entry was seen and
    /// the caller needs to take the mutating path to reclaim it.
    pub fn bulk_snapshot(&self, now: Instant) -> Option<Vec<V>> {
        let mut values = Vec::new();
        for entry in self.entries.values() {
            if !entry.is_live_at(now) {
                return None;
            }
            if entry.is_bulk_eligible() {
                values.push(entry.value().clone());
            }
        }
        Some(values)
    }

    /// Write `value` at `now`.
    ///
    /// A single write (`bulk_eligible == false`) over a live listed entry
    /// replaces the value but keeps the entry in its listing, with the
    /// listing's expiry, so a concurrent single fetch cannot punch a hole in
    /// a cached listing.
    pub fn insert(&mut self, id: EntityId, value: V, bulk_eligible: bool, now: Instant) {
        let entry = match self.entries.get(&id) {
            Some(listed)
                if !bulk_eligible && listed.is_bulk_eligible() && listed.is_live_at(now) =>
            {
                listed.with_value(value)
            }
            _ => CacheEntry::new(value, self.ttl, bulk_eligible, now),
        };
        self.entries.insert(id, entry);
    }

    /// Whether any live listed entry has an id matching `pred`.
    pub fn lists_any(&self, now: Instant, mut pred: impl FnMut(&EntityId) -> bool) -> bool {
        self.entries
            .iter()
            .any(|(id, entry)| entry.is_bulk_eligible() && entry.is_live_at(now) && pred(id))
    }

    /// Take every entry out of the cached listing, keeping it for single
    /// lookups. Returns how many entries were unlisted.
    pub fn unlist_all(&mut self) -> usize {
        let mut unlisted = 0;
        for entry in self.entries.values_mut() {
            if entry.is_bulk_eligible() {
                entry.unlist();
                unlisted += 1;
            }
        }
        if unlisted > 0 {
            debug!(category = %self.category, unlisted, "cached listing invalidated");
        }
        unlisted
    }

    /// Remove `id` if it is expired at `now`. Returns true if it was removed.
    fn expire(&mut self, id: &EntityId, now: Instant) -> bool {
        let expired = self
            .entries
            .get(id)
            .is_some_and(|entry| !entry.is_live_at(now));
        if expired {
            self.entries.remove(id);
            debug!(category = %self.category, %id, "cache entry expired");
        }
        expired
    }

    fn purge_expired(&mut self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live_at(now));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(category = %self.category, purged, "expired cache entries reclaimed");
        }
    }
}

impl<V: Clone> TtlStore<V> for CategoryStore<V> {
    fn get(&mut self, id: &EntityId) -> Option<V> {
        if self.expire(id, Instant::now()) {
            return None;
        }
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    fn set(&mut self, id: EntityId, value: V, bulk_eligible: bool) {
        self.insert(id, value, bulk_eligible, Instant::now());
    }

    fn contains(&mut self, id: &EntityId) -> bool {
        !self.expire(id, Instant::now()) && self.entries.contains_key(id)
    }

    fn delete(&mut self, id: &EntityId) -> Option<V> {
        if self.expire(id, Instant::now()) {
            return None;
        }
        self.entries.remove(id).map(CacheEntry::into_value)
    }

    fn list_bulk_eligible(&mut self) -> Vec<V> {
        self.purge_expired(Instant::now());
        self.entries
            .values()
            .filter(|entry| entry.is_bulk_eligible())
            .map(|entry| entry.value().clone())
            .collect()
    }
}
