use tokio::time::{Duration, Instant};

/// Upper bound on a single entry's lifetime. Keeps `now + ttl` from
/// overflowing when a caller passes an absurd TTL.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// A cached value with its expiry instant.
///
/// An update replaces the whole entry. The only in-place change is dropping
/// the listing flag when the listing it belonged to goes stale.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    bulk_eligible: bool,
}

impl<V> CacheEntry<V> {
    /// Entry written at `now` that lives for `ttl`.
    pub fn new(value: V, ttl: Duration, bulk_eligible: bool, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + ttl.min(MAX_TTL),
            bulk_eligible,
        }
    }

    /// Entry holding `value` that keeps this entry's expiry and listing flag.
    pub fn with_value(&self, value: V) -> Self {
        Self {
            value,
            expires_at: self.expires_at,
            bulk_eligible: self.bulk_eligible,
        }
    }

    /// Stop serving this entry from listings.
    pub fn unlist(&mut self) {
        self.bulk_eligible = false;
    }

    /// Present iff `now` is strictly before the expiry instant.
    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Cached value
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Consume the entry, yielding the value
    pub fn into_value(self) -> V {
        self.value
    }

    /// Instant the entry stops being served
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the entry was written as part of a complete listing
    pub const fn is_bulk_eligible(&self) -> bool {
        self.bulk_eligible
    }
}
