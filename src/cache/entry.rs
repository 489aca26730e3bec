//! Cache Entry Module
//!
//! Defines a single cached record and the handle used to link records together.

use std::time::{Duration, Instant};

use bytes::Bytes;

// == Entry Handle ==
/// Stable handle to an entry slot in a [`Store`](super::Store).
///
/// The generation makes a handle stale once its slot has been freed, so a
/// handle can never alias an entry inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

// == Cache Entry ==
/// A single cache record with an absolute expiry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Opaque key, compared byte for byte
    pub key: Bytes,
    /// Opaque payload, returned verbatim
    pub value: Bytes,
    /// Insertion instant plus the requested TTL
    pub expires_at: Instant,
    pub(crate) prev: Option<EntryId>,
    pub(crate) next: Option<EntryId>,
}

impl Entry {
    // == Constructor ==
    /// Creates an unlinked entry expiring `ttl` after `now`.
    ///
    /// A TTL too large to represent is clamped to a point far in the future.
    pub fn new(key: Bytes, value: Bytes, ttl: Duration, now: Instant) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| far_future(now));

        Self {
            key,
            value,
            expires_at,
            prev: None,
            next: None,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches its expiry instant.
    ///
    /// A zero TTL therefore yields an entry that is expired as soon as it is stored.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

fn far_future(now: Instant) -> Instant {
    // Roughly 30 years; Instant has no MAX constant.
    const FAR: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);
    now.checked_add(FAR).unwrap_or(now)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Duration, now: Instant) -> Entry {
        Entry::new(Bytes::from_static(b"k"), Bytes::from_static(b"v"), ttl, now)
    }

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = entry(Duration::from_secs(60), now);

        assert_eq!(entry.key, Bytes::from_static(b"k"));
        assert_eq!(entry.value, Bytes::from_static(b"v"));
        assert_eq!(entry.expires_at, now + Duration::from_secs(60));
        assert!(entry.prev.is_none());
        assert!(entry.next.is_none());
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = entry(Duration::from_millis(10), now);

        assert!(!entry.is_expired(now + Duration::from_millis(9)));
        assert!(entry.is_expired(now + Duration::from_millis(10)));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let now = Instant::now();
        let entry = entry(Duration::ZERO, now);

        assert!(entry.is_expired(now));
        assert_eq!(entry.ttl_remaining(now), Duration::ZERO);
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = entry(Duration::from_secs(10), now);

        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(11)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let now = Instant::now();
        let entry = entry(Duration::MAX, now);

        assert!(entry.expires_at > now);
        assert!(!entry.is_expired(now));
    }
}
