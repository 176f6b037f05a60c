//! Revoked-credential registry.
//!
//! Logout must take effect immediately even though the token itself stays
//! cryptographically valid until `exp`. The registry keys on the exact raw
//! token string.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

/// Registry of explicitly invalidated tokens.
///
/// A completed `revoke` is visible to every later `is_revoked` call on any
/// thread. `is_revoked` never consults the clock: an entry only disappears
/// through `purge_expired`.
pub trait RevocationStore: Send + Sync {
    /// Revoke a token with no known expiry. Such entries are never purged.
    fn revoke(&self, token: &str);

    /// Revoke a token, remembering when it would have expired anyway so the
    /// entry can later be evicted.
    fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>);

    fn is_revoked(&self, token: &str) -> bool;

    /// Drop entries whose recorded natural expiry is at or before `now`.
    /// Returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> RevocationStore for Arc<S>
where
    S: RevocationStore + ?Sized,
{
    fn revoke(&self, token: &str) {
        (**self).revoke(token)
    }

    fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>) {
        (**self).revoke_until(token, expires_at)
    }

    fn is_revoked(&self, token: &str) -> bool {
        (**self).is_revoked(token)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        (**self).purge_expired(now)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Process-local revocation set.
///
/// Readers share the lock; writers (logouts, sweeps) are rare. A poisoned
/// lock is recovered rather than treated as "not revoked".
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    // token -> natural expiry (None = keep forever)
    inner: RwLock<HashMap<String, Option<DateTime<Utc>>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, token: &str, expires_at: Option<DateTime<Utc>>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(token.to_string())
            .and_modify(|existing| {
                // Idempotent: a second revoke never shortens retention.
                *existing = match (*existing, expires_at) {
                    (None, _) | (_, None) => None,
                    (Some(a), Some(b)) => Some(a.max(b)),
                };
            })
            .or_insert(expires_at);
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, token: &str) {
        self.insert(token, None);
    }

    fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>) {
        self.insert(token, Some(expires_at));
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_token, expires_at| match expires_at {
            Some(at) => *at > now,
            None => true,
        });
        before - map.len()
    }

    fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn revoke_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        assert!(!store.is_revoked("tok"));

        store.revoke("tok");
        store.revoke("tok");

        assert!(store.is_revoked("tok"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn matches_exact_token_only() {
        let store = InMemoryRevocationStore::new();
        store.revoke("abc.def.ghi");

        assert!(!store.is_revoked("abc.def.gh"));
        assert!(!store.is_revoked("abc.def.ghi "));
    }

    #[test]
    fn purge_drops_only_naturally_expired_entries() {
        let store = InMemoryRevocationStore::new();
        store.revoke_until("old", t0() - Duration::minutes(1));
        store.revoke_until("fresh", t0() + Duration::hours(3));
        store.revoke("pinned");

        assert_eq!(store.purge_expired(t0()), 1);
        assert!(!store.is_revoked("old"));
        assert!(store.is_revoked("fresh"));
        assert!(store.is_revoked("pinned"));
    }

    #[test]
    fn purge_keeps_entries_until_their_expiry_instant() {
        let store = InMemoryRevocationStore::new();
        store.revoke_until("tok", t0());

        assert_eq!(store.purge_expired(t0() - Duration::seconds(1)), 0);
        assert!(store.is_revoked("tok"));
        assert_eq!(store.purge_expired(t0()), 1);
    }

    #[test]
    fn re_revoking_never_shortens_retention() {
        let store = InMemoryRevocationStore::new();
        store.revoke_until("tok", t0() + Duration::hours(2));
        store.revoke_until("tok", t0() + Duration::hours(1));

        assert_eq!(store.purge_expired(t0() + Duration::minutes(90)), 0);
        assert!(store.is_revoked("tok"));

        store.revoke("tok");
        assert_eq!(store.purge_expired(t0() + Duration::days(30)), 0);
    }

    #[test]
    fn completed_revocations_are_visible_to_all_threads() {
        let store = Arc::new(InMemoryRevocationStore::new());

        let writers: Vec<_> = (0..8)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let token = format!("token-{w}-{i}");
                        store.revoke(&token);
                        // Read-your-write on the revoking thread.
                        assert!(store.is_revoked(&token));
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    (0..8).all(|w| (0..100).all(|i| store.is_revoked(&format!("token-{w}-{i}"))))
                })
            })
            .collect();
        for r in readers {
            assert!(r.join().unwrap());
        }
        assert_eq!(store.len(), 800);
    }
}
