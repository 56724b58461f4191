//! Expiring cache for interaction results, keyed by a fingerprint of the
//! medicine set so "Aspirin, warfarin" and "WARFARIN,aspirin" share an entry.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Order- and case-insensitive fingerprint of a set of names.
///
/// Names are trimmed and lower-cased, blanks dropped, the rest sorted,
/// de-duplicated and joined with `|` before hashing.
pub fn fingerprint<S: AsRef<str>>(names: &[S]) -> String {
    let mut normalised: Vec<String> = names
        .iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    normalised.sort_unstable();
    normalised.dedup();

    let mut hasher = Sha256::new();
    hasher.update(normalised.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct InteractionCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> InteractionCache<V> {
    /// Entries live for 24 hours unless built with `with_ttl`.
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(24))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `key` if it has not expired as of `now`. An expired
    /// entry is evicted.
    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| now >= entry.expires_at) {
            entries.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: String, value: V, now: DateTime<Utc>) {
        let entry = Entry {
            value,
            expires_at: now + self.ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<V: Clone> Default for InteractionCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
