//! Per-run evidence cache.
//!
//! Each key is fetched at most once per run, even when several detectives
//! ask for it concurrently: callers racing on a key share one
//! `tokio::sync::OnceCell`, and only the first one drives the fetch.
//! Failures are cached as absent and never surface to detectives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use evidence_source::{EvidenceKey, EvidenceSource};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type Slot = Arc<OnceCell<Option<Arc<[u8]>>>>;

pub struct Evidence {
    source: Arc<dyn EvidenceSource>,
    max_read: usize,
    slots: Mutex<HashMap<String, Slot>>,
}

impl Evidence {
    pub fn new(source: Arc<dyn EvidenceSource>, max_read: usize) -> Self {
        Evidence {
            source,
            max_read,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_read(&self) -> usize {
        self.max_read
    }

    /// Content for `key`, or `None` when it could not be fetched.
    pub async fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let slot = self.slot(key);
        slot.get_or_init(|| self.fetch(key)).await.clone()
    }

    /// Content decoded as UTF-8 (lossily).
    pub async fn get_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Number of distinct keys requested so far.
    pub fn requested_keys(&self) -> usize {
        self.lock_slots().len()
    }

    fn slot(&self, key: &str) -> Slot {
        self.lock_slots().entry(key.to_string()).or_default().clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self, key: &str) -> Option<Arc<[u8]>> {
        match self.source.fetch(key, self.max_read).await {
            Ok(mut bytes) => {
                if bytes.len() > self.max_read {
                    let truncates = EvidenceKey::parse(key).is_ok_and(|k| k.truncates());
                    if !truncates {
                        warn!(key = %key, bytes = bytes.len(), cap = self.max_read, "Evidence over size cap");
                        return None;
                    }
                    bytes.truncate(self.max_read);
                }
                debug!(key = %key, bytes = bytes.len(), "Evidence fetched");
                Some(Arc::from(bytes))
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Evidence unavailable");
                None
            }
        }
    }
}

impl std::fmt::Debug for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evidence")
            .field("max_read", &self.max_read)
            .field("requested_keys", &self.requested_keys())
            .finish()
    }
}
