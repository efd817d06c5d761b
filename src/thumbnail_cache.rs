//! In-memory thumbnail byte cache
//!
//! Keyed by the bookmark's source URL and shared across concurrent resolver
//! calls. Each key owns an async slot lock, so the read-check / fetch / write
//! sequence is atomic per key: concurrent callers on the same key perform at
//! most one transport fetch. Entries live for the process lifetime unless
//! [`ThumbnailCache::clear`] is called.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::transport::HttpTransport;

type Slot = Arc<AsyncMutex<Option<Vec<u8>>>>;

#[derive(Default)]
pub struct ThumbnailCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock();
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Fetch `url` through `transport`, deduplicated by `key`.
    ///
    /// A cache hit returns the stored bytes without touching the network.
    /// On a miss the bytes are stored under `key` before returning; a failed
    /// fetch leaves the entry unpopulated so a later call can retry.
    pub async fn fetch(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        key: &str,
    ) -> Option<Vec<u8>> {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(bytes) = entry.as_ref() {
            return Some(bytes.clone());
        }

        match transport.get(url).await {
            Ok(bytes) => {
                *entry = Some(bytes.clone());
                Some(bytes)
            }
            Err(err) => {
                debug!(url, error = %err, "image fetch failed");
                None
            }
        }
    }

    /// Remove all entries. In-flight fetches keep their detached slot and
    /// finish undisturbed; their result is simply no longer retained.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}
