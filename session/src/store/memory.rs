use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::{Mutex, RwLock};
use time::OffsetDateTime;
use tokio::{runtime::Handle, task::JoinHandle, time::MissedTickBehavior};

use super::{Store, StoreResult};

/// How often the sweeper removes expired sessions unless configured otherwise.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Item {
    payload: Vec<u8>,
    expiry: OffsetDateTime,
}

impl Item {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiry <= now
    }
}

#[derive(Debug, Default)]
struct Inner {
    items: RwLock<HashMap<String, Item>>,
    cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn delete_expired(&self, now: OffsetDateTime) -> usize {
        let any_expired = self.items.read().values().any(|item| item.is_expired(now));
        if !any_expired {
            return 0;
        }

        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, item| !item.is_expired(now));
        before - items.len()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup.get_mut().take() {
            handle.abort();
        }
    }
}

/// In-process session store with a background expiry sweeper.
///
/// Clones share the same underlying map. The sweeper runs on the ambient
/// tokio runtime; a store created outside of one relies on [`Store::find`]
/// ignoring expired entries and on explicit [`MemoryStore::delete_expired`]
/// calls.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a store sweeping expired entries every
    /// [`DEFAULT_CLEANUP_INTERVAL`].
    pub fn new() -> Self {
        Self::with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL)
    }

    /// Creates a store sweeping expired entries every `interval`. A zero
    /// interval disables the sweeper.
    pub fn with_cleanup_interval(interval: Duration) -> Self {
        let store = Self {
            inner: Arc::new(Inner::default()),
        };
        if !interval.is_zero() {
            store.start_cleanup(interval);
        }
        store
    }

    fn start_cleanup(&self, interval: Duration) {
        let Ok(runtime) = Handle::try_current() else {
            #[cfg(feature = "tracing")]
            tracing::warn!("No tokio runtime available, memory store sweeper not started");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(sweep(weak, interval));
        *self.inner.cleanup.lock() = Some(handle);
    }

    /// Stops the background sweeper. Expired entries are still hidden from
    /// [`Store::find`].
    pub fn stop_cleanup(&self) {
        if let Some(handle) = self.inner.cleanup.lock().take() {
            handle.abort();

            #[cfg(feature = "tracing")]
            tracing::debug!("Memory store sweeper stopped");
        }
    }

    /// Removes every entry whose expiry has passed, returning how many were
    /// removed.
    pub fn delete_expired(&self) -> usize {
        self.inner.delete_expired(OffsetDateTime::now_utc())
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn sweep(store: Weak<Inner>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(inner) = store.upgrade() else {
            break;
        };

        let _removed = inner.delete_expired(OffsetDateTime::now_utc());

        #[cfg(feature = "tracing")]
        if _removed > 0 {
            tracing::debug!(removed = _removed, "Swept expired sessions");
        }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn find(&self, token: &str) -> StoreResult<Option<Vec<u8>>> {
        let items = self.inner.items.read();
        let payload = items
            .get(token)
            .filter(|item| !item.is_expired(OffsetDateTime::now_utc()))
            .map(|item| item.payload.clone());
        Ok(payload)
    }

    async fn commit(
        &self,
        token: &str,
        payload: Vec<u8>,
        expiry: OffsetDateTime,
    ) -> StoreResult<()> {
        self.inner
            .items
            .write()
            .insert(token.to_owned(), Item { payload, expiry });
        Ok(())
    }

    async fn delete(&self, token: &str) -> StoreResult<()> {
        self.inner.items.write().remove(token);
        Ok(())
    }
}
