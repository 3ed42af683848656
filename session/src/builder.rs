use std::{sync::Arc, time::Duration};

use hearth_cookie::CookieConfig;

use crate::{
    codec::Codec, config::DEFAULT_LIFETIME, context::ContextKey, manager::Inner, store::Store,
    SessionConfig, SessionManager, SessionValue,
};

/// Builder state before a store has been chosen.
#[derive(Debug)]
pub struct NoStore;

#[derive(Debug)]
pub struct SessionManagerBuilder<S = NoStore> {
    store: S,
    idle_timeout: Duration,
    lifetime: Duration,
    cookie: CookieConfig,
    codec: Codec,
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerBuilder {
    pub fn new() -> Self {
        Self {
            store: NoStore,
            idle_timeout: Duration::ZERO,
            lifetime: DEFAULT_LIFETIME,
            cookie: CookieConfig::default(),
            codec: Codec::default(),
        }
    }

    pub fn with_store<S: Store>(self, store: S) -> SessionManagerBuilder<Arc<dyn Store>> {
        self.with_shared_store(Arc::new(store))
    }

    /// Uses a store shared with other managers.
    pub fn with_shared_store(self, store: Arc<dyn Store>) -> SessionManagerBuilder<Arc<dyn Store>> {
        SessionManagerBuilder {
            store,
            idle_timeout: self.idle_timeout,
            lifetime: self.lifetime,
            cookie: self.cookie,
            codec: self.codec,
        }
    }

    /// Builds a manager backed by a fresh [`MemoryStore`](crate::store::MemoryStore).
    #[cfg(feature = "memory")]
    pub fn build(self) -> SessionManager {
        self.with_store(crate::store::MemoryStore::new()).build()
    }
}

impl<S> SessionManagerBuilder<S> {
    /// Inactivity after which a session expires. Zero disables the timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Absolute lifetime of a session, fixed when the session is created.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    #[must_use]
    pub fn with_config(self, config: SessionConfig) -> Self {
        self.with_idle_timeout(config.idle_timeout())
            .with_lifetime(config.lifetime())
            .with_cookie(config.cookie)
    }

    /// Allows values of type `T` to be committed and loaded.
    #[must_use]
    pub fn register_type<T: SessionValue>(mut self) -> Self {
        self.codec.register::<T>();
        self
    }
}

impl SessionManagerBuilder<Arc<dyn Store>> {
    pub fn build(self) -> SessionManager {
        SessionManager {
            inner: Arc::new(Inner {
                idle_timeout: self.idle_timeout,
                lifetime: self.lifetime,
                cookie: self.cookie,
                store: self.store,
                codec: self.codec,
                context_key: ContextKey::generate(),
            }),
        }
    }
}
