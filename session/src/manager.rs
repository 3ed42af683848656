use std::{fmt, sync::Arc, time::Duration};

use hearth_cookie::CookieConfig;
use time::OffsetDateTime;

use crate::{
    builder::SessionManagerBuilder,
    codec::Codec,
    context::{ContextKey, SessionContext, SessionLookup},
    data::{Record, SessionData},
    error::SessionResult,
    state::Status,
    store::Store,
    token::generate_token,
    SessionValue, Token, Value,
};

pub(crate) struct Inner {
    pub(crate) idle_timeout: Duration,
    pub(crate) lifetime: Duration,
    pub(crate) cookie: CookieConfig,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) codec: Codec,
    pub(crate) context_key: ContextKey,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("context_key", &self.context_key)
            .field("idle_timeout", &self.idle_timeout)
            .field("lifetime", &self.lifetime)
            .field("cookie", &self.cookie.name)
            .field("store", &self.store)
            .finish()
    }
}

/// Loads, mutates and persists the sessions of one cookie.
///
/// A manager is cheap to clone. Each manager owns a distinct [`ContextKey`],
/// so several managers can track independent sessions on the same request.
///
/// Every operation other than [`load`](Self::load) expects the session to
/// have been loaded into the context first and panics otherwise.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<Inner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(feature = "memory")]
impl Default for SessionManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionManager {
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout
    }

    pub fn lifetime(&self) -> Duration {
        self.inner.lifetime
    }

    pub fn cookie_config(&self) -> &CookieConfig {
        &self.inner.cookie
    }

    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie.name
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn codec(&self) -> &Codec {
        &self.inner.codec
    }

    /// The key this manager's session is stored under in the request scratch.
    pub fn context_key(&self) -> &ContextKey {
        &self.inner.context_key
    }

    fn session_data<C>(&self, ctx: &C) -> Arc<SessionData>
    where
        C: SessionLookup + ?Sized,
    {
        match ctx.session_data(&self.inner.context_key) {
            Some(data) => data,
            None => panic!(
                "no session data under `{}` in the request context; load the session first",
                self.inner.context_key
            ),
        }
    }

    fn read<C, R>(&self, ctx: &C, f: impl FnOnce(&Record) -> R) -> R
    where
        C: SessionLookup + ?Sized,
    {
        let data = self.session_data(ctx);
        let record = data.lock();
        f(&record)
    }

    fn write<C, R>(&self, ctx: &C, f: impl FnOnce(&mut Record) -> R) -> R
    where
        C: SessionLookup + ?Sized,
    {
        let data = self.session_data(ctx);
        let mut record = data.lock();
        record.revive(self.inner.lifetime);
        f(&mut record)
    }

    /// Loads the session for `token` into the context and returns it.
    ///
    /// Loading is idempotent: a session already present for this manager is
    /// returned untouched. An empty or unknown token yields a fresh session.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(session = %self.inner.context_key)))]
    pub async fn load<C>(&self, ctx: &mut C, token: &str) -> SessionResult<Arc<SessionData>>
    where
        C: SessionContext + ?Sized,
    {
        if let Some(data) = ctx.session_data(&self.inner.context_key) {
            return Ok(data);
        }

        let data = if token.is_empty() {
            SessionData::new(self.inner.lifetime)
        } else {
            match self.inner.store.find(token).await? {
                Some(payload) => {
                    let decoded = self.inner.codec.decode(&payload)?;
                    // A sliding idle timeout must be pushed back on every request.
                    let status = if self.inner.idle_timeout.is_zero() {
                        Status::Unmodified
                    } else {
                        Status::Modified
                    };
                    SessionData::from_decoded(Token::from(token), decoded, status)
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Session not found in store, starting a new one");

                    SessionData::new(self.inner.lifetime)
                }
            }
        };

        let data = Arc::new(data);
        ctx.insert_session_data(self.inner.context_key.clone(), Arc::clone(&data));
        Ok(data)
    }

    /// Persists the session, minting a token first if it has none.
    ///
    /// Returns the token and the expiry the record was stored with.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(session = %self.inner.context_key)))]
    pub async fn commit<C>(&self, ctx: &C) -> SessionResult<(Token, OffsetDateTime)>
    where
        C: SessionLookup + Sync + ?Sized,
    {
        let data = self.session_data(ctx);
        let _io = data.lock_io().await;

        let (token, payload, expiry) = {
            let mut record = data.lock();
            let token = match record.token.clone() {
                Some(token) => token,
                None => {
                    let token = generate_token()?;
                    record.token = Some(token.clone());
                    token
                }
            };
            let payload = self.inner.codec.encode(record.deadline, &record.values)?;
            (token, payload, self.expiry(record.deadline))
        };

        self.inner.store.commit(&token, payload, expiry).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%token, %expiry, "Session committed");

        Ok((token, expiry))
    }

    /// Deletes the session from the store and resets it to an empty,
    /// destroyed record.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(session = %self.inner.context_key)))]
    pub async fn destroy<C>(&self, ctx: &C) -> SessionResult<()>
    where
        C: SessionLookup + Sync + ?Sized,
    {
        let data = self.session_data(ctx);
        let _io = data.lock_io().await;

        if let Some(token) = data.token() {
            self.inner.store.delete(&token).await?;
        }
        data.lock().destroy(self.inner.lifetime);

        Ok(())
    }

    /// Replaces the token while keeping the session values. The previous
    /// token is deleted from the store and the lifetime starts over.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(session = %self.inner.context_key)))]
    pub async fn renew_token<C>(&self, ctx: &C) -> SessionResult<()>
    where
        C: SessionLookup + Sync + ?Sized,
    {
        let data = self.session_data(ctx);
        let _io = data.lock_io().await;

        if let Some(token) = data.token() {
            self.inner.store.delete(&token).await?;
        }

        let token = generate_token()?;
        {
            let mut record = data.lock();
            record.revive(self.inner.lifetime);
            record.token = Some(token);
            record.deadline = OffsetDateTime::now_utc() + self.inner.lifetime;
            record.mark(Status::Modified);
        }

        Ok(())
    }

    fn expiry(&self, deadline: OffsetDateTime) -> OffsetDateTime {
        if self.inner.idle_timeout.is_zero() {
            return deadline;
        }
        deadline.min(OffsetDateTime::now_utc() + self.inner.idle_timeout)
    }

    /// Builds the session cookie and writes it to the response headers.
    /// `None` writes a cookie that removes the session from the client.
    pub fn write_session_cookie<C>(
        &self,
        ctx: &mut C,
        token: &str,
        expiry: Option<OffsetDateTime>,
    ) where
        C: SessionContext + ?Sized,
    {
        let cookie = self
            .inner
            .cookie
            .build_cookie(token, expiry, OffsetDateTime::now_utc());
        hearth_cookie::write_session_cookie(ctx.response_headers_mut(), &cookie);
    }

    pub fn status<C>(&self, ctx: &C) -> Status
    where
        C: SessionLookup + ?Sized,
    {
        self.read(ctx, |record| record.status)
    }

    pub fn token<C>(&self, ctx: &C) -> Option<Token>
    where
        C: SessionLookup + ?Sized,
    {
        self.read(ctx, |record| record.token.clone())
    }

    pub fn put<C, K, V>(&self, ctx: &C, key: K, value: V)
    where
        C: SessionLookup + ?Sized,
        K: Into<String>,
        V: Into<Value>,
    {
        self.write(ctx, |record| {
            record.values.insert(key.into(), value.into());
            record.mark(Status::Modified);
        });
    }

    /// Stores a registered custom type under `key`.
    pub fn put_custom<C, K, T>(&self, ctx: &C, key: K, value: &T) -> SessionResult<()>
    where
        C: SessionLookup + ?Sized,
        K: Into<String>,
        T: SessionValue,
    {
        let value = Value::custom(value)?;
        self.put(ctx, key, value);
        Ok(())
    }

    pub fn get<C>(&self, ctx: &C, key: &str) -> Option<Value>
    where
        C: SessionLookup + ?Sized,
    {
        self.read(ctx, |record| record.values.get(key).cloned())
    }

    /// Removes and returns the value under `key`. The session is marked
    /// modified whether or not the key was present.
    pub fn pop<C>(&self, ctx: &C, key: &str) -> Option<Value>
    where
        C: SessionLookup + ?Sized,
    {
        self.write(ctx, |record| {
            let value = record.values.remove(key);
            record.mark(Status::Modified);
            value
        })
    }

    /// Deletes `key`, marking the session modified only if it existed.
    pub fn remove<C>(&self, ctx: &C, key: &str)
    where
        C: SessionLookup + ?Sized,
    {
        let data = self.session_data(ctx);
        let mut record = data.lock();
        if record.values.remove(key).is_some() {
            record.mark(Status::Modified);
        }
    }

    pub fn exists<C>(&self, ctx: &C, key: &str) -> bool
    where
        C: SessionLookup + ?Sized,
    {
        self.read(ctx, |record| record.values.contains_key(key))
    }

    /// All keys of the session, sorted.
    pub fn keys<C>(&self, ctx: &C) -> Vec<String>
    where
        C: SessionLookup + ?Sized,
    {
        let mut keys = self.read(ctx, |record| {
            record.values.keys().cloned().collect::<Vec<_>>()
        });
        keys.sort_unstable();
        keys
    }

    /// The string under `key`, or an empty string when absent or of another type.
    pub fn get_string<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> String {
        self.read(ctx, |record| {
            record
                .values
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_default()
        })
    }

    pub fn get_int<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> i64 {
        self.read(ctx, |record| {
            record.values.get(key).and_then(Value::as_int).unwrap_or_default()
        })
    }

    pub fn get_float<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> f64 {
        self.read(ctx, |record| {
            record.values.get(key).and_then(Value::as_float).unwrap_or_default()
        })
    }

    pub fn get_bool<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> bool {
        self.read(ctx, |record| {
            record.values.get(key).and_then(Value::as_bool).unwrap_or_default()
        })
    }

    pub fn get_bytes<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> Vec<u8> {
        self.read(ctx, |record| {
            record
                .values
                .get(key)
                .and_then(Value::as_bytes)
                .map(<[u8]>::to_vec)
                .unwrap_or_default()
        })
    }

    /// The timestamp under `key`, or the Unix epoch when absent.
    pub fn get_timestamp<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> OffsetDateTime {
        self.read(ctx, |record| {
            record
                .values
                .get(key)
                .and_then(Value::as_timestamp)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        })
    }

    pub fn get_custom<C, T>(&self, ctx: &C, key: &str) -> Option<T>
    where
        C: SessionLookup + ?Sized,
        T: SessionValue,
    {
        self.read(ctx, |record| {
            record
                .values
                .get(key)
                .and_then(Value::as_custom)
                .and_then(|custom| custom.decode::<T>())
        })
    }

    pub fn pop_string<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> String {
        match self.pop(ctx, key) {
            Some(Value::String(value)) => value,
            _ => String::new(),
        }
    }

    pub fn pop_int<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> i64 {
        self.pop(ctx, key)
            .and_then(|value| value.as_int())
            .unwrap_or_default()
    }

    pub fn pop_float<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> f64 {
        self.pop(ctx, key)
            .and_then(|value| value.as_float())
            .unwrap_or_default()
    }

    pub fn pop_bool<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> bool {
        self.pop(ctx, key)
            .and_then(|value| value.as_bool())
            .unwrap_or_default()
    }

    pub fn pop_bytes<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> Vec<u8> {
        match self.pop(ctx, key) {
            Some(Value::Bytes(value)) => value,
            _ => Vec::new(),
        }
    }

    pub fn pop_timestamp<C: SessionLookup + ?Sized>(&self, ctx: &C, key: &str) -> OffsetDateTime {
        self.pop(ctx, key)
            .and_then(|value| value.as_timestamp())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    pub fn pop_custom<C, T>(&self, ctx: &C, key: &str) -> Option<T>
    where
        C: SessionLookup + ?Sized,
        T: SessionValue,
    {
        self.pop(ctx, key)
            .and_then(|value| value.as_custom().and_then(|custom| custom.decode::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use http::{header, HeaderMap, HeaderValue};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::{
        context::HttpContext,
        store::{MemoryStore, StoreError, StoreResult},
        SessionError,
    };

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
    }

    impl SessionValue for Profile {
        const TYPE_NAME: &'static str = "test.Profile";
    }

    fn manager(store: &MemoryStore) -> SessionManager {
        SessionManager::builder()
            .with_store(store.clone())
            .register_type::<Profile>()
            .build()
    }

    async fn loaded(manager: &SessionManager, token: &str) -> HttpContext {
        let mut ctx = HttpContext::default();
        manager.load(&mut ctx, token).await.unwrap();
        ctx
    }

    #[derive(Debug, Default)]
    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Store for FailingStore {
        async fn find(&self, _token: &str) -> StoreResult<Option<Vec<u8>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unexpected(anyhow::anyhow!("connection refused")))
        }

        async fn commit(&self, _: &str, _: Vec<u8>, _: OffsetDateTime) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unexpected(anyhow::anyhow!("connection refused")))
        }

        async fn delete(&self, _token: &str) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unexpected(anyhow::anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_load_empty_token_starts_fresh_session() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;

        assert_eq!(manager.status(&ctx), Status::Unmodified);
        assert!(manager.token(&ctx).is_none());
        assert!(manager.keys(&ctx).is_empty());
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let mut ctx = loaded(&manager, "").await;
        manager.put(&ctx, "a", 1);

        let again = manager.load(&mut ctx, "other").await.unwrap();
        assert_eq!(again.status(), Status::Modified);
        assert_eq!(manager.get_int(&ctx, "a"), 1);
    }

    #[tokio::test]
    async fn test_commit_then_load_round_trip() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);

        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "name", "alice");
        manager.put(&ctx, "visits", 3);
        manager
            .put_custom(&ctx, "profile", &Profile { id: 7, name: "alice".into() })
            .unwrap();
        let (token, expiry) = manager.commit(&ctx).await.unwrap();

        assert_eq!(token.len(), 43);
        assert_eq!(expiry, manager.read(&ctx, |record| record.deadline));

        let next = loaded(&manager, &token).await;
        assert_eq!(manager.status(&next), Status::Unmodified);
        assert_eq!(manager.token(&next), Some(token));
        assert_eq!(manager.get_string(&next, "name"), "alice");
        assert_eq!(manager.get_int(&next, "visits"), 3);
        assert_eq!(
            manager.get_custom::<_, Profile>(&next, "profile"),
            Some(Profile { id: 7, name: "alice".into() })
        );
        assert_eq!(manager.keys(&next), vec!["name", "profile", "visits"]);
    }

    #[tokio::test]
    async fn test_commit_twice_reuses_minted_token() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "user", 1);

        let (first, _) = manager.commit(&ctx).await.unwrap();
        manager.put(&ctx, "user", 2);
        let (second, _) = manager.commit(&ctx).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        let next = loaded(&manager, &first).await;
        assert_eq!(manager.get_int(&next, "user"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_are_serialized() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;
        let scratch = ctx.scratch().clone();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let manager = manager.clone();
                let scratch = scratch.clone();
                tokio::spawn(async move {
                    manager.put(&scratch, format!("key-{i:02}"), i);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(manager.keys(&scratch).len(), 32);
        assert_eq!(manager.get_int(&scratch, "key-07"), 7);
        assert_eq!(manager.status(&scratch), Status::Modified);
    }

    #[tokio::test]
    async fn test_unknown_token_starts_fresh_session() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "does-not-exist").await;

        assert!(manager.token(&ctx).is_none());
        assert_eq!(manager.status(&ctx), Status::Unmodified);
    }

    #[tokio::test]
    async fn test_idle_timeout_marks_loaded_session_modified() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = SessionManager::builder()
            .with_store(store.clone())
            .with_idle_timeout(Duration::from_secs(60))
            .build();

        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "k", true);
        let (token, expiry) = manager.commit(&ctx).await.unwrap();

        let deadline = manager.read(&ctx, |record| record.deadline);
        assert!(expiry < deadline);
        assert!(expiry <= OffsetDateTime::now_utc() + Duration::from_secs(60));

        let next = loaded(&manager, &token).await;
        assert_eq!(manager.status(&next), Status::Modified);
    }

    #[tokio::test]
    async fn test_destroy_deletes_from_store() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);

        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "user", 42);
        let (token, _) = manager.commit(&ctx).await.unwrap();
        assert_eq!(store.len(), 1);

        manager.destroy(&ctx).await.unwrap();
        assert_eq!(manager.status(&ctx), Status::Destroyed);
        assert!(manager.token(&ctx).is_none());
        assert!(manager.keys(&ctx).is_empty());
        assert!(store.find(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_after_destroy_starts_new_session() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);

        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "user", 42);
        manager.commit(&ctx).await.unwrap();
        manager.destroy(&ctx).await.unwrap();

        manager.put(&ctx, "guest", true);
        assert_eq!(manager.status(&ctx), Status::Modified);
        assert_eq!(manager.keys(&ctx), vec!["guest"]);
        assert!(manager.token(&ctx).is_none());
    }

    #[tokio::test]
    async fn test_remove_after_destroy_keeps_destroyed() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;

        manager.destroy(&ctx).await.unwrap();
        manager.remove(&ctx, "missing");
        assert_eq!(manager.status(&ctx), Status::Destroyed);
    }

    #[tokio::test]
    async fn test_renew_token_keeps_values() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);

        let ctx = loaded(&manager, "").await;
        manager.put(&ctx, "user", 42);
        let (old, _) = manager.commit(&ctx).await.unwrap();

        let next = loaded(&manager, &old).await;
        manager.renew_token(&next).await.unwrap();
        let renewed = manager.token(&next).unwrap();

        assert_ne!(renewed, old);
        assert_eq!(manager.status(&next), Status::Modified);
        assert_eq!(manager.get_int(&next, "user"), 42);
        assert!(store.find(&old).await.unwrap().is_none());

        let (token, _) = manager.commit(&next).await.unwrap();
        assert_eq!(token, renewed);
        assert!(store.find(&renewed).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_marks_modified_only_when_present() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;

        manager.remove(&ctx, "missing");
        assert_eq!(manager.status(&ctx), Status::Unmodified);

        manager.put(&ctx, "present", "x");
        let (token, _) = manager.commit(&ctx).await.unwrap();

        let next = loaded(&manager, &token).await;
        manager.remove(&next, "present");
        assert_eq!(manager.status(&next), Status::Modified);
        assert!(!manager.exists(&next, "present"));
    }

    #[tokio::test]
    async fn test_pop_marks_modified_even_when_missing() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;

        assert!(manager.pop(&ctx, "missing").is_none());
        assert_eq!(manager.status(&ctx), Status::Modified);
    }

    #[tokio::test]
    async fn test_typed_accessors_fall_back_to_zero_values() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let ctx = loaded(&manager, "").await;

        manager.put(&ctx, "flash", "saved");
        manager.put(&ctx, "count", 5_i64);
        manager.put(&ctx, "ratio", 0.5);
        manager.put(&ctx, "raw", vec![1_u8, 2, 3]);

        assert_eq!(manager.get_int(&ctx, "flash"), 0);
        assert_eq!(manager.get_string(&ctx, "count"), "");
        assert!(!manager.get_bool(&ctx, "missing"));
        assert_eq!(manager.get_float(&ctx, "ratio"), 0.5);
        assert_eq!(manager.get_bytes(&ctx, "raw"), vec![1, 2, 3]);
        assert_eq!(
            manager.get_timestamp(&ctx, "missing"),
            OffsetDateTime::UNIX_EPOCH
        );

        assert_eq!(manager.pop_string(&ctx, "flash"), "saved");
        assert_eq!(manager.pop_string(&ctx, "flash"), "");
        assert_eq!(manager.pop_int(&ctx, "count"), 5);
        assert_eq!(manager.pop_bytes(&ctx, "raw"), vec![1, 2, 3]);
        assert_eq!(manager.keys(&ctx), vec!["ratio"]);
    }

    #[tokio::test]
    async fn test_unregistered_custom_type_fails_commit() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = SessionManager::builder()
            .with_store(store.clone())
            .build();
        let ctx = loaded(&manager, "").await;

        manager
            .put_custom(&ctx, "profile", &Profile { id: 1, name: "bob".into() })
            .unwrap();
        let result = manager.commit(&ctx).await;

        assert!(matches!(result, Err(SessionError::Codec(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let manager = SessionManager::builder()
            .with_store(FailingStore::default())
            .build();

        let mut ctx = HttpContext::default();
        let result = manager.load(&mut ctx, "token").await;
        assert!(matches!(result, Err(SessionError::Store(_))));

        manager.load(&mut ctx, "").await.unwrap();
        manager.put(&ctx, "k", 1);
        assert!(matches!(
            manager.commit(&ctx).await,
            Err(SessionError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_managers_are_isolated() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let first = manager(&store);
        let second = manager(&store);

        let mut ctx = HttpContext::default();
        first.load(&mut ctx, "").await.unwrap();
        second.load(&mut ctx, "").await.unwrap();

        first.put(&ctx, "who", "first");
        assert_eq!(first.get_string(&ctx, "who"), "first");
        assert!(!second.exists(&ctx, "who"));
        assert_eq!(second.status(&ctx), Status::Unmodified);
    }

    #[tokio::test]
    async fn test_write_session_cookie() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = manager(&store);
        let mut ctx = loaded(&manager, "").await;

        manager.write_session_cookie(&mut ctx, "abc", None);

        let headers: &HeaderMap = ctx.response_headers();
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session=abc"));
        assert!(cookie.contains("Max-Age=-1"));
        assert_eq!(
            headers.get(header::VARY),
            Some(&HeaderValue::from_static("Cookie"))
        );
    }

    #[test]
    #[should_panic(expected = "load the session first")]
    fn test_missing_session_panics() {
        let manager = SessionManager::builder()
            .with_store(MemoryStore::with_cleanup_interval(Duration::ZERO))
            .build();
        let ctx = HttpContext::default();
        manager.put(&ctx, "k", 1);
    }
}
