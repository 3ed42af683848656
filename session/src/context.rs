use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum_core::extract::FromRequestParts;
use cookie::Cookie;
use http::{request::Parts, HeaderMap, Request};
use parking_lot::Mutex;

use crate::{error::SessionMissingFromExt, SessionData};

/// Identifies one session manager's entry in the request scratch map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(Arc<str>);

impl ContextKey {
    pub(crate) fn generate() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("session.{id}").into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request map from [`ContextKey`] to the loaded [`SessionData`].
///
/// Clones share the same map, so the middleware, any stacked session
/// middlewares and the handler all observe the same entries.
#[derive(Debug, Clone, Default)]
pub struct SessionScratch {
    entries: Arc<Mutex<HashMap<ContextKey, Arc<SessionData>>>>,
}

impl SessionScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContextKey) -> Option<Arc<SessionData>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: ContextKey, data: Arc<SessionData>) {
        self.entries.lock().insert(key, data);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for SessionScratch
where
    S: Send + Sync + 'static,
{
    type Rejection = SessionMissingFromExt;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(SessionMissingFromExt)
    }
}

/// Read access to the request scratch map.
pub trait SessionLookup {
    fn session_data(&self, key: &ContextKey) -> Option<Arc<SessionData>>;
}

impl SessionLookup for SessionScratch {
    fn session_data(&self, key: &ContextKey) -> Option<Arc<SessionData>> {
        self.get(key)
    }
}

impl<B> SessionLookup for Request<B> {
    fn session_data(&self, key: &ContextKey) -> Option<Arc<SessionData>> {
        self.extensions()
            .get::<SessionScratch>()
            .and_then(|scratch| scratch.get(key))
    }
}

impl SessionLookup for Parts {
    fn session_data(&self, key: &ContextKey) -> Option<Arc<SessionData>> {
        self.extensions
            .get::<SessionScratch>()
            .and_then(|scratch| scratch.get(key))
    }
}

/// What the session lifecycle needs from the host framework's request.
pub trait SessionContext: SessionLookup + Send + Sync {
    fn insert_session_data(&mut self, key: ContextKey, data: Arc<SessionData>);

    /// The request cookie called `name`, if any.
    fn cookie(&self, name: &str) -> Option<Cookie<'static>>;

    /// Headers of the response being prepared.
    fn response_headers_mut(&mut self) -> &mut HeaderMap;
}

/// A [`SessionContext`] over plain `http` types.
///
/// The middleware builds one per request; it is equally usable on its own,
/// for example in tests or in hosts without tower.
#[derive(Debug, Default)]
pub struct HttpContext {
    request_headers: HeaderMap,
    scratch: SessionScratch,
    response_headers: HeaderMap,
}

impl HttpContext {
    pub fn new(request_headers: HeaderMap) -> Self {
        Self {
            request_headers,
            ..Self::default()
        }
    }

    /// Captures the request headers and reuses the request's scratch map
    /// when an outer session middleware already installed one.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let scratch = request
            .extensions()
            .get::<SessionScratch>()
            .cloned()
            .unwrap_or_default();

        Self {
            request_headers: request.headers().clone(),
            scratch,
            response_headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn with_scratch(mut self, scratch: SessionScratch) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn scratch(&self) -> &SessionScratch {
        &self.scratch
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Swaps in `headers` as the response headers, returning the previous ones.
    pub fn replace_response_headers(&mut self, headers: HeaderMap) -> HeaderMap {
        std::mem::replace(&mut self.response_headers, headers)
    }

    pub fn into_response_headers(self) -> HeaderMap {
        self.response_headers
    }
}

impl SessionLookup for HttpContext {
    fn session_data(&self, key: &ContextKey) -> Option<Arc<SessionData>> {
        self.scratch.get(key)
    }
}

impl SessionContext for HttpContext {
    fn insert_session_data(&mut self, key: ContextKey, data: Arc<SessionData>) {
        self.scratch.insert(key, data);
    }

    fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        hearth_cookie::find_cookie(&self.request_headers, name)
    }

    fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }
}
