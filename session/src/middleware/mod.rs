use std::{fmt, sync::Arc};

use axum_core::extract::Request;

use crate::{error::IntoErrorResponse, SessionManager};

mod builder;
pub mod future;
mod hooks;
mod layer;
mod service;

pub use builder::{NoManager, SessionLayerBuilder};
pub use hooks::{load_from_cookie, save_to_cookie, DefaultHooks, RequireToken, SessionHooks};
pub use layer::SessionLayer;

/// Predicate deciding which requests bypass the session middleware.
#[derive(Clone)]
pub struct Skipper(Arc<dyn Fn(&Request) -> bool + Send + Sync>);

impl Skipper {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn skip(&self, request: &Request) -> bool {
        (self.0)(request)
    }
}

impl fmt::Debug for Skipper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Skipper").finish_non_exhaustive()
    }
}

/// Loads the session before the inner service runs and saves it afterwards.
#[derive(Debug)]
pub struct SessionMiddleware<S, H, E>
where
    H: SessionHooks,
    E: IntoErrorResponse,
{
    inner: S,
    manager: SessionManager,
    hooks: Arc<H>,
    error_handler: E,
    skipper: Option<Skipper>,
}

impl<S, H, E> Clone for SessionMiddleware<S, H, E>
where
    S: Clone,
    H: SessionHooks,
    E: IntoErrorResponse + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            manager: self.manager.clone(),
            hooks: Arc::clone(&self.hooks),
            error_handler: self.error_handler.clone(),
            skipper: self.skipper.clone(),
        }
    }
}

impl<S, H, E> SessionMiddleware<S, H, E>
where
    H: SessionHooks,
    E: IntoErrorResponse,
{
    pub fn new(
        inner: S,
        manager: SessionManager,
        hooks: Arc<H>,
        error_handler: E,
        skipper: Option<Skipper>,
    ) -> Self {
        Self {
            inner,
            manager,
            hooks,
            error_handler,
            skipper,
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }
}
