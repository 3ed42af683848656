use std::sync::Arc;

use tower_layer::Layer;

use crate::{
    error::{DefaultErrorHandler, IntoErrorResponse},
    SessionManager,
};

use super::{builder::SessionLayerBuilder, hooks::DefaultHooks, SessionHooks, SessionMiddleware, Skipper};

#[derive(Debug)]
pub struct SessionLayer<H = DefaultHooks, E = DefaultErrorHandler>
where
    H: SessionHooks,
    E: IntoErrorResponse,
{
    manager: SessionManager,
    hooks: Arc<H>,
    error_handler: E,
    skipper: Option<Skipper>,
}

impl<H, E> Clone for SessionLayer<H, E>
where
    H: SessionHooks,
    E: IntoErrorResponse + Clone,
{
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            hooks: Arc::clone(&self.hooks),
            error_handler: self.error_handler.clone(),
            skipper: self.skipper.clone(),
        }
    }
}

impl SessionLayer {
    pub fn builder() -> SessionLayerBuilder {
        SessionLayerBuilder::new()
    }

    /// A layer with the default hooks and error handler, not cached.
    pub fn from_manager(manager: SessionManager) -> Self {
        Self::new(manager, Arc::new(DefaultHooks), DefaultErrorHandler, None)
    }
}

impl<H, E> SessionLayer<H, E>
where
    H: SessionHooks,
    E: IntoErrorResponse,
{
    pub fn new(
        manager: SessionManager,
        hooks: Arc<H>,
        error_handler: E,
        skipper: Option<Skipper>,
    ) -> Self {
        Self {
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

impl<S, H, E> Layer<S> for SessionLayer<H, E>
where
    H: SessionHooks,
    E: IntoErrorResponse + Clone,
{
    type Service = SessionMiddleware<S, H, E>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware::new(
            inner,
            self.manager.clone(),
            Arc::clone(&self.hooks),
            self.error_handler.clone(),
            self.skipper.clone(),
        )
    }
}
