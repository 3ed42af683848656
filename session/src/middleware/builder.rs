use std::sync::Arc;

use axum_core::extract::Request;

use crate::{
    error::{DefaultErrorHandler, IntoErrorResponse, RegistryError, SessionError},
    registry::{registry, SessionRegistry},
    SessionManager,
};

use super::{hooks::DefaultHooks, layer::SessionLayer, SessionHooks, Skipper};

/// Builder state before a manager has been chosen.
#[derive(Debug)]
pub struct NoManager;

#[derive(Debug)]
pub struct SessionLayerBuilder<H = DefaultHooks, E = DefaultErrorHandler, M = NoManager> {
    manager: M,
    hooks: H,
    error_handler: E,
    skipper: Option<Skipper>,
    cache: bool,
    registry: Option<SessionRegistry>,
}

impl Default for SessionLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLayerBuilder {
    pub fn new() -> Self {
        Self {
            manager: NoManager,
            hooks: DefaultHooks,
            error_handler: DefaultErrorHandler,
            skipper: None,
            cache: false,
            registry: None,
        }
    }
}

impl<H, E> SessionLayerBuilder<H, E, NoManager> {
    pub fn with_manager(self, manager: SessionManager) -> SessionLayerBuilder<H, E, SessionManager> {
        SessionLayerBuilder {
            manager,
            hooks: self.hooks,
            error_handler: self.error_handler,
            skipper: self.skipper,
            cache: self.cache,
            registry: self.registry,
        }
    }
}

impl<H, E, M> SessionLayerBuilder<H, E, M> {
    pub fn with_hooks<HState>(self, hooks: HState) -> SessionLayerBuilder<HState, E, M>
    where
        HState: SessionHooks,
    {
        SessionLayerBuilder {
            manager: self.manager,
            hooks,
            error_handler: self.error_handler,
            skipper: self.skipper,
            cache: self.cache,
            registry: self.registry,
        }
    }

    pub fn with_error_handler<EState>(self, handler: EState) -> SessionLayerBuilder<H, EState, M>
    where
        EState: IntoErrorResponse<Error = SessionError>,
    {
        SessionLayerBuilder {
            manager: self.manager,
            hooks: self.hooks,
            error_handler: handler,
            skipper: self.skipper,
            cache: self.cache,
            registry: self.registry,
        }
    }

    /// Lets requests matching `predicate` through without touching the session.
    #[must_use]
    pub fn with_skipper<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.skipper = Some(Skipper::new(predicate));
        self
    }

    /// Registers the manager under its cookie name in the process-wide
    /// [`registry`] when the layer is built.
    #[must_use]
    pub fn cache(mut self) -> Self {
        self.cache = true;
        self
    }

    /// Like [`cache`](Self::cache), but registers into `registry` instead.
    #[must_use]
    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.cache = true;
        self.registry = Some(registry);
        self
    }
}

impl<H, E> SessionLayerBuilder<H, E, SessionManager>
where
    H: SessionHooks,
    E: IntoErrorResponse<Error = SessionError>,
{
    pub fn build(self) -> Result<SessionLayer<H, E>, RegistryError> {
        if self.cache {
            let registry = self.registry.unwrap_or_else(|| registry().clone());
            registry.register_strict(
                self.manager.cookie_name().to_owned(),
                Some(self.manager.clone()),
            )?;
        }

        Ok(SessionLayer::new(
            self.manager,
            Arc::new(self.hooks),
            self.error_handler,
            self.skipper,
        ))
    }
}
