use std::{convert::Infallible, sync::Arc};

use axum_core::{extract::Request, response::Response};
use tower_service::Service;

use crate::{
    context::HttpContext,
    error::{IntoErrorResponse, SessionError},
};

use super::{future::ResponseFuture, SessionHooks, SessionMiddleware};

impl<S, H, E> Service<Request> for SessionMiddleware<S, H, E>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
    H: SessionHooks,
    E: IntoErrorResponse<Error = SessionError> + Clone,
{
    type Response = Response;
    type Error = Infallible;
    type Future = ResponseFuture;

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(http.uri = %req.uri(), http.method = %req.method(), session.cookie = %self.manager.cookie_name())))]
    fn call(&mut self, mut req: Request) -> Self::Future {
        if let Some(skipper) = &self.skipper {
            if skipper.skip(&req) {
                #[cfg(feature = "tracing")]
                tracing::debug!("Skipping session middleware");

                let future = self.inner.call(req);
                return ResponseFuture {
                    inner: Box::pin(async move {
                        match future.await {
                            Ok(response) => response,
                            Err(err) => match err {},
                        }
                    }),
                };
            }
        }

        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        let manager = self.manager.clone();
        let hooks = Arc::clone(&self.hooks);
        let handler = self.error_handler.clone();
        let future = Box::pin(async move {
            let mut ctx = HttpContext::from_request(&req);
            req.extensions_mut().insert(ctx.scratch().clone());

            if let Err(err) = hooks.load_check(&manager, &mut ctx).await {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %crate::error::log_error_chain(&err), "Failed to load session");

                return handler.into_error_response(err);
            }

            let mut response = match ready_inner.call(req).await {
                Ok(response) => response,
                Err(err) => match err {},
            };

            ctx.replace_response_headers(std::mem::take(response.headers_mut()));
            if let Err(err) = hooks.save_check(&manager, &mut ctx).await {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %crate::error::log_error_chain(&err), "Failed to save session");

                return handler.into_error_response(err);
            }
            *response.headers_mut() = ctx.into_response_headers();

            #[cfg(feature = "tracing")]
            tracing::debug!("Session middleware finished");

            response
        });

        ResponseFuture { inner: future }
    }
}
