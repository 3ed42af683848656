use std::error::Error as StdError;

use axum_core::response::{IntoResponse, Response};
use http::StatusCode;

use crate::{codec::CodecError, store::StoreError};

pub type SessionResult<T> = Result<T, SessionError>;

/// Recoverable failures of the session lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store operation failed")]
    Store(#[from] StoreError),
    #[error("session payload could not be serialized")]
    Codec(#[from] CodecError),
    #[error("failed to generate a session token")]
    TokenGeneration(#[from] rand::Error),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}

/// Misconfiguration of the named-manager registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a session manager is already registered under `{key}`")]
    DuplicateKey { key: String },
    #[error("no session manager was supplied for `{key}`")]
    NilConfig { key: String },
}

#[derive(Debug, thiserror::Error)]
#[error("Session scratch is missing from the request extensions")]
pub struct SessionMissingFromExt;

impl IntoResponse for SessionMissingFromExt {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Turns a middleware failure into the response sent to the client.
pub trait IntoErrorResponse: Send + Sync + 'static {
    type Error: StdError + Send + Sync + 'static;
    fn into_error_response(self, error: Self::Error) -> Response;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl IntoErrorResponse for DefaultErrorHandler {
    type Error = SessionError;

    fn into_error_response(self, error: SessionError) -> Response {
        error.into_response()
    }
}

/// Renders an error followed by each of its sources, `: `-separated.
pub fn log_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
