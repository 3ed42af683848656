//! Server-side HTTP sessions: a cookie carries an opaque token, the session
//! values live in a [`Store`](store::Store).
//!
//! A [`SessionManager`] is configured once and shared. The
//! [`SessionLayer`](middleware::SessionLayer) loads the session before the
//! handler runs and saves it afterwards; handlers read and mutate it through
//! the manager.

mod builder;
mod codec;
mod config;
mod context;
mod data;
pub mod error;
pub mod ext;
mod manager;
pub mod middleware;
mod registry;
mod state;
pub mod store;
mod token;
mod value;

pub use builder::{NoStore, SessionManagerBuilder};
pub use codec::{Codec, CodecError, Decoded, FORMAT_VERSION};
pub use config::{SessionConfig, DEFAULT_LIFETIME};
pub use context::{ContextKey, HttpContext, SessionContext, SessionLookup, SessionScratch};
pub use data::SessionData;
pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use registry::{registry, SessionRegistry};
pub use state::Status;
pub use token::{generate_token, Token, TOKEN_BYTES};
pub use value::{CustomValue, SessionValue, Value};
