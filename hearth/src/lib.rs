//! Server-side HTTP sessions for axum and tower.
//!
//! ```no_run
//! use hearth::session::{middleware::SessionLayer, SessionManager};
//!
//! let manager = SessionManager::builder().build();
//! let layer = SessionLayer::from_manager(manager);
//! # let _ = layer;
//! ```

pub use hearth_cookie as cookie;

#[cfg(feature = "session")]
pub use hearth_session as session;
