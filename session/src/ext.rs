use axum_core::extract::Request;
use http::request::Parts;

use crate::{error::SessionMissingFromExt, SessionScratch};

/// Access to the session scratch map carried in request extensions.
pub trait RequestSessionExt {
    fn try_session_scratch(&self) -> Result<SessionScratch, SessionMissingFromExt>;

    fn session_scratch(&self) -> Option<SessionScratch> {
        self.try_session_scratch().ok()
    }
}

impl RequestSessionExt for Request {
    fn try_session_scratch(&self) -> Result<SessionScratch, SessionMissingFromExt> {
        self.extensions()
            .get::<SessionScratch>()
            .cloned()
            .ok_or(SessionMissingFromExt)
    }
}

impl RequestSessionExt for Parts {
    fn try_session_scratch(&self) -> Result<SessionScratch, SessionMissingFromExt> {
        self.extensions
            .get::<SessionScratch>()
            .cloned()
            .ok_or(SessionMissingFromExt)
    }
}
