use std::{collections::HashMap, time::Duration};

use parking_lot::{Mutex, MutexGuard};
use time::OffsetDateTime;

use crate::{
    codec::Decoded,
    state::{Status, Transition},
    Token, Value,
};

/// Mutable fields of a [`SessionData`], only reachable through its lock.
#[derive(Debug)]
pub(crate) struct Record {
    pub(crate) token: Option<Token>,
    pub(crate) deadline: OffsetDateTime,
    pub(crate) values: HashMap<String, Value>,
    pub(crate) status: Status,
}

impl Record {
    fn fresh(lifetime: Duration) -> Self {
        Self {
            token: None,
            deadline: OffsetDateTime::now_utc() + lifetime,
            values: HashMap::new(),
            status: Status::Unmodified,
        }
    }

    pub(crate) fn mark(&mut self, status: Status) {
        self.status = self.status.transition(status);
    }

    /// Prepares the record for a mutation. A destroyed record is re-minted
    /// in place so the mutation starts a brand-new session.
    pub(crate) fn revive(&mut self, lifetime: Duration) {
        if self.status == Status::Destroyed {
            *self = Self::fresh(lifetime);
        }
    }

    pub(crate) fn destroy(&mut self, lifetime: Duration) {
        *self = Self::fresh(lifetime);
        self.status = Status::Destroyed;
    }
}

/// The session state of a single request.
///
/// Every read and write goes through an internal mutex. Store round trips
/// (commit, destroy, token renewal) are additionally serialized by an async
/// lock so they never overlap for the same record.
#[derive(Debug)]
pub struct SessionData {
    record: Mutex<Record>,
    io: tokio::sync::Mutex<()>,
}

impl SessionData {
    /// A new, not yet persisted session expiring `lifetime` from now.
    pub fn new(lifetime: Duration) -> Self {
        Self::from_record(Record::fresh(lifetime))
    }

    pub(crate) fn from_decoded(token: Token, decoded: Decoded, status: Status) -> Self {
        Self::from_record(Record {
            token: Some(token),
            deadline: decoded.deadline,
            values: decoded.values,
            status,
        })
    }

    fn from_record(record: Record) -> Self {
        Self {
            record: Mutex::new(record),
            io: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock()
    }

    pub(crate) async fn lock_io(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.io.lock().await
    }

    /// The persisted token, `None` until the first commit.
    pub fn token(&self) -> Option<Token> {
        self.lock().token.clone()
    }

    pub fn status(&self) -> Status {
        self.lock().status
    }

    /// Absolute time after which the session is no longer valid.
    pub fn deadline(&self) -> OffsetDateTime {
        self.lock().deadline
    }

    /// Forces the session to be committed when the request is saved.
    pub fn mark_modified(&self) {
        self.lock().mark(Status::Modified);
    }
}
