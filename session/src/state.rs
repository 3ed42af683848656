/// Where a session stands within the current request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The session data hasn't been changed in the current request.
    #[default]
    Unmodified,
    /// The session data has been changed and must be committed.
    Modified,
    /// The session has been destroyed; the client cookie must be cleared.
    Destroyed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unmodified => "unmodified",
            Self::Modified => "modified",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Defines a transition mechanism for states.
pub(crate) trait Transition<T> {
    /// Transitions from the current state to a new state.
    fn transition(self, new_state: T) -> T;
}

impl Transition<Status> for Status {
    fn transition(self, new_state: Status) -> Status {
        match (self, new_state) {
            (_, Self::Destroyed) | (Self::Destroyed, _) => Self::Destroyed,
            (_, Self::Modified) => Self::Modified,
            (current, Self::Unmodified) => current,
        }
    }
}
