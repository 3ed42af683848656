use std::time::Duration;

use hearth_cookie::CookieConfig;
use serde::{Deserialize, Serialize};

/// Lifetime used when none is configured.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Deserializable session manager settings.
///
/// ```json
/// { "idle_timeout_minutes": 20, "lifetime_minutes": 480, "cookie": { "name": "sid" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity after which a session expires; `0` disables the timeout.
    pub idle_timeout_minutes: u64,
    /// Absolute session lifetime; `0` selects the 24 hour default.
    pub lifetime_minutes: u64,
    pub cookie: CookieConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 0,
            lifetime_minutes: DEFAULT_LIFETIME.as_secs() / 60,
            cookie: CookieConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        minutes(self.idle_timeout_minutes)
    }

    pub fn lifetime(&self) -> Duration {
        match self.lifetime_minutes {
            0 => DEFAULT_LIFETIME,
            value => minutes(value),
        }
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}
