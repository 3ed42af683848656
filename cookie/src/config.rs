use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Value of the `SameSite` attribute written on the session cookie.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
    /// Do not emit a `SameSite` attribute at all.
    Omit,
}

impl SameSitePolicy {
    pub(crate) fn as_cookie(self) -> Option<cookie::SameSite> {
        match self {
            Self::Strict => Some(cookie::SameSite::Strict),
            Self::Lax => Some(cookie::SameSite::Lax),
            Self::None => Some(cookie::SameSite::None),
            Self::Omit => None,
        }
    }
}

/// Attributes of the cookie carrying the session token.
///
/// The name should not contain whitespace, commas, colons, semicolons,
/// backslashes, the equals sign or control characters (RFC 6265). When two
/// session managers share a server their cookie names must differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: Cow<'static, str>,
    /// Defaults to the host that issued the cookie when unset.
    pub domain: Option<Cow<'static, str>>,
    pub path: Cow<'static, str>,
    pub http_only: bool,
    pub secure: bool,
    /// Persistent cookies carry `Expires` and `Max-Age`; otherwise the
    /// browser drops the cookie when it is closed.
    pub persist: bool,
    pub same_site: SameSitePolicy,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("session"),
            domain: None,
            path: Cow::Borrowed("/"),
            http_only: true,
            secure: false,
            persist: true,
            same_site: SameSitePolicy::Lax,
        }
    }
}

impl CookieConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<Cow<'static, str>>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<Cow<'static, str>>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSitePolicy) -> Self {
        self.same_site = same_site;
        self
    }
}
