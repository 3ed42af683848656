use cookie::Cookie;
use time::{Duration, OffsetDateTime};

use crate::CookieConfig;

impl CookieConfig {
    /// Builds the session cookie carrying `value`.
    ///
    /// An `expiry` of `None` produces a clearing cookie (`Expires` at Unix
    /// time 1 and `Max-Age=-1`). Otherwise persistent cookies get `Expires`
    /// one second past `expiry` and `Max-Age` rounded up to the next whole
    /// second, and non-persistent cookies get neither.
    pub fn build_cookie(
        &self,
        value: impl Into<String>,
        expiry: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.to_string(), value.into());
        cookie.set_path(self.path.to_string());
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.to_string());
        }
        cookie.set_secure(self.secure);
        cookie.set_http_only(self.http_only);
        cookie.set_same_site(self.same_site.as_cookie());

        match expiry {
            None => {
                cookie.set_expires(OffsetDateTime::UNIX_EPOCH + Duration::SECOND);
                cookie.set_max_age(Duration::seconds(-1));
            }
            Some(expiry) if self.persist => {
                cookie.set_expires(expiry + Duration::SECOND);
                cookie.set_max_age(Duration::seconds(max_age_seconds(expiry, now)));
            }
            Some(_) => {}
        }

        cookie
    }
}

/// Seconds from `now` until `expiry`, rounded up.
fn max_age_seconds(expiry: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let remaining = expiry - now;
    let seconds = remaining.whole_seconds();
    if remaining.subsec_nanoseconds() > 0 {
        seconds + 1
    } else {
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SameSitePolicy;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn test_clearing_cookie() {
        let cookie = CookieConfig::default().build_cookie("", None, now());
        let rendered = cookie.encoded().to_string();

        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH + Duration::SECOND)
        );
        assert!(rendered.contains("Max-Age=-1"), "{rendered}");
    }

    #[test]
    fn test_persistent_cookie_rounds_up() {
        let expiry = now() + Duration::milliseconds(90_500);
        let cookie = CookieConfig::default().build_cookie("token", Some(expiry), now());

        assert_eq!(cookie.max_age(), Some(Duration::seconds(91)));
        assert_eq!(
            cookie.expires_datetime(),
            Some(expiry + Duration::SECOND)
        );
    }

    #[test]
    fn test_exact_second_is_not_rounded() {
        let expiry = now() + Duration::minutes(10);
        let cookie = CookieConfig::default().build_cookie("token", Some(expiry), now());
        assert_eq!(cookie.max_age(), Some(Duration::seconds(600)));
    }

    #[test]
    fn test_session_only_cookie() {
        let config = CookieConfig::default().with_persist(false);
        let cookie = config.build_cookie("token", Some(now() + Duration::HOUR), now());

        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn test_attributes() {
        let config = CookieConfig::default()
            .with_name("sid")
            .with_domain("example.com")
            .with_path("/app")
            .with_secure(true)
            .with_http_only(false)
            .with_same_site(SameSitePolicy::Strict);
        let cookie = config.build_cookie("token", None, now());

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Strict));
    }
}
