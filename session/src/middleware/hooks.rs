use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    context::SessionContext,
    data::SessionData,
    error::SessionResult,
    state::Status,
    SessionManager,
};

/// Policy run around every request handled by the session middleware.
///
/// Both checks default to the cookie based flow of [`load_from_cookie`] and
/// [`save_to_cookie`]; override one to change what happens on load or save.
#[async_trait]
pub trait SessionHooks: Send + Sync + 'static {
    async fn load_check(
        &self,
        manager: &SessionManager,
        ctx: &mut dyn SessionContext,
    ) -> SessionResult<()> {
        load_from_cookie(manager, ctx).await.map(|_| ())
    }

    async fn save_check(
        &self,
        manager: &SessionManager,
        ctx: &mut dyn SessionContext,
    ) -> SessionResult<()> {
        save_to_cookie(manager, ctx).await
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl SessionHooks for DefaultHooks {}

/// Gives every client a session token, even when the handler never touches
/// the session.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireToken;

#[async_trait]
impl SessionHooks for RequireToken {
    async fn load_check(
        &self,
        manager: &SessionManager,
        ctx: &mut dyn SessionContext,
    ) -> SessionResult<()> {
        let data = load_from_cookie(manager, ctx).await?;
        if data.token().is_none() {
            data.mark_modified();
        }
        Ok(())
    }
}

/// Loads the session named by the manager's cookie, or a fresh one when the
/// request carries no such cookie.
pub async fn load_from_cookie(
    manager: &SessionManager,
    ctx: &mut dyn SessionContext,
) -> SessionResult<Arc<SessionData>> {
    let token = ctx
        .cookie(manager.cookie_name())
        .map(|cookie| cookie.value().to_owned())
        .unwrap_or_default();

    manager.load(ctx, &token).await
}

/// Commits a modified session and writes its cookie, or clears the cookie of
/// a destroyed one. Unmodified sessions are left alone.
pub async fn save_to_cookie(
    manager: &SessionManager,
    ctx: &mut dyn SessionContext,
) -> SessionResult<()> {
    if ctx.session_data(manager.context_key()).is_none() {
        return Ok(());
    }

    match manager.status(&*ctx) {
        Status::Modified => {
            let (token, expiry) = manager.commit(&*ctx).await?;
            manager.write_session_cookie(ctx, &token, Some(expiry));
        }
        Status::Destroyed => {
            manager.write_session_cookie(ctx, "", None);
        }
        Status::Unmodified => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::header;

    use super::*;
    use crate::{context::HttpContext, store::MemoryStore};

    #[tokio::test]
    async fn test_idle_timeout_refreshes_cookie_on_read_only_request() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = SessionManager::builder()
            .with_store(store.clone())
            .with_idle_timeout(Duration::from_secs(600))
            .build();

        let mut first = HttpContext::default();
        manager.load(&mut first, "").await.unwrap();
        manager.put(&first, "user", "alice");
        let (token, _) = manager.commit(&first).await.unwrap();

        let mut headers = http::HeaderMap::new();
        headers.insert(header::COOKIE, format!("session={token}").parse().unwrap());
        let mut ctx = HttpContext::new(headers);

        let data = load_from_cookie(&manager, &mut ctx).await.unwrap();
        assert_eq!(data.status(), Status::Modified);
        save_to_cookie(&manager, &mut ctx).await.unwrap();

        let cookie = ctx
            .response_headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with(&format!("session={token}")));
        assert!(cookie.contains("Max-Age=600"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unmodified_session_is_not_saved() {
        let store = MemoryStore::with_cleanup_interval(Duration::ZERO);
        let manager = SessionManager::builder().with_store(store.clone()).build();
        let mut ctx = HttpContext::default();

        load_from_cookie(&manager, &mut ctx).await.unwrap();
        save_to_cookie(&manager, &mut ctx).await.unwrap();

        assert!(ctx.response_headers().is_empty());
        assert!(store.is_empty());
    }
}
