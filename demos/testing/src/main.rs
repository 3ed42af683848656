use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use hearth::{
    cookie::CookieConfig,
    session::{
        middleware::{RequireToken, SessionLayer},
        registry, SessionConfig, SessionError, SessionManager, SessionScratch,
    },
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const ADMIN_CONFIG: &str = r#"{
    "idle_timeout_minutes": 20,
    "lifetime_minutes": 480,
    "cookie": { "name": "admin", "same_site": "strict" }
}"#;

#[derive(Debug, Clone)]
struct App {
    admin: SessionManager,
    visitor: SessionManager,
}

#[derive(Debug, Deserialize)]
struct Login {
    user: String,
}

async fn visit(State(app): State<App>, scratch: SessionScratch) -> String {
    let visits = app.visitor.get_int(&scratch, "visits") + 1;
    app.visitor.put(&scratch, "visits", visits);
    format!("visit #{visits}")
}

async fn login(
    State(app): State<App>,
    scratch: SessionScratch,
    Json(login): Json<Login>,
) -> Result<&'static str, SessionError> {
    app.admin.renew_token(&scratch).await?;
    app.admin.put(&scratch, "user", login.user);
    Ok("logged in")
}

async fn logout(
    State(app): State<App>,
    scratch: SessionScratch,
) -> Result<&'static str, SessionError> {
    app.admin.destroy(&scratch).await?;
    Ok("logged out")
}

async fn whoami(scratch: SessionScratch) -> String {
    let Some(admin) = registry().get("admin") else {
        return "no admin sessions configured".to_owned();
    };
    match admin.get_string(&scratch, "user") {
        user if user.is_empty() => "anonymous".to_owned(),
        user => user,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("testing=debug,hearth_session=debug")),
        )
        .init();

    let config: SessionConfig = serde_json::from_str(ADMIN_CONFIG)?;
    let admin = SessionManager::builder().with_config(config).build();
    let visitor = SessionManager::builder()
        .with_cookie(CookieConfig::new().with_name("visitor").with_persist(false))
        .build();

    let admin_layer = SessionLayer::builder()
        .with_manager(admin.clone())
        .cache()
        .build()?;
    let visitor_layer = SessionLayer::builder()
        .with_manager(visitor.clone())
        .with_hooks(RequireToken)
        .with_skipper(|req| req.uri().path().starts_with("/health"))
        .build()?;

    let router = Router::new()
        .route("/", get(visit))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/whoami", get(whoami))
        .route("/health", get(|| async { "ok" }))
        .with_state(App { admin, visitor })
        .layer(visitor_layer)
        .layer(admin_layer);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
