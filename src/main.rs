use transvia::{
    auth,
    config::{
        session::{validate_production_config, SessionConfig},
        WebhookConfig,
    },
    db, handlers,
    services::HttpWebhookClient,
    AppState,
};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::{Redirect, Response},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transvia=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The database holds sessions only; business records live behind the
    // webhook backend.
    let pool = db::create_pool().await?;

    let app_state = AppState {
        webhook: Arc::new(HttpWebhookClient::new(WebhookConfig::from_env())),
        token_decoder: Arc::new(auth::token::TokenDecoder::from_env()),
    };

    validate_production_config();
    let session_store = SqliteStore::new(pool.clone())
        .with_table_name("sessions")
        .expect("Invalid session table name for sessions");
    session_store.migrate().await?;

    let session_layer = SessionConfig::from_env().create_layer(session_store);

    // Login pages bounce authenticated users straight to the dashboard.
    let login_routes = Router::new()
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit_handler),
        )
        .layer(middleware::from_fn(
            auth::middleware::redirect_if_authenticated,
        ));

    let protected_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard_handler))
        .route("/admin", get(handlers::admin_page))
        .route("/admin/users", post(handlers::create_user_handler))
        .layer(middleware::from_fn(auth::middleware::require_auth));

    let app = Router::new()
        .route("/", get(root_handler))
        .merge(login_routes)
        // Verification posts carry their own flow state; no auth layer.
        .route("/login/verify", post(handlers::verify_handler))
        .route("/login/resend", post(handlers::resend_handler))
        .route("/login/back", post(handlers::back_handler))
        .route("/logout", get(handlers::logout_handler))
        .merge(protected_routes)
        .nest_service("/static", ServeDir::new("static"))
        .layer(session_layer)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()?;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The root path only dispatches on authentication state.
async fn root_handler(session: tower_sessions::Session) -> Redirect {
    match auth::session_auth::current(&session).await {
        Ok(Some(_)) => Redirect::to("/dashboard"),
        _ => Redirect::to("/login"),
    }
}

async fn add_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'; \
             frame-ancestors 'none';",
        ),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if std::env::var("ENVIRONMENT")
        .map(|env| env == "production")
        .unwrap_or(false)
    {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        );
    }

    response
}
