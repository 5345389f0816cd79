use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod dtos;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use services::identity_service::FirebaseAuthClient;
use services::mail_service::SmtpMailer;
use services::otp_store::OtpStore;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env();
    let app_state = initialize_app_state(&config);

    let app = build_router(app_state);
    start_server(app, &config).await;
}

fn initialize_app_state(config: &AppConfig) -> AppState {
    let mailer = match SmtpMailer::new(config) {
        Ok(mailer) => {
            tracing::info!("✅ SMTP transport ready ({})", config.smtp_host);
            Arc::new(mailer)
        }
        Err(e) => {
            tracing::error!("❌ Failed to initialize SMTP transport: {}", e);
            panic!("Failed to initialize SMTP transport: {}", e);
        }
    };

    let identity = Arc::new(FirebaseAuthClient::new(config));
    tracing::info!("✅ Identity provider client ready ({})", config.identity_base_url);

    if config.expose_otp_in_response {
        tracing::warn!("⚠️ EXPOSE_OTP_IN_RESPONSE is on, codes are echoed to callers");
    }

    AppState::new(OtpStore::new(), identity, mailer, config)
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .merge(routes::auth_otp_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) {
    let host: IpAddr = config
        .host
        .parse()
        .unwrap_or_else(|_| IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::new(host, config.port);

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            axum::serve(listener, app).await.unwrap();
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "💅 Lam Dep Booking Auth API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
