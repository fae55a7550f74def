//! Axum-based API gateway: HTTP entry point for mindmates.

mod handlers;

use axum::routing::{get, post, put};
use axum::Router;
use dashmap::DashMap;
use handlers::AppState;
use mindmates_chat::{ChatService, HttpTransport, PromptTemplate};
use mindmates_core::{CoreConfig, UserDirectory};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat", post(handlers::chat))
        .route("/v1/chat/:user_id/transcript", get(handlers::transcript))
        .route("/v1/users", post(handlers::create_user))
        .route("/v1/users/:id", get(handlers::get_user))
        .route("/v1/users/:id/tributes", get(handlers::tributes))
        .route("/v1/users/:id/supporters", get(handlers::supporters))
        .route("/v1/users/:id/supporting", get(handlers::supporting))
        .route("/v1/credential", put(handlers::set_credential))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::load().expect("load gateway config");
    let directory =
        Arc::new(UserDirectory::open_path(&config.storage_path).expect("open user directory"));

    if let Ok(seed) = std::fs::read_to_string(&config.seed_path) {
        directory
            .seed_from_json(&seed)
            .expect("seed user directory");
    }
    if let Ok(key) = std::env::var("MINDMATES_API_KEY") {
        if !key.is_empty() {
            directory.set_api_key(&key).expect("persist API key");
        }
    }

    let template = PromptTemplate::load_path(&config.template_path).expect("load prompt template");
    let service = Arc::new(ChatService::new(
        Arc::new(HttpTransport::new(&config.api_url)),
        Arc::clone(&directory),
        template,
        config.model.clone(),
    ));

    let app = router(AppState {
        service,
        directory,
        transcripts: Arc::new(DashMap::new()),
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("{} gateway listening on {}", config.app_name, addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await.expect("bind"),
        app,
    )
    .await
    .expect("serve");
}
