mod catalog;
mod error;
mod feedback;
mod jira;
mod mail;
mod notify;
#[cfg(test)]
mod testing;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use opine_common::types::ServiceInfo;
use opine_config::{init_tracing, AppConfig};
use opine_db::feedback::pg_repository::PgFeedbackRepository;
use opine_db::feedback::repositories::FeedbackRepository;
use opine_db::tasks::pg_repository::PgNotifyTaskRepository;
use opine_db::tasks::repositories::NotifyTaskRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::catalog::client::{CatalogClient, RestCatalogClient};
use crate::jira::client::{JiraTicketClient, TicketClient};
use crate::mail::notifier::{DisabledMailNotifier, MailNotifier, RelayMailNotifier};
use crate::notify::worker::NotifyWorker;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub feedback_repo: Arc<dyn FeedbackRepository>,
    pub task_repo: Arc<dyn NotifyTaskRepository>,
    pub catalog: Arc<dyn CatalogClient>,
    pub tickets: Arc<dyn TicketClient>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("opine-api"))
}

async fn metrics() -> impl IntoResponse {
    let body = "\
# HELP opine_up Service up indicator\n\
# TYPE opine_up gauge\n\
opine_up 1\n\
# HELP opine_info Service info\n\
# TYPE opine_info gauge\n\
opine_info{service=\"opine-api\",version=\"0.1.0\"} 1\n";

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
        .merge(feedback::router())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let config = Arc::new(AppConfig::from_env().expect("failed to load config"));
    init_tracing(&config.log_level);
    tracing::info!(service = "opine-api", "starting");

    let pool = opine_db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let feedback_repo: Arc<dyn FeedbackRepository> =
        Arc::new(PgFeedbackRepository::new(pool.clone()));
    let task_repo: Arc<dyn NotifyTaskRepository> = Arc::new(PgNotifyTaskRepository::new(pool));
    let catalog: Arc<dyn CatalogClient> = Arc::new(
        RestCatalogClient::new(
            &config.catalog_base_url,
            config.catalog_token.clone(),
            config.http_timeout_secs,
        )
        .expect("failed to create catalog client"),
    );
    let tickets: Arc<dyn TicketClient> = Arc::new(
        JiraTicketClient::new(config.http_timeout_secs).expect("failed to create jira client"),
    );
    let mailer: Arc<dyn MailNotifier> = match &config.mail_relay_url {
        Some(relay_url) => Arc::new(
            RelayMailNotifier::new(relay_url, config.mail_from.clone(), config.http_timeout_secs)
                .expect("failed to create mail notifier"),
        ),
        None => Arc::new(DisabledMailNotifier),
    };

    let worker = NotifyWorker::new(
        config.clone(),
        feedback_repo.clone(),
        task_repo.clone(),
        catalog.clone(),
        tickets.clone(),
        mailer,
    );
    tokio::spawn(worker.run());

    let state = AppState {
        config: config.clone(),
        feedback_repo,
        task_repo,
        catalog,
        tickets,
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
