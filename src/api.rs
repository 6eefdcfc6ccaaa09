use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::chat::{SupportBot, FALLBACK_REPLY};
use crate::config::AppConfig;
use crate::geo::{self, GeoLocator};
use crate::models::{
    ChatReply, ChatRequest, MonitoredServerEntry, PLACEHOLDER_ALERT_COUNT, PLACEHOLDER_UPTIME,
};
use crate::probe::Prober;

pub struct AppState {
    pub config: AppConfig,
    pub prober: Arc<dyn Prober>,
    pub geo: Arc<dyn GeoLocator>,
    pub bot: Arc<dyn SupportBot>,
}

impl AppState {
    fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.config.probe_timeout_ms)
    }
}

#[derive(Deserialize)]
struct CheckParams {
    server: Option<String>,
}

#[derive(Deserialize)]
struct ValidateParams {
    ip: Option<String>,
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckParams>,
) -> Response {
    let Some(server) = params.server.filter(|s| !s.is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "No server IP provided");
    };
    let result = state.prober.probe(&server, state.probe_timeout()).await;
    Json(result).into_response()
}

async fn validate_ip(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
) -> Response {
    let Some(ip) = params.ip.filter(|ip| geo::is_valid_ip(ip)) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid IP address");
    };
    match state.geo.geolocate(&ip).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            warn!("Geolocation lookup for {} failed: {:#}", ip, e);
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not retrieve location data",
            )
        }
    }
}

async fn server_data(State(state): State<Arc<AppState>>) -> Json<Vec<MonitoredServerEntry>> {
    let mut tasks = FuturesUnordered::new();
    for ip in &state.config.monitored_ips {
        let ip = ip.clone();
        let state_ref = Arc::clone(&state);
        tasks.push(tokio::spawn(async move {
            let timeout = state_ref.probe_timeout();
            let (location, probe) = tokio::join!(
                state_ref.geo.geolocate(&ip),
                state_ref.prober.probe(&ip, timeout),
            );

            let body = match location {
                Ok(body) => body,
                Err(e) => {
                    warn!("Skipping {} on the map: {:#}", ip, e);
                    return None;
                }
            };
            let Some((latitude, longitude)) = geo::coordinates(&body) else {
                warn!("Skipping {} on the map: lookup response has no coordinates", ip);
                return None;
            };

            Some(MonitoredServerEntry {
                ip,
                latitude,
                longitude,
                latency: probe.latency,
                uptime: PLACEHOLDER_UPTIME,
                alert_count: PLACEHOLDER_ALERT_COUNT,
            })
        }));
    }

    let mut entries = Vec::new();
    while let Some(joined) = tasks.next().await {
        if let Ok(Some(entry)) = joined {
            entries.push(entry);
        }
    }
    entries.sort_by(|a, b| a.ip.cmp(&b.ip));
    Json(entries)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let message = request
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    let Some(message) = message else {
        return error_body(StatusCode::BAD_REQUEST, "No message provided");
    };

    let response = match state.bot.respond(&message).await {
        Ok(text) => text,
        Err(e) => {
            error!("Chat completion failed: {:#}", e);
            FALLBACK_REPLY.to_string()
        }
    };
    Json(ChatReply { response }).into_response()
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    Router::new()
        .route("/check", get(check))
        .route("/validate_ip", get(validate_ip))
        .route("/server_data", get(server_data))
        .route("/chat", post(chat))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, state: Arc<AppState>) {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Dashboard: http://localhost:{}", addr.port());
    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind API port");
    axum::serve(listener, app).await.unwrap();
}
