use crate::mjpeg::handler as mjpeg;
use crate::relay::handler as relay;
use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// HTTP port: broadcast stream, health and the static client pages.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let assets = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health))
        .route("/img", get(mjpeg::stream_frames).post(mjpeg::push_frame))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Relay port: every path upgrades to the signaling WebSocket.
pub fn create_relay_router(state: AppState) -> Router {
    Router::new()
        .fallback(relay::ws_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "peers": state.relay.peer_count().await,
        "subscribers": state.bridge.subscriber_count().await,
    }))
}
