use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::json;
use std::convert::Infallible;
use telestrator_media::FrameSnapshot;
use telestrator_media::frame::multipart_content_type;

/// GET /img: an endless `multipart/x-mixed-replace` stream of pushed frames.
pub async fn stream_frames(State(state): State<AppState>) -> Response {
    let subscription = state.bridge.subscribe().await;
    tracing::info!(subscriber = %subscription.id, "Broadcast consumer connected");

    let frames = futures_util::stream::unfold(subscription.frames, |mut frames| async move {
        frames
            .recv()
            .await
            .map(|part| (Ok::<Bytes, Infallible>(part), frames))
    });

    (
        [
            (header::CONTENT_TYPE, multipart_content_type()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
            (header::PRAGMA, "no-cache".to_string()),
            (header::CONNECTION, "close".to_string()),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

/// POST /img: push a `data:` URI frame without going through the relay.
pub async fn push_frame(State(state): State<AppState>, body: String) -> Result<impl IntoResponse> {
    let uri = body.trim();
    if uri.is_empty() {
        return Err(AppError::BadRequest("Empty frame".to_string()));
    }

    let frame = FrameSnapshot::from_data_uri(uri)?;
    let delivered = state.bridge.push(&frame).await;

    Ok((StatusCode::ACCEPTED, Json(json!({ "delivered": delivered }))))
}
