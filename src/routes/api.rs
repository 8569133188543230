use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use std::sync::Arc;

use super::current_session;
use crate::state::AppState;

pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(handle) = current_session(&state, &headers) else {
        return Redirect::to("/").into_response();
    };
    let Some(artifact) = handle.lock().await.artifact().cloned() else {
        return Redirect::to("/").into_response();
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        artifact.download_filename().replace('"', "")
    );

    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}

pub async fn preview_png(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let artifact = match current_session(&state, &headers) {
        Some(handle) => handle.lock().await.artifact().cloned(),
        None => None,
    };
    let Some(artifact) = artifact else {
        return (StatusCode::NOT_FOUND, "No certificate fetched yet").into_response();
    };

    match state.renderer.render(artifact.bytes).await {
        Ok(image) => ([(header::CONTENT_TYPE, "image/png")], image.png).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

pub async fn roster_names(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "names": state.roster.names(),
    }))
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let artifact = match current_session(&state, &headers) {
        Some(handle) => handle.lock().await.artifact().cloned(),
        None => None,
    };

    match artifact {
        Some(a) => Json(serde_json::json!({
            "selected_name": a.name,
            "has_certificate": true,
            "size": a.bytes.len(),
            "fetched_at": a.fetched_at,
        })),
        None => Json(serde_json::json!({
            "selected_name": null,
            "has_certificate": false,
        })),
    }
}
