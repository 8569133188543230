mod api;
mod pages;

pub use api::{download_certificate, preview_png, roster_names, session_status};
pub use pages::{fetch_certificate, index};

use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::session::SessionHandle;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "certportal_session";

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(index))
        .route("/fetch", post(fetch_certificate))
        .route("/preview.png", get(preview_png))
        .route("/download", get(download_certificate))
        .route("/api/roster", get(roster_names))
        .route("/api/session", get(session_status))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == SESSION_COOKIE)
        .map(|(_, v)| v.to_string())
}

pub(crate) fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// The caller's live session, if the cookie names one.
pub(crate) fn current_session(state: &AppState, headers: &HeaderMap) -> Option<SessionHandle> {
    session_id(headers).and_then(|id| state.sessions.get(&id))
}
