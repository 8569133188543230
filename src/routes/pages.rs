use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;
use tracing::{error, info, warn};

use super::{current_session, session_cookie, session_id};
use crate::drive::FetchError;
use crate::pdf::RenderError;
use crate::state::AppState;

const DOWNLOAD_HINT: &str = "You can still download the certificate using the button below.";

#[derive(Deserialize, Default)]
pub struct IndexQuery {
    name: Option<String>,
    error: Option<String>,
}

#[derive(Serialize, Default)]
struct PreviewView {
    image: Option<String>,
    error: Option<String>,
    hint: Option<&'static str>,
    download_filename: String,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IndexQuery>,
) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("title", &state.config.portal_title);
    ctx.insert("has_data", &!state.roster.is_empty());
    ctx.insert("names", &state.roster.names());

    let selected = query.name.filter(|n| !n.is_empty());
    let found = selected
        .as_deref()
        .map_or(false, |n| state.roster.lookup(n).is_some());
    ctx.insert("selected_name", &selected);
    ctx.insert("name_found", &found);
    ctx.insert("notice", &query.error.as_deref().map(notice_message));

    let mut preview: Option<PreviewView> = None;
    if let (Some(name), Some(handle)) = (selected.as_deref(), current_session(&state, &headers)) {
        let artifact = handle.lock().await.artifact_for(name).cloned();
        if let Some(artifact) = artifact {
            let mut view = PreviewView {
                download_filename: artifact.download_filename(),
                ..Default::default()
            };
            match state.renderer.render(artifact.bytes).await {
                Ok(image) => view.image = Some(image.data_uri()),
                Err(RenderError::EmptyDocument) => {
                    view.error = Some(RenderError::EmptyDocument.to_string());
                    view.hint = Some(DOWNLOAD_HINT);
                }
                Err(e) => {
                    warn!("Preview for {} failed: {}", name, e);
                    view.error = Some(format!("Error displaying PDF preview: {}", e));
                    view.hint = Some(DOWNLOAD_HINT);
                }
            }
            preview = Some(view);
        }
    }
    ctx.insert("preview", &preview);

    render_template(&state, "index.html", ctx)
}

#[derive(Deserialize)]
pub struct FetchForm {
    name: String,
}

pub async fn fetch_certificate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FetchForm>,
) -> impl IntoResponse {
    let Some(entry) = state.roster.lookup(&form.name) else {
        return Redirect::to(&index_url(&form.name, Some("not_found"))).into_response();
    };

    let (id, handle) = state.sessions.get_or_create(session_id(&headers).as_deref());
    let mut session = handle.lock().await;

    let target = match session
        .fetch_certificate(&state.fetcher, &entry.drive_link)
        .await
    {
        Ok(bytes) => {
            session.store_artifact(&entry.name, bytes);
            index_url(&entry.name, None)
        }
        Err(FetchError::Unresolvable) => {
            info!("No certificate link for {}", entry.name);
            index_url(&entry.name, Some("unavailable"))
        }
        Err(e) => {
            error!("Failed to download certificate for {}: {}", entry.name, e);
            index_url(&entry.name, Some("download_failed"))
        }
    };

    (
        [(header::SET_COOKIE, session_cookie(&id))],
        Redirect::to(&target),
    )
        .into_response()
}

fn notice_message(code: &str) -> &'static str {
    match code {
        "not_found" => "Name not found",
        "unavailable" => "Certificate not available for this name.",
        _ => "Failed to download certificate.",
    }
}

pub(crate) fn index_url(name: &str, error: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("name", name);
    if let Some(error) = error {
        query.append_pair("error", error);
    }
    format!("/?{}", query.finish())
}

fn render_template(state: &AppState, name: &str, ctx: Context) -> Html<String> {
    let rendered = state.tera.render(name, &ctx).unwrap_or_else(|e| {
        error!("Template {} failed: {:?}", name, e);
        format!("Template error: {}", name)
    });
    Html(rendered)
}
