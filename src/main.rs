use std::sync::Arc;

use certportal::{config, roster::Roster, routes, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certportal=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    let roster = Roster::load(&config.roster_path);
    if roster.is_empty() {
        tracing::warn!(
            "No certificate data found in {}; the portal will report it",
            config.roster_path.display()
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, roster)?);
    let app = routes::router(state);

    tracing::info!("Certificate portal listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
