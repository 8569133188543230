use std::sync::Arc;
use tera::Tera;

use crate::config::Config;
use crate::drive::DriveFetcher;
use crate::pdf::PreviewRenderer;
use crate::roster::Roster;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
    pub fetcher: DriveFetcher,
    pub renderer: PreviewRenderer,
    pub sessions: Arc<SessionStore>,
    pub tera: Arc<Tera>,
}

impl AppState {
    pub fn new(
        config: Config,
        roster: Roster,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let fetcher = DriveFetcher::new(&config.drive_download_base, config.fetch_timeout)?;
        let renderer = PreviewRenderer::new(config.pdfium_library_path.clone());
        let sessions = SessionStore::new(config.session_idle, config.max_sessions);
        let tera = crate::templates::load(&config.template_dir)?;

        Ok(Self {
            config: Arc::new(config),
            roster: Arc::new(roster),
            fetcher,
            renderer,
            sessions: Arc::new(sessions),
            tera: Arc::new(tera),
        })
    }
}
