mod store;

pub use store::{SessionHandle, SessionStore};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::drive::{DriveFetcher, FetchError};

/// The certificate last fetched in a session, kept for preview and download.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub bytes: Bytes,
    pub fetched_at: DateTime<Utc>,
}

impl Artifact {
    /// `<Name_with_underscores>_Certificate.pdf`
    pub fn download_filename(&self) -> String {
        certificate_filename(&self.name)
    }
}

pub fn certificate_filename(name: &str) -> String {
    format!("{}_Certificate.pdf", name.replace(' ', "_"))
}

/// Per-visitor state: memoized downloads keyed by share link, plus the
/// current artifact.
#[derive(Debug, Default)]
pub struct Session {
    downloads: HashMap<String, Bytes>,
    artifact: Option<Artifact>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch through the memo. Only successful downloads are remembered.
    pub async fn fetch_certificate(
        &mut self,
        fetcher: &DriveFetcher,
        share_link: &str,
    ) -> Result<Bytes, FetchError> {
        if let Some(bytes) = self.downloads.get(share_link) {
            debug!("Memo hit for {} ({} bytes)", share_link, bytes.len());
            return Ok(bytes.clone());
        }

        let bytes = fetcher.fetch(share_link).await?;
        self.downloads.insert(share_link.to_string(), bytes.clone());
        Ok(bytes)
    }

    pub fn store_artifact(&mut self, name: &str, bytes: Bytes) {
        info!("Stored certificate for {} ({} bytes)", name, bytes.len());
        self.artifact = Some(Artifact {
            name: name.to_string(),
            bytes,
            fetched_at: Utc::now(),
        });
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// The artifact, but only if it was fetched for `name`.
    pub fn artifact_for(&self, name: &str) -> Option<&Artifact> {
        self.artifact.as_ref().filter(|a| a.name == name)
    }
}
