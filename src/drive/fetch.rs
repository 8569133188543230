use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::resolve::{resolve_with_base, ResolvedLink};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("share link does not contain a recognisable file id")]
    Unresolvable,
    #[error("file-sharing service answered with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Downloads certificate bytes from the file-sharing service.
#[derive(Clone)]
pub struct DriveFetcher {
    client: Client,
    download_base: String,
}

impl DriveFetcher {
    pub fn new(download_base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, download_base))
    }

    pub fn with_client(client: Client, download_base: &str) -> Self {
        Self {
            client,
            download_base: download_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, share_link: &str) -> Option<ResolvedLink> {
        resolve_with_base(share_link, &self.download_base)
    }

    /// Fetch the file behind `share_link`.
    ///
    /// When the first answer is not a 200 or is an HTML page, one more request is
    /// made with `confirm=1`. Whatever a final 200 carries is returned as-is, even
    /// if it does not look like a PDF.
    pub async fn fetch(&self, share_link: &str) -> Result<Bytes, FetchError> {
        let Some(link) = self.resolve(share_link) else {
            warn!("Could not extract a file id from share link {:?}", share_link);
            return Err(FetchError::Unresolvable);
        };

        let mut response = self.get(&link.direct_url).await?;

        if needs_confirmation(&response) {
            info!(
                "File {} returned status {} ({}), retrying with confirm=1",
                link.file_id,
                response.status(),
                content_type(&response).unwrap_or("no content type")
            );
            response = self.get(&link.confirm_url()).await?;
        }

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Download of file {} failed with status {}", link.file_id, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let declared_pdf = content_type(&response)
            .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
            .unwrap_or(false);
        let body = response.bytes().await?;

        if !declared_pdf && !looks_like_pdf(&body) {
            warn!(
                "File {} does not look like a PDF ({} bytes), returning it anyway",
                link.file_id,
                body.len()
            );
        }

        info!("Fetched file {} ({} bytes)", link.file_id, body.len());
        Ok(body)
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        debug!(
            "GET {} -> {} {:?}",
            url,
            response.status(),
            content_type(&response)
        );
        Ok(response)
    }
}

fn content_type(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

fn needs_confirmation(response: &Response) -> bool {
    response.status() != StatusCode::OK
        || content_type(response)
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
}

fn looks_like_pdf(body: &[u8]) -> bool {
    body.starts_with(b"%PDF")
}
