use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DRIVE_DOWNLOAD_BASE: &str = "https://drive.google.com/uc";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub portal_title: String,
    pub roster_path: PathBuf,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub drive_download_base: String,
    pub fetch_timeout: Duration,
    pub pdfium_library_path: Option<PathBuf>,
    pub session_idle: Duration,
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let roster_path = base_dir.join(
            std::env::var("ROSTER_PATH").unwrap_or_else(|_| "certificates.csv".to_string()),
        );
        let template_dir = base_dir.join(
            std::env::var("TEMPLATE_DIR").unwrap_or_else(|_| "templates".to_string()),
        );
        let static_dir =
            base_dir.join(std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = parse_var("PORT", 8501);

        let portal_title = std::env::var("PORTAL_TITLE")
            .unwrap_or_else(|_| "Certificate Download Portal".to_string());

        let drive_download_base = std::env::var("DRIVE_DOWNLOAD_BASE")
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_DRIVE_DOWNLOAD_BASE.to_string());

        let pdfium_library_path = std::env::var("PDFIUM_LIBRARY_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            portal_title,
            roster_path,
            template_dir,
            static_dir,
            drive_download_base,
            fetch_timeout: Duration::from_secs(parse_var("FETCH_TIMEOUT_SECS", 30)),
            pdfium_library_path,
            session_idle: Duration::from_secs(parse_var::<u64>("SESSION_IDLE_MINUTES", 60) * 60),
            max_sessions: parse_var("MAX_SESSIONS", 1024).max(1),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_on_garbage() {
        std::env::set_var("CERTPORTAL_TEST_PORT", "not-a-number");
        assert_eq!(parse_var::<u16>("CERTPORTAL_TEST_PORT", 8501), 8501);
        std::env::set_var("CERTPORTAL_TEST_PORT", " 9000 ");
        assert_eq!(parse_var::<u16>("CERTPORTAL_TEST_PORT", 8501), 9000);
        std::env::remove_var("CERTPORTAL_TEST_PORT");
        assert_eq!(parse_var::<u16>("CERTPORTAL_TEST_PORT", 8501), 8501);
    }
}
