use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub download_dir: PathBuf,
    pub advisory_ttl_ms: u64,
    pub outcome_ttl_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            download_dir: PathBuf::from("."),
            advisory_ttl_ms: 3000,
            outcome_ttl_ms: 5000,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CONVERTY_API_URL") {
            config.api_url = url;
        }

        if let Ok(dir) = std::env::var("CONVERTY_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        if let Ok(ttl) = std::env::var("CONVERTY_ADVISORY_TTL_MS") {
            if let Ok(t) = ttl.parse() {
                config.advisory_ttl_ms = t;
            }
        }

        if let Ok(ttl) = std::env::var("CONVERTY_OUTCOME_TTL_MS") {
            if let Ok(t) = ttl.parse() {
                config.outcome_ttl_ms = t;
            }
        }

        if let Ok(timeout) = std::env::var("CONVERTY_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                config.request_timeout_secs = Some(t);
            }
        }

        config
    }

    /// Verifica che l'URL dell'API sia utilizzabile come base per gli endpoint
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "CONVERTY_API_URL deve iniziare con http:// o https://: {}",
                self.api_url
            )));
        }
        Ok(())
    }

    pub fn advisory_ttl(&self) -> Duration {
        Duration::from_millis(self.advisory_ttl_ms)
    }

    pub fn outcome_ttl(&self) -> Duration {
        Duration::from_millis(self.outcome_ttl_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// Formati accettati dai tre tipi di conversione
pub mod formats {
    pub const PDF_MIME: &str = "application/pdf";
    pub const IMAGE_MIME_PREFIX: &str = "image/";

    // Estensioni rimosse dal nome prima di aggiungere ".webp"
    pub const WEBP_SOURCE_EXTENSIONS: &[&str] =
        &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "svg"];

    pub fn is_webp_source_extension(ext: &str) -> bool {
        WEBP_SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
