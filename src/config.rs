//! Process configuration, read once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::credential;
use crate::types::SiteConfig;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_SITE_NAME: &str = "Cloudflare 流量监控";
pub const DEFAULT_SITE_ICON: &str = "https://static.cloudflareclient.com/favicon.ico";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the Cloudflare client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: Option<String>,
    pub account_id: Option<String>,
    pub base_url: String,
    /// Deadline applied to every outbound call.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            account_id: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything the server needs, built from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub site: SiteConfig,
    /// `USE_LOCAL_MOCK=1` forces fixtures even with a token.
    pub use_local_mock: bool,
    pub mock_dir: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(credential::resolve(), |key| env::var(key).ok())
    }

    /// Build the configuration from a resolved token and a variable lookup.
    ///
    /// Empty variables count as absent. Unparsable numbers fall back to
    /// their defaults.
    pub fn from_vars(token: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            client: ClientConfig {
                token,
                account_id: var("CF_ACCOUNT_ID"),
                base_url: var("CF_API_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                timeout: var("CF_API_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TIMEOUT),
            },
            site: SiteConfig {
                site_name: var("SITE_NAME").unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
                site_icon: var("SITE_ICON").unwrap_or_else(|| DEFAULT_SITE_ICON.to_string()),
            },
            use_local_mock: var("USE_LOCAL_MOCK").as_deref() == Some("1"),
            mock_dir: var("MOCK_DIR").unwrap_or_else(|| "mock".into()).into(),
            static_dir: var("STATIC_DIR").unwrap_or_else(|| ".".into()).into(),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    /// Whether requests are answered from fixtures.
    pub fn mock_mode(&self) -> bool {
        credential::should_use_mock(self.client.token.as_deref(), self.use_local_mock)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            site: SiteConfig {
                site_name: DEFAULT_SITE_NAME.to_string(),
                site_icon: DEFAULT_SITE_ICON.to_string(),
            },
            use_local_mock: false,
            mock_dir: PathBuf::from("mock"),
            static_dir: PathBuf::from("."),
            port: DEFAULT_PORT,
        }
    }
}

/// Load `.env` from the working directory if one exists.
pub fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to load .env file: {}", e)),
    }
}
