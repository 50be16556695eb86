use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the extraction service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Progress poll cadence in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall polling budget in seconds. Polling past this point is a
    /// stuck job; the poller gives up and leaves the outcome to the
    /// submission response.
    #[serde(default = "default_max_poll_secs")]
    pub max_poll_secs: u64,
}

fn default_service_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_secs() -> u64 {
    1800
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_secs: default_max_poll_secs(),
        }
    }
}
