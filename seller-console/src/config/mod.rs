use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub payments: PaymentSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
    #[serde(default)]
    pub countries: CountriesSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub session_secret: Secret<String>,
    /// Mark the session cookie `Secure`; enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BackendSettings {
    /// REST API root, e.g. `http://localhost:5000/api/v1`.
    pub base_url: String,
    /// Socket service origin. Defaults to `base_url` without its `/api/v1` suffix.
    #[serde(default)]
    pub socket_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl BackendSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            socket_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn socket_origin(&self) -> String {
        match &self.socket_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let base = self.base_url.trim_end_matches('/');
                base.strip_suffix("/api/v1").unwrap_or(base).to_string()
            }
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct PaymentSettings {
    /// Publishable key handed to the processor's browser script.
    #[serde(default)]
    pub publishable_key: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct ObservabilitySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct CountriesSettings {
    #[serde(default = "default_countries_url")]
    pub url: String,
    #[serde(default = "default_countries_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_countries_url() -> String {
    "https://www.apicountries.com/countries".to_string()
}

fn default_countries_ttl() -> u64 {
    86_400
}

impl Default for CountriesSettings {
    fn default() -> Self {
        Self {
            url: default_countries_url(),
            cache_ttl_secs: default_countries_ttl(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct RealtimeSettings {
    /// A channel whose page has not polled for this long is torn down.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    30
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RealtimeSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let directory = service_core::config::config_directory("seller-console")?;
    service_core::config::load(&directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_origin_strips_api_suffix() {
        let settings = BackendSettings::new("http://localhost:5000/api/v1/");
        assert_eq!(settings.socket_origin(), "http://localhost:5000");
    }

    #[test]
    fn explicit_socket_url_wins() {
        let mut settings = BackendSettings::new("http://api.example.com/api/v1");
        settings.socket_url = Some("https://socket.example.com/".to_string());
        assert_eq!(settings.socket_origin(), "https://socket.example.com");
    }
}
