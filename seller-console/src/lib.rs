pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod services;
pub mod session;
pub mod startup;

use config::Settings;
use metrics_exporter_prometheus::PrometheusHandle;
use realtime::ChannelRegistry;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use services::{ApiClient, CountriesCache};
use std::sync::Arc;
use tower_sessions::cookie::Key;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub channels: Arc<ChannelRegistry>,
    pub countries: Arc<CountriesCache>,
    pub settings: Arc<Settings>,
    pub metrics: PrometheusHandle,
    pub session_key: Key,
}

impl AppState {
    pub fn new(settings: Settings, metrics: PrometheusHandle) -> Result<Self, AppError> {
        let session_key = Key::try_from(settings.server.session_secret.expose_secret().as_bytes())
            .map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "server.session_secret must be at least 64 bytes"
                ))
            })?;
        let api = ApiClient::new(&settings.backend)?;
        let channels = ChannelRegistry::new(settings.backend.socket_origin());
        let countries = CountriesCache::new(&settings.countries);

        Ok(Self {
            api: Arc::new(api),
            channels: Arc::new(channels),
            countries: Arc::new(countries),
            settings: Arc::new(settings),
            metrics,
            session_key,
        })
    }
}
