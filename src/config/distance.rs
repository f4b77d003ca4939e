use crate::config::{try_get_env, try_get_secret_env};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

pub const NAME_DISTANCE_API_KEY: &str = "DISTANCE_API_KEY";

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Deserialize)]
pub struct DistanceSettingsModel {
    pub api_key: Option<Secret<String>>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl DistanceSettingsModel {
    /// Refinement stays disabled unless an api key is provided.
    pub fn to_settings(self) -> Option<DistanceSettings> {
        let Some(api_key) = self.api_key else {
            warn!("Distance service api key missing");
            return None;
        };
        Some(DistanceSettings {
            api_key,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: self
                .timeout_ms
                .map_or(DEFAULT_TIMEOUT, Duration::from_millis),
        })
    }
}

#[derive(Clone)]
pub struct DistanceSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl DistanceSettings {
    pub fn from_env() -> Option<Self> {
        DistanceSettingsModel {
            api_key: try_get_secret_env(NAME_DISTANCE_API_KEY),
            base_url: try_get_env("DISTANCE_BASE_URL"),
            timeout_ms: try_get_env("DISTANCE_TIMEOUT_MS").and_then(|t| t.parse().ok()),
        }
        .to_settings()
    }
}
