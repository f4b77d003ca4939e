use crate::config::try_get_env;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
/// Large enough that typical nearby/search result sets fit on one page.
pub const DEFAULT_LISTING_LIMIT: u32 = 200;
pub const DEFAULT_MIN_EVENT_COUNT: u32 = 5;

#[derive(Deserialize)]
pub struct DiscoverySettingsModel {
    pub default_radius_km: Option<f64>,
    pub listing_limit: Option<u32>,
    pub min_event_count: Option<u32>,
}

impl DiscoverySettingsModel {
    pub fn to_settings(self) -> DiscoverySettings {
        let default = DiscoverySettings::default();
        DiscoverySettings {
            default_radius_km: self
                .default_radius_km
                .filter(|r| *r > 0.0)
                .unwrap_or(default.default_radius_km),
            listing_limit: self
                .listing_limit
                .filter(|l| *l > 0)
                .unwrap_or(default.listing_limit),
            min_event_count: self.min_event_count.unwrap_or(default.min_event_count),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscoverySettings {
    pub default_radius_km: f64,
    pub listing_limit: u32,
    pub min_event_count: u32,
}

impl DiscoverySettings {
    pub fn from_env() -> Self {
        Self::from_vars(try_get_env)
    }

    /// Overrides the defaults with whatever `var` yields, skipping invalid values.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(radius) = var("DISCOVERY_DEFAULT_RADIUS_KM") {
            match radius.parse::<f64>() {
                Ok(radius) if radius.is_finite() && radius > 0.0 => {
                    settings.default_radius_km = radius
                }
                _ => warn!("Ignoring invalid DISCOVERY_DEFAULT_RADIUS_KM {radius}"),
            }
        }
        if let Some(limit) = var("DISCOVERY_LISTING_LIMIT") {
            match limit.parse::<u32>() {
                Ok(limit) if limit > 0 => settings.listing_limit = limit,
                _ => warn!("Ignoring invalid DISCOVERY_LISTING_LIMIT {limit}"),
            }
        }
        if let Some(count) = var("DISCOVERY_MIN_EVENT_COUNT") {
            match count.parse::<u32>() {
                Ok(count) => settings.min_event_count = count,
                _ => warn!("Ignoring invalid DISCOVERY_MIN_EVENT_COUNT {count}"),
            }
        }
        settings
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            listing_limit: DEFAULT_LISTING_LIMIT,
            min_event_count: DEFAULT_MIN_EVENT_COUNT,
        }
    }
}
