use crate::config::get_secret_env;
use secrecy::Secret;
use serde::Deserialize;
use tracing::warn;

pub const NAME_ACCESS_SECRET: &str = "JWT_ACCESS_SECRET";

const DEFAULT_ACCESS_SECRET: &str = "ACCESS_SECRET";

/// Access tokens are minted by the identity service; this backend only verifies them.
#[derive(Deserialize)]
pub struct JwtSettingsModel {
    pub access_secret: Option<Secret<String>>,
}

impl JwtSettingsModel {
    pub fn to_settings(self) -> JwtSettings {
        let access = self.access_secret.unwrap_or_else(|| {
            warn!("Using default access token secret");
            Secret::new(DEFAULT_ACCESS_SECRET.to_string())
        });
        JwtSettings { access }
    }
}

#[derive(Clone)]
pub struct JwtSettings {
    pub access: Secret<String>,
}

impl JwtSettings {
    pub fn new(access: &str) -> Self {
        Self {
            access: Secret::new(access.to_owned()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            access: get_secret_env(NAME_ACCESS_SECRET),
        }
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_SECRET)
    }
}
