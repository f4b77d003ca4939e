use crate::config::{get_env, try_get_env};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{info, warn};

pub const NAME_POSTGRES: &str = "DATABASE_URL";

#[derive(Deserialize, Clone)]
pub struct DatabaseFieldsModel {
    username: Option<String>,
    password: Option<Secret<String>>,
    port: Option<u16>,
    host: Option<String>,
    database_name: Option<String>,
}

impl DatabaseFieldsModel {
    fn compose(&self, scheme: &str) -> String {
        let password = self
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_str())
            .unwrap_or_default();
        format!(
            "{scheme}://{}:{}@{}:{}/{}",
            self.username.as_deref().unwrap_or("postgres"),
            password,
            self.host.as_deref().unwrap_or("localhost"),
            self.port.unwrap_or(5432),
            self.database_name.as_deref().unwrap_or("postgres"),
        )
    }
}

#[derive(Deserialize, Clone)]
pub struct PostgresSettingsModel {
    database_url: Option<String>,
    fields: Option<DatabaseFieldsModel>,
    is_migrating: Option<bool>,
}

impl PostgresSettingsModel {
    /// Composed fields win over an explicit url, which wins over `DATABASE_URL`.
    fn connection_string(&self) -> String {
        if let Some(fields) = &self.fields {
            info!("Using composed url for postgresql");
            return fields.compose("postgresql");
        }
        if let Some(url) = &self.database_url {
            info!("Using field url for postgresql");
            return url.clone();
        }
        info!("Using env url for postgresql");
        try_get_env(NAME_POSTGRES).unwrap_or_else(|| {
            warn!("{NAME_POSTGRES} is not set");
            String::new()
        })
    }

    pub fn to_settings(self) -> PostgresSettings {
        PostgresSettings {
            database_url: Secret::new(self.connection_string()),
            is_migrating: self.is_migrating.unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct PostgresSettings {
    pub database_url: Secret<String>,
    pub is_migrating: bool,
}

impl PostgresSettings {
    pub fn from_env() -> Self {
        Self {
            database_url: Secret::new(get_env(NAME_POSTGRES)),
            is_migrating: true,
        }
    }
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            database_url: Secret::new(try_get_env(NAME_POSTGRES).unwrap_or_default()),
            is_migrating: false,
        }
    }
}
