use self::database::get_postgres_pool;
use crate::config::app::ApplicationSettings;
use crate::config::discovery::DiscoverySettings;
use crate::config::environment::Environment;
use crate::config::get_config;
use crate::config::tokens::JwtSettings;
use crate::utils::distance::DistanceRefinement;
use crate::utils::store::postgres::PgDiscoveryStore;
use crate::utils::store::Store;
use anyhow::Context;
use axum::extract::FromRef;
use core::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub mod database;

pub struct Modules {
    pub app: ApplicationSettings,
    store: Store,
    distance: Option<DistanceRefinement>,
    discovery: DiscoverySettings,
    jwt: JwtSettings,
    environment: Environment,
}

impl Modules {
    pub async fn load_from_settings() -> Result<Self, anyhow::Error> {
        let settings = get_config().context("Failed to load settings")?;
        info!("Settings loaded");
        info!("Loading modules");
        let pool = get_postgres_pool(settings.postgres)
            .await
            .context("Failed to connect to postgres")?;
        let distance = settings
            .distance
            .as_ref()
            .map(DistanceRefinement::from_settings)
            .transpose()
            .context("Failed to build distance client")?;
        info!("Modules loaded");
        Ok(Self {
            app: settings.app,
            store: Arc::new(PgDiscoveryStore::new(pool)),
            distance,
            discovery: settings.discovery,
            jwt: settings.jwt,
            environment: settings.environment,
        })
    }

    pub fn use_custom(
        store: Store,
        distance: Option<DistanceRefinement>,
        addr: SocketAddr,
        origin: String,
        access: &str,
        discovery: DiscoverySettings,
        environment: Environment,
    ) -> Self {
        Self {
            app: ApplicationSettings::new(addr, origin),
            store,
            distance,
            discovery,
            jwt: JwtSettings::new(access),
            environment,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub environment: Environment,
    pub store: Store,
    pub distance: Option<DistanceRefinement>,
    pub discovery: DiscoverySettings,
    pub jwt: JwtSettings,
}

impl AppState {
    fn new(modules: &Modules) -> Self {
        Self {
            environment: modules.environment,
            store: modules.store.clone(),
            distance: modules.distance.clone(),
            discovery: modules.discovery.clone(),
            jwt: modules.jwt.clone(),
        }
    }
}

impl Display for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let distance = if self.distance.is_some() {
            "enabled"
        } else {
            "disabled"
        };
        write!(
            f,
            "event store, distance refinement {distance}, listing limit {}",
            self.discovery.listing_limit
        )
    }
}
