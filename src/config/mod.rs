//! Builds the `AppConfig` from config files and the process environment.
//! Layering (later wins):
//! - `config/base.toml`
//! - `config/{environment}.toml`, picked by `APP_ENVIRONMENT`
//! - `APP_*` env variables, `__` separates nested keys
//! - `SUPABASE_URL` / `SUPABASE_SERVICE_ROLE_KEY` for the REST store
//! - `DATABASE_URL` for the Postgres store

mod error;
mod types;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, DbConfig, Environment, NetConfig, RestConfig, SslRequire, StoreConfig};

impl AppConfig {
    /// Loads the configuration from the `config` directory in the current working directory.
    pub fn load() -> ConfigResult<Self> {
        let config_dir = std::env::current_dir()?.join("config");
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;

        Self::load_from(&config_dir, environment)
    }

    pub fn load_from(config_dir: &Path, environment: Environment) -> ConfigResult<Self> {
        info!(
            "{:<20} - Loading '{}' configuration",
            "AppConfig::load",
            environment.as_ref()
        );
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut config: AppConfig = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().filter_map(|key| {
                if key == "SUPABASE_URL" {
                    Some("store_config.url".into())
                } else if key == "SUPABASE_SERVICE_ROLE_KEY" {
                    Some("store_config.service_key".into())
                } else {
                    None
                }
            }))
            .extract()?;

        if let StoreConfig::Postgres(db_config) = &mut config.store_config {
            if let Ok(db_url) = std::env::var("DATABASE_URL") {
                let run_migrations = db_config.run_migrations;
                *db_config = DbConfig::try_from(db_url.as_str())?;
                db_config.run_migrations = run_migrations;
            }
        }

        Ok(config)
    }
}
