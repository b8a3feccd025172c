use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use core_types::DbKind;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{DatabaseSettings, LogSettings, ServerSettings, Settings};

/// Loads the application configuration from `app.toml` and the environment.
///
/// The file is optional. Environment variables prefixed with `APP_` override it,
/// with `__` separating nested keys (e.g. `APP_DATABASE__HOST`).
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("app")
}

/// Same as [`load_config`] but reads the given file (with or without extension).
pub fn load_config_from(name: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(name).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    finish(builder)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings = builder.build()?.try_deserialize::<Settings>()?;
    validate(&settings)?;
    Ok(settings)
}

/// Rejects settings that cannot produce a working connection.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let db = &settings.database;
    let missing = |what: &str| ConfigError::ValidationError(format!("database.{what} is required"));

    match db.kind {
        DbKind::MySql => {
            if db.host.is_empty() {
                return Err(missing("host"));
            }
            if db.name.is_empty() {
                return Err(missing("name"));
            }
            if db.user.is_empty() {
                return Err(missing("user"));
            }
            if db.password.is_empty() && settings.is_production() {
                return Err(missing("password"));
            }
        }
        DbKind::Sqlite => {
            if db.url.is_none() && db.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "database.url or database.name is required for sqlite".to_string(),
                ));
            }
        }
    }

    if db.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    Ok(())
}
