use core_types::DbKind;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Deployment environment name. `production` tightens validation.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// Contains parameters for the HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Reject requests that carry no `Authorization` header.
    pub use_auth: bool,
}

/// Contains parameters for the database connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    /// Schema name for MySQL, file path for SQLite.
    pub name: String,
    pub user: String,
    pub password: String,
    /// Full connection URL. Only consulted for SQLite.
    pub url: Option<String>,
    /// Fixed timeout applied when establishing connections.
    pub connect_timeout_secs: u64,
    pub max_connections: u32,
}

/// Contains parameters for log output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

fn default_environment() -> String {
    "local".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            use_auth: false,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            kind: DbKind::MySql,
            host: String::new(),
            port: 3306,
            name: String::new(),
            user: String::new(),
            password: String::new(),
            url: None,
            connect_timeout_secs: 10,
            max_connections: 10,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl DatabaseSettings {
    /// The SQLite connection URL: `url` if given, otherwise `name` as a file path.
    pub fn sqlite_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", self.name),
        }
    }
}
