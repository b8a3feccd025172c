use serde::{Deserialize, Serialize};
use std::fmt;

/// The SQL backend a deployment talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    #[default]
    MySql,
    Sqlite,
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbKind::MySql => write!(f, "MySQL"),
            DbKind::Sqlite => write!(f, "SQLite"),
        }
    }
}
