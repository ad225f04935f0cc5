//! Module configuration

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the connection pool size.
pub const MAX_POOL_SIZE: usize = 1024;

/// Configuration for one authorization module instance.
///
/// Every field has a default, so a partial configuration document
/// deserializes cleanly; call [`ModuleConfig::validate`] before constructing
/// the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Document store hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Document store port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database holding the `users` and `groups` collections
    #[serde(default = "default_database")]
    pub database: String,

    /// Fixed connection pool size (1..=1024)
    #[serde(default = "default_num_connections")]
    pub num_connections: usize,

    /// Whether group membership is expanded by default, rather than gated on
    /// a `Fall-Through` attribute in the user's reply records
    #[serde(default = "default_read_groups")]
    pub read_groups: bool,
}

fn default_hostname() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    27017
}

fn default_database() -> String {
    "radius".to_string()
}

fn default_num_connections() -> usize {
    10
}

fn default_read_groups() -> bool {
    true
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            database: default_database(),
            num_connections: default_num_connections(),
            read_groups: default_read_groups(),
        }
    }
}

impl ModuleConfig {
    /// Validate configuration values before the pool is built.
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(AuthzError::InvalidConfig(
                "database name must not be empty".to_string(),
            ));
        }
        if self.num_connections == 0 || self.num_connections > MAX_POOL_SIZE {
            return Err(AuthzError::InvalidConfig(format!(
                "num_connections must be within 1..={} (got {})",
                MAX_POOL_SIZE, self.num_connections
            )));
        }
        Ok(())
    }

    /// Collection holding per-user policy records.
    pub fn users_collection(&self) -> String {
        format!("{}.users", self.database)
    }

    /// Collection holding per-group policy records.
    pub fn groups_collection(&self) -> String {
        format!("{}.groups", self.database)
    }
}
