//! Output configuration.
//!
//! These structures carry the values the pipeline hands to the store output.
//! Key names match the pipeline's configuration files, e.g.
//!
//! ```json
//! {
//!   "connection": "master-1:7051,master-2:7051",
//!   "table.name": "impala::default.orders",
//!   "ignore.missing.columns": true,
//!   "apply.timeout": "30s"
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONNECTION_CONFIG_NAME, IS_SECURE_CONFIG_NAME, KERBEROS_PREFIX, TABLE_CONFIG_NAME,
};

/// Configuration of one store output.
///
/// # Example
///
/// ```rust
/// use colbridge_common::config::OutputConfig;
///
/// let config = OutputConfig::new("localhost:7051", "orders").ignore_missing_columns(true);
/// assert!(config.validate().is_ok());
/// assert!(!config.insert_ignore);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Connection identifier of the remote store.
    pub connection: String,

    /// Target table name.
    #[serde(rename = "table.name")]
    pub table_name: String,

    /// Bulk inserts ignore rows whose key already exists.
    /// Default: false
    #[serde(rename = "insert.ignore", default)]
    pub insert_ignore: bool,

    /// Planned fields without a matching table column are dropped.
    /// Default: false
    #[serde(rename = "ignore.missing.columns", default)]
    pub ignore_missing_columns: bool,

    /// The store connection is secured and needs delegation tokens.
    /// Default: false
    #[serde(default)]
    pub secure: bool,

    /// Kerberos settings, used when `secure` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kerberos: Option<KerberosConfig>,

    /// Upper bound on waiting for a session to drain after a batch apply.
    /// Default: unbounded
    #[serde(
        rename = "apply.timeout",
        default,
        with = "humantime_serde_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_timeout: Option<Duration>,
}

impl OutputConfig {
    /// Creates a configuration with the mandatory values and defaults elsewhere.
    pub fn new(connection: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            table_name: table_name.into(),
            insert_ignore: false,
            ignore_missing_columns: false,
            secure: false,
            kerberos: None,
            apply_timeout: None,
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the insert-ignore flag.
    pub fn insert_ignore(mut self, enabled: bool) -> Self {
        self.insert_ignore = enabled;
        self
    }

    /// Sets the ignore-missing-columns flag.
    pub fn ignore_missing_columns(mut self, enabled: bool) -> Self {
        self.ignore_missing_columns = enabled;
        self
    }

    /// Marks the connection as secure with the given Kerberos settings.
    pub fn secure(mut self, kerberos: KerberosConfig) -> Self {
        self.secure = true;
        self.kerberos = Some(kerberos);
        self
    }

    /// Sets the apply timeout.
    pub fn apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = Some(timeout);
        self
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.connection.trim().is_empty() {
            return Err(format!("'{}' must not be empty", CONNECTION_CONFIG_NAME));
        }

        if self.table_name.trim().is_empty() {
            return Err(format!("'{}' must not be empty", TABLE_CONFIG_NAME));
        }

        if let Some(timeout) = self.apply_timeout {
            if timeout.is_zero() {
                return Err("'apply.timeout' must be greater than zero".to_string());
            }
        }

        match &self.kerberos {
            Some(kerberos) => kerberos.validate()?,
            None if self.secure => {
                return Err(format!(
                    "'{}' requires a '{}' section",
                    IS_SECURE_CONFIG_NAME, KERBEROS_PREFIX
                ));
            }
            None => {}
        }

        Ok(())
    }
}

/// Kerberos sub-configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerberosConfig {
    /// Principal to log in as.
    #[serde(default)]
    pub principal: Option<String>,

    /// Keytab holding the principal's key.
    #[serde(default)]
    pub keytab: Option<PathBuf>,

    /// Use the ambient ticket cache instead of a keytab login.
    /// Default: false
    #[serde(rename = "use.ticket.cache", default)]
    pub use_ticket_cache: bool,
}

impl KerberosConfig {
    /// Creates a keytab-based configuration.
    pub fn with_keytab(principal: impl Into<String>, keytab: impl Into<PathBuf>) -> Self {
        Self {
            principal: Some(principal.into()),
            keytab: Some(keytab.into()),
            use_ticket_cache: false,
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.use_ticket_cache {
            return Ok(());
        }

        match (&self.principal, &self.keytab) {
            (Some(_), Some(_)) => Ok(()),
            (Some(_), None) => Err(format!("'{}.keytab' must be set with a principal", KERBEROS_PREFIX)),
            (None, Some(_)) => Err(format!("'{}.principal' must be set with a keytab", KERBEROS_PREFIX)),
            (None, None) => Err(format!(
                "'{}' needs a principal and keytab, or 'use.ticket.cache'",
                KERBEROS_PREFIX
            )),
        }
    }
}

/// Serde helper for optional Duration using humantime format.
mod humantime_serde_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| humantime::format_duration(d).to_string())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
