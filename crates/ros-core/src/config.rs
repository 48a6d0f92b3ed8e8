//! Configuration types for the reconciliation client
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Transport configuration
    pub transport: TransportConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.transport.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Transport configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// RouterOS REST API (`https://<router>/rest/...`)
    Rest {
        /// Base URL of the router, without the `/rest` suffix
        url: String,
        /// API user
        username: String,
        /// API password
        password: String,
        /// Accept self-signed certificates
        #[serde(default)]
        insecure: bool,
    },

    /// In-memory simulated device (not persistent)
    #[default]
    Memory,

    /// Custom transport
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl TransportConfig {
    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            TransportConfig::Rest { url, username, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("REST transport URL cannot be empty"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "REST transport URL must start with http:// or https://, got {}",
                        url
                    )));
                }
                if username.is_empty() {
                    return Err(crate::Error::config("REST transport username cannot be empty"));
                }
                Ok(())
            }
            TransportConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom transport factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom transport config cannot be null",
                    ));
                }
                Ok(())
            }
            TransportConfig::Memory => Ok(()),
        }
    }

    /// Get the transport type name
    pub fn type_name(&self) -> &str {
        match self {
            TransportConfig::Rest { .. } => "rest",
            TransportConfig::Memory => "memory",
            TransportConfig::Custom { factory, .. } => factory,
        }
    }
}

// Manual Debug implementation to redact the password
impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportConfig::Rest {
                url,
                username,
                insecure,
                ..
            } => f
                .debug_struct("Rest")
                .field("url", url)
                .field("username", username)
                .field("password", &"<REDACTED>")
                .field("insecure", insecure)
                .finish(),
            TransportConfig::Memory => f.write_str("Memory"),
            TransportConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Plan only, never write to the device
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
