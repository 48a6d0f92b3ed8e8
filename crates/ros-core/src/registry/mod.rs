//! Plugin-based transport registry
//!
//! The registry allows transports to be registered dynamically at runtime,
//! avoiding hardcoded if-else chains in the binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ros_core::registry::TransportRegistry;
//! use ros_core::config::TransportConfig;
//!
//! // Registry with the in-memory device already registered
//! let registry = TransportRegistry::with_builtin();
//!
//! // Register the REST adapter
//! ros_transport_rest::register(&registry);
//!
//! // Create transport from config
//! let transport = registry.create_transport(&TransportConfig::Memory)?;
//! ```
//!
//! ## Registration
//!
//! Adapter crates register themselves during initialization:
//!
//! ```rust,ignore
//! // In ros-transport-rest crate
//! pub fn register(registry: &TransportRegistry) {
//!     registry.register_transport("rest", Box::new(RestTransportFactory));
//! }
//! ```

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::traits::{Transport, TransportFactory};
use crate::transport::MemoryTransportFactory;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

/// Transport registry for plugin-based transport creation
///
/// Maps transport type names to factory objects.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct TransportRegistry {
    transports: RwLock<HashMap<String, Box<dyn TransportFactory>>>,
}

impl TransportRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the transports shipped in this crate (`memory`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_transport("memory", Box::new(MemoryTransportFactory));
        registry
    }

    /// Register a transport factory
    ///
    /// # Parameters
    ///
    /// - `name`: Transport type name (e.g., "rest", "memory")
    /// - `factory`: Factory object for creating transport instances
    pub fn register_transport(&self, name: impl Into<String>, factory: Box<dyn TransportFactory>) {
        let mut transports = self
            .transports
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transports.insert(name.into(), factory);
    }

    /// Create a transport from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Transport>)`: Created transport instance
    /// - `Err(Error)`: If the transport type is not registered or creation fails
    pub fn create_transport(&self, config: &TransportConfig) -> Result<Box<dyn Transport>> {
        let transport_type = config.type_name();
        let transports = self.read();

        let factory = transports.get(transport_type).ok_or_else(|| {
            Error::config(format!("Unknown transport type: {}", transport_type))
        })?;

        factory.create(config)
    }

    /// List all registered transport types
    pub fn list_transports(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a transport type is registered
    pub fn has_transport(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Box<dyn TransportFactory>>> {
        self.transports
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
