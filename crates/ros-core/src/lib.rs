// # ros-core
//
// Core library for declarative RouterOS configuration.
//
// ## Architecture Overview
//
// This library turns a desired-state description of device settings into
// the minimal set of commands that make the live device match:
// - **SchemaRegistry**: Declarative description of every resource kind
// - **codec**: Typed instances ↔ flat wire records
// - **identity**: Natural keys and device-assigned `.id` resolution
// - **Reconciler**: Plans and executes create/update/move/delete
// - **Transport**: Trait for executing one command against a device
// - **TransportRegistry**: Plugin-based registry for transports
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine owns diffing, transports own framing
// 2. **Plugin-Based**: Transports are registered dynamically, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: A second reconciliation of unchanged state issues no writes
// 5. **No Hidden Retries**: Failures surface to the caller with context

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use config::{ClientConfig, EngineConfig, TransportConfig};
pub use engine::{EngineEvent, Outcome, Plan, Reconciler};
pub use error::{Error, Result};
pub use identity::Identity;
pub use manifest::{Manifest, ManifestEntry};
pub use model::{FilterSet, Instance, Record, Value};
pub use registry::TransportRegistry;
pub use schema::{ResourceSchema, SchemaRegistry};
pub use traits::{Operation, Request, Transport};
pub use transport::MemoryTransport;
