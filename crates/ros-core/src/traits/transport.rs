// # Transport Trait
//
// Defines the interface the engine uses to talk to a device.
//
// ## Implementations
//
// - REST API: `ros-transport-rest` crate
// - In-memory device: `ros_core::transport::MemoryTransport`
//
// ## Usage
//
// ```rust,ignore
// use ros_core::traits::{Operation, Request, Transport};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let transport = /* Transport implementation */;
//
//     let records = transport
//         .execute(&Request::read("/system/scheduler").filter("name", "sched1"))
//         .await?;
//
//     Ok(())
// }
// ```

use crate::model::{Filter, FilterSet, Record};
use async_trait::async_trait;
use std::fmt;

/// Remote operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List items, optionally filtered
    Read,
    /// Create an item; the response carries its `.id`
    Add,
    /// Change fields of an item addressed by `.id`
    Set,
    /// Delete an item addressed by `.id`
    Remove,
    /// Reposition an item in an ordered list
    Move,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Add => "add",
            Operation::Set => "set",
            Operation::Remove => "remove",
            Operation::Move => "move",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key carrying the new `.id` in an `add` reply that holds nothing else
pub const RET_KEY: &str = "ret";

/// Parameter naming the item a `move` repositions
pub const MOVE_NUMBERS: &str = "numbers";

/// Parameter naming the item a `move` places the target before
pub const MOVE_DESTINATION: &str = "destination";

/// One command against the device
///
/// Keys in `params` and `filters` are wire keys. For `set` and `remove`
/// the target travels as the `.id` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub operation: Operation,
    pub path: String,
    pub params: Record,
    pub filters: FilterSet,
}

impl Request {
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self {
            operation,
            path: path.into(),
            params: Record::new(),
            filters: FilterSet::new(),
        }
    }

    pub fn read(path: impl Into<String>) -> Self {
        Self::new(Operation::Read, path)
    }

    /// Builder-style parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Builder-style parameter block
    pub fn params(mut self, params: Record) -> Self {
        self.params.extend(params);
        self
    }

    /// Builder-style read constraint
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::new(key, value));
        self
    }

    /// Builder-style constraint block
    pub fn filters(mut self, filters: &FilterSet) -> Self {
        for f in filters.iter() {
            self.filters.push(f.clone());
        }
        self
    }
}

/// Trait for transport adapter implementations
///
/// A transport executes exactly one command per call and reports what the
/// device returned. It knows nothing about schemas, identities or diffing.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Responsibilities
/// - ✅ Frame and send a single command, parse the reply into records
/// - ✅ Surface device failures as errors carrying the device's message
/// - ✅ Enforce its own timeout
///
/// ## Not Responsibilities
/// - ❌ Retrying (the caller decides; `add` retries can duplicate items)
/// - ❌ Deciding whether a write is needed (owned by the engine)
/// - ❌ Caching device state between calls
///
/// Errors whose message contains "no such item" are translated by the
/// engine into `Error::NotFound`; transports may also return
/// `Error::NotFound` directly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one command
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: Records returned by the device. `read` returns
    ///   matching items; `add` returns at least the new `.id` (as `.id` or
    ///   `ret`); `set`, `remove` and `move` may return nothing.
    /// - `Err(Error)`: If the device or the connection reported a failure
    async fn execute(&self, request: &Request) -> Result<Vec<Record>, crate::Error>;

    /// Transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait TransportFactory: Send + Sync {
    /// Create a Transport instance from configuration
    fn create(
        &self,
        config: &crate::config::TransportConfig,
    ) -> Result<Box<dyn Transport>, crate::Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: &Request) -> Result<Vec<Record>, crate::Error> {
        (**self).execute(request).await
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: &Request) -> Result<Vec<Record>, crate::Error> {
        (**self).execute(request).await
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
