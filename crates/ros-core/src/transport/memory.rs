// # Memory Transport
//
// In-memory simulation of a list-based RouterOS device.
//
// ## Purpose
//
// Executes the same commands as a real router against ordered tables held
// in memory. Useful for testing, for dry runs without a router, and for
// exercising placement logic deterministically.
//
// ## Device Behaviour
//
// - Every path is an ordered list of records
// - `add` assigns `.id` values `*1`, `*2`, ... (hexadecimal, never reused)
//   and answers with `ret=<id>` only
// - `add` honours `place-before=<id>`
// - `set`, `remove` and `move` address items by `.id` and fail with
//   "no such item" when it does not exist
// - Computed properties registered per path are merged on `add`
// - Values may be canonicalised on store (e.g. `3600s` stored as `1h`)
//
// ## Crash Behavior
//
// - All state is lost on restart/crash

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;
use tracing::debug;

use crate::codec::{self, ID_KEY};
use crate::config::TransportConfig;
use crate::model::Record;
use crate::traits::{
    MOVE_DESTINATION, MOVE_NUMBERS, Operation, RET_KEY, Request, Transport, TransportFactory,
};
use crate::Error;

/// Parameter positioning a new item before an existing `.id`
pub const PLACE_BEFORE_PARAM: &str = "place-before";

/// Value rewrite applied when the device stores a property
pub type Canonicalizer = fn(&str) -> String;

#[derive(Debug, Default)]
struct Device {
    tables: HashMap<String, Vec<Record>>,
    next_id: u64,
    requests: Vec<Request>,
}

impl Device {
    fn table(&mut self, path: &str) -> &mut Vec<Record> {
        self.tables.entry(path.to_string()).or_default()
    }

    fn position(&self, path: &str, id: &str) -> Option<usize> {
        self.tables
            .get(path)?
            .iter()
            .position(|r| r.get(ID_KEY).is_some_and(|v| v == id))
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("*{:X}", self.next_id)
    }
}

/// In-memory transport implementation
///
/// Clones share the same device state.
///
/// # Example
///
/// ```rust,no_run
/// use ros_core::transport::MemoryTransport;
/// use ros_core::traits::{Operation, Request, Transport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let device = MemoryTransport::new();
///
///     let reply = device
///         .execute(&Request::new(Operation::Add, "/system/scheduler").param("name", "s1"))
///         .await?;
///     assert_eq!(reply[0]["ret"], "*1");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<RwLock<Device>>,
    computed: HashMap<String, Record>,
    canonical: HashMap<(String, String), Canonicalizer>,
}

impl MemoryTransport {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that fills the computed properties of the built-in
    /// resource kinds the way a router does
    pub fn with_builtin_defaults() -> Self {
        Self::new()
            .with_computed_defaults(
                "/system/scheduler",
                record(&[
                    ("owner", "admin"),
                    ("run-count", "0"),
                    ("next-run", "jan/01/1970 00:00:00"),
                ]),
            )
            .with_computed_defaults(
                "/interface/vlan",
                record(&[
                    ("running", "true"),
                    ("actual-mtu", "1500"),
                    ("l2mtu", "1594"),
                    ("mac-address", "00:00:00:00:00:00"),
                ]),
            )
            .with_computed_defaults(
                "/ip/firewall/filter",
                record(&[
                    ("bytes", "0"),
                    ("packets", "0"),
                    ("dynamic", "false"),
                    ("invalid", "false"),
                ]),
            )
    }

    /// Register properties the device fills on `add` when not supplied
    pub fn with_computed_defaults(mut self, path: impl Into<String>, defaults: Record) -> Self {
        self.computed.entry(path.into()).or_default().extend(defaults);
        self
    }

    /// Register a rewrite the device applies when storing `key` under `path`
    pub fn with_canonical(
        mut self,
        path: impl Into<String>,
        key: impl Into<String>,
        rewrite: Canonicalizer,
    ) -> Self {
        self.canonical.insert((path.into(), key.into()), rewrite);
        self
    }

    /// Insert a record directly, bypassing the command interface
    ///
    /// Simulates configuration made out of band. Returns the new `.id`.
    pub async fn seed(&self, path: &str, mut record: Record) -> String {
        let mut device = self.inner.write().await;
        let id = device.allocate_id();
        record.insert(ID_KEY.to_string(), id.clone());
        device.table(path).push(record);
        id
    }

    /// Change a property directly, bypassing the command interface
    pub async fn poke(&self, path: &str, id: &str, key: &str, value: &str) -> bool {
        let mut device = self.inner.write().await;
        let Some(pos) = device.position(path, id) else {
            return false;
        };
        device.table(path)[pos].insert(key.to_string(), value.to_string());
        true
    }

    /// Delete a record directly, bypassing the command interface
    pub async fn purge(&self, path: &str, id: &str) -> bool {
        let mut device = self.inner.write().await;
        let Some(pos) = device.position(path, id) else {
            return false;
        };
        device.table(path).remove(pos);
        true
    }

    /// Snapshot of the records under `path`, in list order
    pub async fn records(&self, path: &str) -> Vec<Record> {
        let device = self.inner.read().await;
        device.tables.get(path).cloned().unwrap_or_default()
    }

    /// Every command executed so far
    pub async fn requests(&self) -> Vec<Request> {
        self.inner.read().await.requests.clone()
    }

    /// Number of commands executed so far
    pub async fn request_count(&self) -> usize {
        self.inner.read().await.requests.len()
    }

    /// Number of commands of one operation kind executed so far
    pub async fn count(&self, operation: Operation) -> usize {
        self.inner
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Number of write commands executed so far
    pub async fn write_count(&self) -> usize {
        self.inner
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.operation != Operation::Read)
            .count()
    }

    fn canonicalize(&self, path: &str, key: &str, value: &str) -> String {
        match self.canonical.get(&(path.to_string(), key.to_string())) {
            Some(rewrite) => rewrite(value),
            None => value.to_string(),
        }
    }

    fn no_such_item(request: &Request) -> Error {
        Error::transport(request.operation.as_str(), &request.path, "no such item")
    }

    fn target<'a>(request: &'a Request, key: &str) -> Result<&'a str, Error> {
        request.params.get(key).map(String::as_str).ok_or_else(|| {
            Error::transport(
                request.operation.as_str(),
                &request.path,
                format!("missing parameter {}", key),
            )
        })
    }

    fn add(&self, device: &mut Device, request: &Request) -> Result<Vec<Record>, Error> {
        let before = match request.params.get(PLACE_BEFORE_PARAM) {
            Some(id) => Some(
                device
                    .position(&request.path, id)
                    .ok_or_else(|| Self::no_such_item(request))?,
            ),
            None => None,
        };

        let mut record = self.computed.get(&request.path).cloned().unwrap_or_default();
        for (key, value) in &request.params {
            if key == PLACE_BEFORE_PARAM || key == ID_KEY {
                continue;
            }
            record.insert(key.clone(), self.canonicalize(&request.path, key, value));
        }

        let id = device.allocate_id();
        record.insert(ID_KEY.to_string(), id.clone());

        let table = device.table(&request.path);
        match before {
            Some(pos) => table.insert(pos, record),
            None => table.push(record),
        }

        debug!("memory: added {} at {}", id, request.path);
        Ok(vec![Record::from([(RET_KEY.to_string(), id)])])
    }

    fn set(&self, device: &mut Device, request: &Request) -> Result<Vec<Record>, Error> {
        let id = Self::target(request, ID_KEY)?;
        let pos = device
            .position(&request.path, id)
            .ok_or_else(|| Self::no_such_item(request))?;

        let updates: Vec<(String, String)> = request
            .params
            .iter()
            .filter(|(key, _)| key.as_str() != ID_KEY)
            .map(|(key, value)| (key.clone(), self.canonicalize(&request.path, key, value)))
            .collect();

        let record = &mut device.table(&request.path)[pos];
        for (key, value) in updates {
            record.insert(key, value);
        }

        debug!("memory: set {} at {}", id, request.path);
        Ok(Vec::new())
    }

    fn remove(device: &mut Device, request: &Request) -> Result<Vec<Record>, Error> {
        let id = Self::target(request, ID_KEY)?;
        let pos = device
            .position(&request.path, id)
            .ok_or_else(|| Self::no_such_item(request))?;

        device.table(&request.path).remove(pos);

        debug!("memory: removed {} at {}", id, request.path);
        Ok(Vec::new())
    }

    fn relocate(device: &mut Device, request: &Request) -> Result<Vec<Record>, Error> {
        let id = Self::target(request, MOVE_NUMBERS)?;
        let from = device
            .position(&request.path, id)
            .ok_or_else(|| Self::no_such_item(request))?;

        if let Some(destination) = request.params.get(MOVE_DESTINATION) {
            device
                .position(&request.path, destination)
                .ok_or_else(|| Self::no_such_item(request))?;
        }

        let table = device.table(&request.path);
        let item = table.remove(from);
        let to = request
            .params
            .get(MOVE_DESTINATION)
            .and_then(|destination| {
                table
                    .iter()
                    .position(|r| r.get(ID_KEY).is_some_and(|v| v == destination))
            })
            .unwrap_or(table.len());
        table.insert(to, item);

        debug!("memory: moved {} to position {} at {}", id, to, request.path);
        Ok(Vec::new())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn execute(&self, request: &Request) -> Result<Vec<Record>, Error> {
        let mut device = self.inner.write().await;
        device.requests.push(request.clone());

        match request.operation {
            Operation::Read => Ok(device
                .tables
                .get(&request.path)
                .map(|table| {
                    table
                        .iter()
                        .filter(|r| request.filters.matches(r))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()),
            Operation::Add => self.add(&mut device, request),
            Operation::Set => self.set(&mut device, request),
            Operation::Remove => Self::remove(&mut device, request),
            Operation::Move => Self::relocate(&mut device, request),
        }
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for the in-memory transport
pub struct MemoryTransportFactory;

impl TransportFactory for MemoryTransportFactory {
    fn create(&self, config: &TransportConfig) -> Result<Box<dyn Transport>, Error> {
        match config {
            TransportConfig::Memory => Ok(Box::new(MemoryTransport::with_builtin_defaults())),
            _ => Err(Error::config("Invalid config for memory transport")),
        }
    }
}

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (codec::wire_key(k), v.to_string()))
        .collect()
}
