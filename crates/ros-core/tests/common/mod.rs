//! Test doubles and common utilities for reconciliation contract tests
//!
//! The in-memory device does the heavy lifting; the doubles here count
//! calls and inject failures around it.

#![allow(dead_code)]

use ros_core::codec::duration;
use ros_core::engine::{EngineEvent, Reconciler};
use ros_core::error::{Error, Result};
use ros_core::model::{Instance, Record};
use ros_core::traits::{Operation, Request, Transport};
use ros_core::{EngineConfig, MemoryTransport, SchemaRegistry};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

pub const SCHEDULER: &str = "system_scheduler";
pub const VLAN: &str = "interface_vlan";
pub const FIREWALL: &str = "ip_firewall_filter";

pub const SCHEDULER_PATH: &str = "/system/scheduler";
pub const FIREWALL_PATH: &str = "/ip/firewall/filter";

/// Rewrite durations the way RouterOS prints them (`3600s` → `1h`)
fn canonical_duration(raw: &str) -> String {
    duration::parse(raw)
        .map(duration::format)
        .unwrap_or_else(|_| raw.to_string())
}

/// A device with computed defaults and RouterOS-style duration echo
pub fn device() -> MemoryTransport {
    MemoryTransport::with_builtin_defaults().with_canonical(
        SCHEDULER_PATH,
        "interval",
        canonical_duration,
    )
}

/// Engine over the built-in kinds talking to `transport`
pub fn engine_with(transport: impl Transport + 'static) -> (Reconciler, mpsc::Receiver<EngineEvent>) {
    Reconciler::with_builtin_schemas(Box::new(transport), EngineConfig::default())
        .expect("engine construction succeeds")
}

/// Engine over the built-in kinds talking to a clone of `device`
pub fn engine(device: &MemoryTransport) -> (Reconciler, mpsc::Receiver<EngineEvent>) {
    engine_with(device.clone())
}

/// Engine that plans but never writes
pub fn dry_run_engine(device: &MemoryTransport) -> (Reconciler, mpsc::Receiver<EngineEvent>) {
    let config = EngineConfig {
        dry_run: true,
        ..EngineConfig::default()
    };
    Reconciler::with_builtin_schemas(Box::new(device.clone()), config)
        .expect("engine construction succeeds")
}

/// Engine over a custom schema registry
pub fn engine_for(
    device: &MemoryTransport,
    schemas: SchemaRegistry,
) -> (Reconciler, mpsc::Receiver<EngineEvent>) {
    Reconciler::new(
        Box::new(device.clone()),
        Arc::new(schemas),
        EngineConfig::default(),
    )
    .expect("engine construction succeeds")
}

/// Desired scheduler job
pub fn scheduler(name: &str) -> Instance {
    Instance::new()
        .with("name", name)
        .with("on_event", "myscript")
        .with("interval", "3600s")
}

/// Build a wire record from pairs
pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Collect every event emitted so far
pub fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A transport that counts calls and delegates to a device
pub struct CountingTransport {
    inner: MemoryTransport,
    calls: Arc<AtomicUsize>,
}

impl CountingTransport {
    pub fn new(inner: MemoryTransport) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new transport sharing counters with `other`
    pub fn sharing_counters_with(other: &Arc<Self>) -> Self {
        Self {
            inner: other.inner.clone(),
            calls: other.calls.clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for CountingTransport {
    async fn execute(&self, request: &Request) -> Result<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(request).await
    }

    fn transport_name(&self) -> &'static str {
        "counting"
    }
}

/// A transport that fails every command of one operation kind
pub struct FailingTransport {
    inner: MemoryTransport,
    fail_on: Operation,
    message: &'static str,
    removes_target: bool,
    calls: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl FailingTransport {
    pub fn new(inner: MemoryTransport, fail_on: Operation, message: &'static str) -> Self {
        Self {
            inner,
            fail_on,
            message,
            removes_target: false,
            calls: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delete the addressed item from the device before failing, as if it
    /// was removed out of band just ahead of the command
    pub fn removing_target(mut self) -> Self {
        self.removes_target = true;
        self
    }

    /// Create a new transport sharing counters with `other`
    pub fn sharing_counters_with(other: &Arc<Self>) -> Self {
        Self {
            inner: other.inner.clone(),
            fail_on: other.fail_on,
            message: other.message,
            removes_target: other.removes_target,
            calls: other.calls.clone(),
            failures: other.failures.clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for FailingTransport {
    async fn execute(&self, request: &Request) -> Result<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.operation == self.fail_on {
            self.failures.fetch_add(1, Ordering::SeqCst);
            if self.removes_target
                && let Some(id) = request.params.get(".id")
            {
                self.inner.purge(&request.path, id).await;
            }
            return Err(Error::Other(self.message.to_string()));
        }
        self.inner.execute(request).await
    }

    fn transport_name(&self) -> &'static str {
        "failing"
    }
}
