//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Validating desired state before any remote call
//! - Reading the device and resolving identities
//! - Planning the minimal set of commands (create, update, move, delete)
//! - Executing them through the Transport, one command per planned action
//! - Verifying the result (device-assigned identity, computed fields)
//!
//! ## Architecture
//!
//! ```text
//!   desired Instance
//!          │
//!          ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │    Reconciler    │◄──────►│  SchemaRegistry  │
//! │                  │        │  (immutable)     │
//! └──────────────────┘        └──────────────────┘
//!          │
//!          ├──────────────────────────┐
//!          ▼                          ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │    Transport     │        │      Events      │
//! │ (read/add/set/…) │        │     (notify)     │
//! └──────────────────┘        └──────────────────┘
//! ```
//!
//! ## Call Lifecycle
//!
//! Every public operation runs `Planning → Executing → Verifying → Done`;
//! `Failed` is reachable from any phase. Transitions are logged at debug
//! level and failures are reported as [`EngineEvent::Failed`].
//!
//! ## Failure Policy
//!
//! Nothing is retried. A device "no such item" answer becomes
//! [`Error::NotFound`]; every other failure propagates annotated with the
//! operation and resource kind. Retrying a failed `add` can create a
//! duplicate item, so that decision is left to the caller.

pub mod diff;
pub mod plan;

pub use diff::FieldChange;
pub use plan::{Action, Current, Plan};

use crate::codec::{self, ID_KEY};
use crate::config::EngineConfig;
use crate::error::{is_no_such_item, Error, Result};
use crate::identity::{self, IdKind, Identity};
use crate::model::{FilterSet, Instance, Record};
use crate::schema::{ResourceSchema, SchemaRegistry};
use crate::traits::{MOVE_DESTINATION, MOVE_NUMBERS, Operation, RET_KEY, Request, Transport};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Phase of a single engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Executing,
    Verifying,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Executing => "executing",
            Phase::Verifying => "verifying",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A plan was computed
    Planned {
        resource: String,
        identity: Option<Identity>,
        plan: String,
    },

    /// A plan was executed and verified
    Applied {
        resource: String,
        identity: Option<Identity>,
        plan: String,
    },

    /// The device already matched the desired state
    Unchanged {
        resource: String,
        identity: Option<Identity>,
    },

    /// The addressed item no longer exists on the device
    DriftDetected {
        resource: String,
        identity: Identity,
    },

    /// A call failed
    Failed {
        resource: String,
        operation: String,
        phase: Phase,
        error: String,
    },
}

/// Result of [`Reconciler::reconcile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The plan that was (or, in dry-run mode, would have been) executed
    pub plan: Plan,

    /// Device state after the call; `None` when nothing exists (deleted,
    /// or a dry-run create)
    pub instance: Option<Instance>,

    /// Whether any write was issued
    pub applied: bool,
}

/// What the device reported for an addressed item
struct Observed {
    list: Vec<Record>,
    index: usize,
}

impl Observed {
    fn record(&self) -> &Record {
        &self.list[self.index]
    }

    fn current(&self) -> Current<'_> {
        Current {
            record: self.record(),
            list: &self.list,
        }
    }

    fn id(&self, schema: &ResourceSchema) -> Result<String> {
        self.record()
            .get(ID_KEY)
            .cloned()
            .ok_or_else(|| Error::decode(schema.name(), ID_KEY, "", "record carries no .id"))
    }
}

/// Phase tracker for one call
struct Call<'a> {
    operation: &'static str,
    resource: &'a str,
    phase: Phase,
}

impl<'a> Call<'a> {
    fn start(operation: &'static str, resource: &'a str) -> Self {
        debug!("{} {}: {}", operation, resource, Phase::Planning);
        Self {
            operation,
            resource,
            phase: Phase::Planning,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(
            "{} {}: {} -> {}",
            self.operation, self.resource, self.phase, phase
        );
        self.phase = phase;
    }
}

/// Generic CRUD reconciliation engine
///
/// One Reconciler serves every resource kind in its schema registry.
///
/// ## Threading
///
/// All operations take `&self` and keep no state between calls, so one
/// instance can serve concurrent calls for different resource instances.
/// Concurrent calls for the same instance are not serialised.
pub struct Reconciler {
    /// Device access
    transport: Box<dyn Transport>,

    /// Resource schemas
    schemas: Arc<SchemaRegistry>,

    /// Plan only, never write
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Reconciler {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `transport`: Transport implementation
    /// - `schemas`: Resource schemas the engine can reconcile
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        transport: Box<dyn Transport>,
        schemas: Arc<SchemaRegistry>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            transport,
            schemas,
            dry_run: config.dry_run,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Create an engine over the built-in resource kinds
    pub fn with_builtin_schemas(
        transport: Box<dyn Transport>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        Self::new(transport, Arc::new(SchemaRegistry::builtin().clone()), config)
    }

    /// Schema introspection
    pub fn fields(&self, kind: &str) -> Result<&ResourceSchema> {
        self.schemas.fields(kind)
    }

    /// Diff-suppression hook: are two wire values of `kind.field` equal?
    pub fn suppress_diff(&self, kind: &str, field: &str, old: &str, new: &str) -> Result<bool> {
        Ok(self.schemas.define(kind)?.suppress_diff(field, old, new))
    }

    /// Create a new item
    ///
    /// Declared defaults are applied for omitted fields. The returned
    /// instance carries the identity and the computed fields the device
    /// assigned.
    pub async fn create(&self, kind: &str, desired: &Instance) -> Result<Instance> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("create", schema.name());
        let result = self.create_in(schema, desired, &mut call).await;
        self.finish(call, result)
    }

    /// Read one item
    ///
    /// # Returns
    ///
    /// - `Ok(Instance)`: The decoded item
    /// - `Err(Error::NotFound)`: If no item matches the identity and filters
    pub async fn read(
        &self,
        kind: &str,
        identity: &Identity,
        filters: &FilterSet,
    ) -> Result<Instance> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("read", schema.name());
        let result = self.read_in(schema, identity, filters, &mut call).await;
        self.finish(call, result)
    }

    /// Change an existing item
    ///
    /// `desired` may be partial; only the fields it holds are compared and
    /// only changed fields are sent. Returns the re-read item.
    pub async fn update(
        &self,
        kind: &str,
        identity: &Identity,
        desired: &Instance,
    ) -> Result<Instance> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("update", schema.name());
        let result = self.update_in(schema, identity, desired, &mut call).await;
        self.finish(call, result)
    }

    /// Remove an item
    ///
    /// Removing an item that does not exist is [`Error::NotFound`].
    pub async fn delete(&self, kind: &str, identity: &Identity) -> Result<()> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("delete", schema.name());
        let result = self.delete_in(schema, identity, &mut call).await;
        self.finish(call, result)
    }

    /// Bring the device in line with `desired`
    ///
    /// The item is addressed by `desired.identity`, or by its natural key
    /// field for keyed kinds. A missing item (including one removed out of
    /// band after it was observed) is created.
    pub async fn reconcile(&self, kind: &str, desired: &Instance) -> Result<Outcome> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("reconcile", schema.name());
        let result = self.reconcile_in(schema, desired, &mut call).await;
        self.finish(call, result)
    }

    /// Make sure the item addressed by `identity` does not exist
    pub async fn reconcile_absent(&self, kind: &str, identity: &Identity) -> Result<Outcome> {
        let schema = self.schemas.define(kind)?;
        let mut call = Call::start("reconcile", schema.name());
        let result = self.reconcile_absent_in(schema, identity, &mut call).await;
        self.finish(call, result)
    }

    async fn create_in(
        &self,
        schema: &ResourceSchema,
        desired: &Instance,
        call: &mut Call<'_>,
    ) -> Result<Instance> {
        schema.validate(desired)?;
        let params = codec::encode(&schema.with_defaults(desired), schema)?;

        call.enter(Phase::Executing);
        let reply = self
            .execute(schema, Request::new(Operation::Add, schema.path()).params(params))
            .await?;

        call.enter(Phase::Verifying);
        let instance = self.verify_created(schema, &reply).await?;
        info!("Created {} {}", schema.name(), display_identity(instance.identity.as_ref()));
        Ok(instance)
    }

    async fn read_in(
        &self,
        schema: &ResourceSchema,
        identity: &Identity,
        filters: &FilterSet,
        call: &mut Call<'_>,
    ) -> Result<Instance> {
        let mut request = Request::read(schema.path())
            .filters(&filters.map_keys(codec::wire_key));
        request.filters.push(identity::to_filter(schema, identity)?);

        call.enter(Phase::Executing);
        let records = self.execute(schema, request).await?;

        call.enter(Phase::Verifying);
        let record = identity::locate(schema, identity, &records)?;
        codec::decode(record, schema)
    }

    async fn update_in(
        &self,
        schema: &ResourceSchema,
        identity: &Identity,
        desired: &Instance,
        call: &mut Call<'_>,
    ) -> Result<Instance> {
        schema.validate_fields(desired)?;

        let filters = read_filters(schema, desired);
        let observed = self
            .observe(schema, identity, &filters)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} {}", schema.name(), identity)))?;

        let plan = plan::plan(schema, desired, Some(identity.clone()), Some(observed.current()))?;
        self.emit_planned(&plan);

        if plan.is_noop() {
            self.emit_unchanged(&plan);
            return codec::decode(observed.record(), schema);
        }

        call.enter(Phase::Executing);
        self.execute_plan(schema, &plan, desired, Some(&observed), call)
            .await
    }

    async fn delete_in(
        &self,
        schema: &ResourceSchema,
        identity: &Identity,
        call: &mut Call<'_>,
    ) -> Result<()> {
        let id = match identity {
            Identity::Id(id) => id.clone(),
            Identity::Name(_) => {
                let filter = identity::to_filter(schema, identity)?;
                let request = Request::read(schema.path()).filter(filter.key, filter.value);
                let records = self.execute(schema, request).await?;
                identity::resolve(schema, identity, &records)?
                    .value()
                    .to_string()
            }
        };

        call.enter(Phase::Executing);
        self.execute(
            schema,
            Request::new(Operation::Remove, schema.path()).param(ID_KEY, &id),
        )
        .await?;

        call.enter(Phase::Verifying);
        info!("Deleted {} {}", schema.name(), identity);
        Ok(())
    }

    async fn reconcile_in(
        &self,
        schema: &ResourceSchema,
        desired: &Instance,
        call: &mut Call<'_>,
    ) -> Result<Outcome> {
        schema.validate(desired)?;

        let identity = desired_identity(schema, desired);
        let filters = read_filters(schema, desired);
        let observed = match &identity {
            Some(identity) => {
                let observed = self.observe(schema, identity, &filters).await?;
                if observed.is_none() {
                    self.emit_drift(schema, identity);
                }
                observed
            }
            None => None,
        };

        let plan = plan::plan(
            schema,
            desired,
            identity.clone(),
            observed.as_ref().map(Observed::current),
        )?;
        self.emit_planned(&plan);

        let current = match &observed {
            Some(observed) => Some(codec::decode(observed.record(), schema)?),
            None => None,
        };

        if plan.is_noop() {
            self.emit_unchanged(&plan);
            return Ok(Outcome {
                plan,
                instance: current,
                applied: false,
            });
        }

        if self.dry_run {
            info!("Dry run: {}", plan);
            return Ok(Outcome {
                plan,
                instance: current,
                applied: false,
            });
        }

        call.enter(Phase::Executing);
        let result = self
            .execute_plan(schema, &plan, desired, observed.as_ref(), call)
            .await;
        let (plan, instance) = match result {
            Ok(instance) => (plan, instance),
            Err(e) if e.is_not_found() && plan.modifies_existing() => {
                // Removed between the read and the write; create only once
                // the device confirms the item is gone
                let Some(identity) = &identity else {
                    return Err(e);
                };
                if self.observe(schema, identity, &FilterSet::new()).await?.is_some() {
                    warn!("{} {} still exists after: {}", schema.name(), identity, e);
                    return Err(e);
                }
                self.emit_drift(schema, identity);
                let plan = Plan::create(schema.name(), Some(identity.clone()));
                call.enter(Phase::Executing);
                let instance = self.execute_plan(schema, &plan, desired, None, call).await?;
                (plan, instance)
            }
            Err(e) => return Err(e),
        };

        self.emit(EngineEvent::Applied {
            resource: schema.name().to_string(),
            identity: plan.identity.clone(),
            plan: plan.to_string(),
        });
        info!("Applied {}", plan);

        Ok(Outcome {
            plan,
            instance: Some(instance),
            applied: true,
        })
    }

    async fn reconcile_absent_in(
        &self,
        schema: &ResourceSchema,
        identity: &Identity,
        call: &mut Call<'_>,
    ) -> Result<Outcome> {
        let Some(observed) = self.observe(schema, identity, &FilterSet::new()).await? else {
            let plan = Plan::new(schema.name(), Some(identity.clone()));
            self.emit_unchanged(&plan);
            return Ok(Outcome {
                plan,
                instance: None,
                applied: false,
            });
        };

        let plan = Plan::delete(schema.name(), identity.clone());
        self.emit_planned(&plan);

        if self.dry_run {
            info!("Dry run: {}", plan);
            return Ok(Outcome {
                plan,
                instance: Some(codec::decode(observed.record(), schema)?),
                applied: false,
            });
        }

        call.enter(Phase::Executing);
        match self
            .execute(
                schema,
                Request::new(Operation::Remove, schema.path()).param(ID_KEY, observed.id(schema)?),
            )
            .await
        {
            Ok(_) => {}
            // Already gone
            Err(e) if e.is_not_found() => debug!("{} {} vanished before removal", schema.name(), identity),
            Err(e) => return Err(e),
        }

        self.emit(EngineEvent::Applied {
            resource: schema.name().to_string(),
            identity: Some(identity.clone()),
            plan: plan.to_string(),
        });
        info!("Applied {}", plan);

        Ok(Outcome {
            plan,
            instance: None,
            applied: true,
        })
    }

    /// Read the item addressed by `identity`
    ///
    /// `filters` (wire keys) further constrain the match. Ordered kinds read
    /// the whole list so placement can be checked, and apply the filters
    /// locally. Returns `None` when no item matches.
    async fn observe(
        &self,
        schema: &ResourceSchema,
        identity: &Identity,
        filters: &FilterSet,
    ) -> Result<Option<Observed>> {
        let filter = identity::to_filter(schema, identity)?;
        let mut request = Request::read(schema.path());
        if schema.placement().is_none() {
            request.filters = filters.clone();
            request.filters.push(filter);
        }

        let list = self.execute(schema, request).await?;
        let index = match identity::locate(schema, identity, &list) {
            Ok(record) if filters.matches(record) => {
                list.iter().position(|r| std::ptr::eq(r, record))
            }
            Ok(_) => None,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        Ok(index.map(|index| Observed { list, index }))
    }

    /// Execute a plan against an observed item, then verify
    async fn execute_plan(
        &self,
        schema: &ResourceSchema,
        plan: &Plan,
        desired: &Instance,
        observed: Option<&Observed>,
        call: &mut Call<'_>,
    ) -> Result<Instance> {
        let mut id = observed.map(|o| o.id(schema)).transpose()?;
        let mut created = None;

        // Built before any write so a recreate cannot remove an item it
        // would fail to add back
        let add_params = if plan.creates() {
            Some(create_params(schema, desired, observed)?)
        } else {
            None
        };

        for action in &plan.actions {
            debug!("{}: executing {}", schema.name(), action);
            match action {
                Action::Create => {
                    let params = add_params.clone().unwrap_or_default();
                    let reply = self
                        .execute(schema, Request::new(Operation::Add, schema.path()).params(params))
                        .await?;
                    id = Some(created_id(schema, &reply)?);
                    created = Some(reply);
                }
                Action::Update { changes } => {
                    let target = existing(schema, id.as_deref())?;
                    let params = diff::encode_changes(schema, changes)?;
                    self.execute(
                        schema,
                        Request::new(Operation::Set, schema.path())
                            .params(params)
                            .param(ID_KEY, target),
                    )
                    .await?;
                }
                Action::Move { destination } => {
                    let target = existing(schema, id.as_deref())?;
                    self.execute(
                        schema,
                        Request::new(Operation::Move, schema.path())
                            .param(MOVE_NUMBERS, target)
                            .param(MOVE_DESTINATION, destination.as_str()),
                    )
                    .await?;
                }
                Action::Delete => {
                    let target = existing(schema, id.as_deref())?;
                    self.execute(
                        schema,
                        Request::new(Operation::Remove, schema.path()).param(ID_KEY, target),
                    )
                    .await?;
                    id = None;
                }
            }
        }

        call.enter(Phase::Verifying);
        match created {
            Some(reply) => self.verify_created(schema, &reply).await,
            None => {
                let target = existing(schema, id.as_deref())?;
                self.read_by_id(schema, target).await
            }
        }
    }

    /// Decode the item an `add` produced
    ///
    /// A reply carrying the full item is decoded directly; a reply carrying
    /// only the new `.id` is followed by a read.
    async fn verify_created(&self, schema: &ResourceSchema, reply: &[Record]) -> Result<Instance> {
        let id = created_id(schema, reply)?;

        if let Some(record) = reply.first()
            && record.contains_key(ID_KEY)
            && record.keys().any(|k| k != ID_KEY && k != RET_KEY)
        {
            return codec::decode(record, schema);
        }

        self.read_by_id(schema, &id).await
    }

    async fn read_by_id(&self, schema: &ResourceSchema, id: &str) -> Result<Instance> {
        let identity = Identity::Id(id.to_string());
        let records = self
            .execute(schema, Request::read(schema.path()).filter(ID_KEY, id))
            .await?;
        let record = identity::locate(schema, &identity, &records)?;
        codec::decode(record, schema)
    }

    /// Send one command, translating failures
    async fn execute(&self, schema: &ResourceSchema, request: Request) -> Result<Vec<Record>> {
        debug!(
            "{} via {}: {} {} {:?} {:?}",
            schema.name(),
            self.transport.transport_name(),
            request.operation,
            request.path,
            request.params,
            request.filters.to_strings()
        );

        self.transport
            .execute(&request)
            .await
            .map_err(|e| annotate(e, request.operation, schema.name()))
    }

    fn finish<T>(&self, mut call: Call<'_>, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                call.enter(Phase::Done);
                Ok(value)
            }
            Err(e) => {
                let phase = call.phase;
                call.enter(Phase::Failed);
                if e.is_not_found() {
                    debug!("{} {} in {}: {}", call.operation, call.resource, phase, e);
                } else {
                    error!("{} {} failed in {}: {}", call.operation, call.resource, phase, e);
                }
                self.emit(EngineEvent::Failed {
                    resource: call.resource.to_string(),
                    operation: call.operation.to_string(),
                    phase,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn emit_planned(&self, plan: &Plan) {
        debug!("Planned {}", plan);
        self.emit(EngineEvent::Planned {
            resource: plan.resource.clone(),
            identity: plan.identity.clone(),
            plan: plan.to_string(),
        });
    }

    fn emit_unchanged(&self, plan: &Plan) {
        debug!("{} {} already up to date", plan.resource, display_identity(plan.identity.as_ref()));
        self.emit(EngineEvent::Unchanged {
            resource: plan.resource.clone(),
            identity: plan.identity.clone(),
        });
    }

    fn emit_drift(&self, schema: &ResourceSchema, identity: &Identity) {
        info!("{} {} not found on device, will create", schema.name(), identity);
        self.emit(EngineEvent::DriftDetected {
            resource: schema.name().to_string(),
            identity: identity.clone(),
        });
    }

    /// Emit an engine event
    fn emit(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Identity addressing `desired`: explicit, or its natural key
fn desired_identity(schema: &ResourceSchema, desired: &Instance) -> Option<Identity> {
    if let Some(identity) = &desired.identity {
        return Some(identity.clone());
    }
    match schema.id_kind() {
        IdKind::Key(field) => desired.get_text(field).map(Identity::Name),
        IdKind::Id => None,
    }
}

/// Read constraints from the filter fields of `desired`, as wire keys
fn read_filters(schema: &ResourceSchema, desired: &Instance) -> FilterSet {
    schema.read_filters(desired).map_keys(codec::wire_key)
}

/// Wire parameters for the `add` of a plan
///
/// When an existing item is recreated, its current non-computed fields are
/// carried over and `desired` (which may be partial) is laid on top; the
/// result must pass full validation.
fn create_params(
    schema: &ResourceSchema,
    desired: &Instance,
    observed: Option<&Observed>,
) -> Result<Record> {
    let instance = match observed {
        Some(observed) => {
            let mut merged = Instance::new();
            for (name, value) in codec::decode(observed.record(), schema)?.fields {
                if schema.get(&name).is_some_and(|f| !f.is_computed()) {
                    merged.set(name, value);
                }
            }
            for (name, value) in &desired.fields {
                merged.set(name.clone(), value.clone());
            }
            merged
        }
        None => desired.clone(),
    };

    schema.validate(&instance)?;
    codec::encode(&schema.with_defaults(&instance), schema)
}

fn created_id(schema: &ResourceSchema, reply: &[Record]) -> Result<String> {
    reply
        .first()
        .and_then(|r| r.get(ID_KEY).or_else(|| r.get(RET_KEY)))
        .cloned()
        .ok_or_else(|| Error::decode(schema.name(), ID_KEY, "", "add reply carries no .id"))
}

fn existing<'a>(schema: &ResourceSchema, id: Option<&'a str>) -> Result<&'a str> {
    id.ok_or_else(|| Error::not_found(format!("{}: no existing item to modify", schema.name())))
}

fn display_identity(identity: Option<&Identity>) -> String {
    identity
        .map(|i| i.to_string())
        .unwrap_or_else(|| "(new)".to_string())
}

/// Attach operation and resource context to a transport failure
fn annotate(err: Error, operation: Operation, resource: &str) -> Error {
    match err {
        Error::NotFound(message) => {
            Error::not_found(format!("{} {}: {}", operation, resource, message))
        }
        Error::Transport { message, .. } | Error::Other(message) if is_no_such_item(&message) => {
            Error::not_found(format!("{} {}: {}", operation, resource, message))
        }
        Error::Transport { message, .. } | Error::Other(message) => {
            Error::transport(operation.as_str(), resource, message)
        }
        Error::Io(e) => Error::transport(operation.as_str(), resource, e.to_string()),
        Error::Json(e) => Error::transport(operation.as_str(), resource, e.to_string()),
        other => other,
    }
}
