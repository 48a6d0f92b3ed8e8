// # rosctl - apply a desired-state manifest
//
// A THIN integration layer: all planning, diffing and device logic lives in
// ros-core. This binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering transports
// 4. Reconciling every manifest entry in order
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Transport
// - `ROS_TRANSPORT_TYPE`: Transport type (rest, memory); default rest
// - `ROS_URL`: Router URL, e.g. `https://192.168.88.1` (for rest)
// - `ROS_USERNAME`: API user (for rest)
// - `ROS_PASSWORD`: API password (for rest)
// - `ROS_INSECURE`: Accept self-signed certificates (true/false)
//
// ### Run
// - `ROS_MANIFEST`: Path to the JSON manifest
// - `ROS_MODE`: `dry-run` to plan without writing
//
// ### Logging
// - `ROS_LOG_LEVEL`: trace, debug, info, warn, error; default info
// - `ROS_LOG_COLOR`: Colour log output (true/false); default true
//
// ## Example
//
// ```bash
// export ROS_URL=https://192.168.88.1
// export ROS_USERNAME=admin
// export ROS_PASSWORD=secret
// export ROS_MANIFEST=/etc/rosctl/router.json
// export ROS_MODE=dry-run
//
// rosctl
// ```

use anyhow::Result;
use ros_core::manifest::Ensure;
use ros_core::{
    ClientConfig, EngineConfig, EngineEvent, Manifest, Reconciler, SchemaRegistry,
    TransportConfig, TransportRegistry,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Every resource reconciled
/// - 1: Configuration or startup error
/// - 2: Runtime error (a resource failed)
#[derive(Debug, Clone, Copy)]
enum RosExitCode {
    Clean = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<RosExitCode> for ExitCode {
    fn from(code: RosExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    client: ClientConfig,
    manifest: PathBuf,
    log_level: String,
    log_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let transport = match lookup("ROS_TRANSPORT_TYPE").as_deref().unwrap_or("rest") {
            "rest" => TransportConfig::Rest {
                url: lookup("ROS_URL").unwrap_or_default(),
                username: lookup("ROS_USERNAME").unwrap_or_default(),
                password: lookup("ROS_PASSWORD").unwrap_or_default(),
                insecure: parse_flag("ROS_INSECURE", lookup("ROS_INSECURE"), false)?,
            },
            "memory" => TransportConfig::Memory,
            other => anyhow::bail!(
                "ROS_TRANSPORT_TYPE '{}' is not supported. \
                Supported types: rest, memory",
                other
            ),
        };

        let dry_run = match lookup("ROS_MODE") {
            Some(mode) => match mode.to_lowercase().as_str() {
                "dry-run" => true,
                "live" | "" => false,
                other => anyhow::bail!(
                    "ROS_MODE '{}' is not valid. Valid modes: live, dry-run",
                    other
                ),
            },
            None => false,
        };

        let manifest = lookup("ROS_MANIFEST").ok_or_else(|| {
            anyhow::anyhow!(
                "ROS_MANIFEST is required. \
                Set it via: export ROS_MANIFEST=/etc/rosctl/router.json"
            )
        })?;

        let mut client = ClientConfig::new(transport);
        client.engine = EngineConfig {
            dry_run,
            ..EngineConfig::default()
        };

        Ok(Self {
            client,
            manifest: PathBuf::from(manifest),
            log_level: lookup("ROS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_color: parse_flag("ROS_LOG_COLOR", lookup("ROS_LOG_COLOR"), true)?,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.client.validate()?;

        if self.manifest.as_os_str().is_empty() {
            anyhow::bail!("ROS_MANIFEST cannot be empty");
        }
        if !self.manifest.exists() {
            anyhow::bail!("ROS_MANIFEST does not exist: {}", self.manifest.display());
        }

        if let TransportConfig::Rest { url, password, .. } = &self.client.transport {
            if password.is_empty() {
                anyhow::bail!("ROS_PASSWORD is required when ROS_TRANSPORT_TYPE=rest");
            }
            if url.starts_with("http://") {
                eprintln!(
                    "WARNING: ROS_URL uses HTTP (not HTTPS). \
                    Credentials are sent in clear text."
                );
            }
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "ROS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        "" => Ok(default),
        other => anyhow::bail!("{} '{}' is not a boolean", name, other),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return RosExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return RosExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(config.log_color)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RosExitCode::ConfigError.into();
    }

    info!(
        "Starting rosctl (transport: {}, mode: {})",
        config.client.transport.type_name(),
        if config.client.engine.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RosExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => RosExitCode::Clean,
            Err(e) if e.downcast_ref::<ros_core::Error>().is_some_and(is_config_error) => {
                error!("{}", e);
                RosExitCode::ConfigError
            }
            Err(e) => {
                error!("{}", e);
                RosExitCode::RuntimeError
            }
        }
    })
    .into()
}

fn is_config_error(err: &ros_core::Error) -> bool {
    matches!(
        err,
        ros_core::Error::Config(_)
            | ros_core::Error::UnknownResource(_)
            | ros_core::Error::Io(_)
            | ros_core::Error::Json(_)
    )
}

/// Reconcile every manifest entry in order
///
/// A failing entry is logged and the run continues with the next one.
async fn run(config: Config) -> Result<()> {
    let registry = TransportRegistry::with_builtin();

    #[cfg(feature = "rest")]
    {
        debug!("Registering REST transport");
        ros_transport_rest::register(&registry);
    }

    let schemas = Arc::new(SchemaRegistry::builtin().clone());

    let manifest = Manifest::load(&config.manifest).await?;
    manifest.validate(&schemas)?;
    info!(
        "Loaded {} resource(s) from {}",
        manifest.resources.len(),
        config.manifest.display()
    );

    let dry_run = config.client.engine.dry_run;
    let transport = registry.create_transport(&config.client.transport)?;
    let (engine, mut events) = Reconciler::new(transport, schemas.clone(), config.client.engine)?;

    let mut failed = 0;
    for (index, entry) in manifest.resources.iter().enumerate() {
        let result = match entry.ensure {
            Ensure::Present => engine.reconcile(&entry.kind, &entry.to_instance()).await,
            Ensure::Absent => match entry.identity(&schemas)? {
                Some(identity) => engine.reconcile_absent(&entry.kind, &identity).await,
                None => Err(ros_core::Error::config(format!(
                    "resources[{}]: {} marked absent needs an identity",
                    index, entry.kind
                ))),
            },
        };

        match result {
            Ok(outcome) if outcome.applied => info!("resources[{}]: {}", index, outcome.plan),
            Ok(outcome) if dry_run && !outcome.plan.is_noop() => {
                info!("resources[{}]: would apply {}", index, outcome.plan)
            }
            Ok(outcome) => debug!("resources[{}]: {}", index, outcome.plan),
            Err(e) => {
                failed += 1;
                error!("resources[{}] ({}): {}", index, entry.kind, e);
            }
        }

        log_events(&mut events);
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} resource(s) failed",
            failed,
            manifest.resources.len()
        );
    }

    info!("All {} resource(s) reconciled", manifest.resources.len());
    Ok(())
}

/// Log engine events emitted so far
fn log_events(events: &mut mpsc::Receiver<EngineEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::DriftDetected { resource, identity } => {
                warn!("Drift: {} {} missing on device", resource, identity)
            }
            EngineEvent::Failed {
                resource,
                operation,
                phase,
                ..
            } => debug!("{} {} failed while {}", operation, resource, phase),
            other => debug!("Event: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_rest_config_from_env() {
        let config = Config::from_lookup(lookup(&[
            ("ROS_URL", "https://192.168.88.1"),
            ("ROS_USERNAME", "admin"),
            ("ROS_PASSWORD", "pw"),
            ("ROS_INSECURE", "true"),
            ("ROS_MANIFEST", "/tmp/router.json"),
            ("ROS_MODE", "dry-run"),
        ]))
        .unwrap();

        assert_eq!(config.client.transport.type_name(), "rest");
        assert!(config.client.engine.dry_run);
        assert!(config.log_color);
        assert!(matches!(
            config.client.transport,
            TransportConfig::Rest { insecure: true, .. }
        ));
    }

    #[test]
    fn test_manifest_is_required() {
        assert!(Config::from_lookup(lookup(&[("ROS_TRANSPORT_TYPE", "memory")])).is_err());
    }

    #[test]
    fn test_rejects_unknown_values() {
        let base = [("ROS_MANIFEST", "/tmp/router.json")];

        let mut pairs = base.to_vec();
        pairs.push(("ROS_TRANSPORT_TYPE", "ssh"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("ROS_MODE", "maybe"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("ROS_LOG_COLOR", "sometimes"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_log_level() {
        let mut config = Config::from_lookup(lookup(&[
            ("ROS_TRANSPORT_TYPE", "memory"),
            ("ROS_MANIFEST", "/tmp/router.json"),
            ("ROS_LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.level().unwrap(), Level::DEBUG);

        config.log_level = "verbose".to_string();
        assert!(config.level().is_err());
    }
}
