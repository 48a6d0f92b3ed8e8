// # RouterOS REST Transport
//
// Transport adapter for the RouterOS REST API (`/rest`, RouterOS 7.1+).
//
// ## Operation Mapping
//
// | operation | HTTP                                   |
// |-----------|----------------------------------------|
// | read      | `GET    /rest<path>?key=value`         |
// | add       | `PUT    /rest<path>`                   |
// | set       | `PATCH  /rest<path>/<.id>`             |
// | remove    | `DELETE /rest<path>/<.id>`             |
// | move      | `POST   /rest<path>/move`              |
//
// Replies are JSON objects (or arrays of objects). Every scalar is turned
// into its string form so the engine sees the same flat records the
// device prints.
//
// ## Architectural Constraints
//
// - ✅ Exactly one HTTP request per `execute` call
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Device failures carry the device's `detail` text
// - ❌ NO retry logic (a retried `add` can create a duplicate)
// - ❌ NO caching, NO background tasks
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - Credentials are sent as HTTP basic auth on every request
//
// ## Error Mapping
//
// - 401/403 → `Error::Authentication`
// - 404, or a `detail` of "no such item" → `Error::NotFound`
// - anything else → `Error::Transport` carrying status and detail

use async_trait::async_trait;
use reqwest::Method;
use ros_core::codec::ID_KEY;
use ros_core::config::TransportConfig;
use ros_core::error::is_no_such_item;
use ros_core::traits::{Operation, Request, Transport, TransportFactory};
use ros_core::{Error, Record, Result, TransportRegistry};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix of the REST API
const REST_PREFIX: &str = "/rest";

/// Error reply body, e.g. `{"error":400,"message":"Bad Request","detail":"failure: no such item"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

/// One HTTP request derived from a transport [`Request`]
#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

/// RouterOS REST API transport
///
/// Stateless apart from the connection pool inside the HTTP client.
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct RestTransport {
    /// Base URL of the router (`https://192.168.88.1`)
    base_url: String,

    /// API user
    username: String,

    /// API password
    /// ⚠️ NEVER log this value
    password: String,

    /// Self-signed certificates accepted
    insecure: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl RestTransport {
    /// Create a new REST transport
    ///
    /// # Parameters
    ///
    /// - `base_url`: Router URL without the `/rest` suffix
    /// - `username`: API user
    /// - `password`: API password
    /// - `insecure`: Accept self-signed TLS certificates
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let username = username.into();

        if username.is_empty() {
            return Err(Error::config("REST transport username cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            username,
            password: password.into(),
            insecure,
            client,
        })
    }

    fn collection_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, REST_PREFIX, path)
    }

    /// Translate a command into method, URL, query and body
    fn endpoint(&self, request: &Request) -> Result<Endpoint> {
        let collection = self.collection_url(&request.path);

        let endpoint = match request.operation {
            Operation::Read => Endpoint {
                method: Method::GET,
                url: collection,
                query: request
                    .filters
                    .iter()
                    .map(|f| (f.key.clone(), f.value.clone()))
                    .collect(),
                body: None,
            },
            Operation::Add => Endpoint {
                method: Method::PUT,
                url: collection,
                query: Vec::new(),
                body: Some(body(&request.params)),
            },
            Operation::Set => Endpoint {
                method: Method::PATCH,
                url: format!("{}/{}", collection, target(request)?),
                query: Vec::new(),
                body: Some(body(&request.params)),
            },
            Operation::Remove => Endpoint {
                method: Method::DELETE,
                url: format!("{}/{}", collection, target(request)?),
                query: Vec::new(),
                body: None,
            },
            Operation::Move => Endpoint {
                method: Method::POST,
                url: format!("{}/move", collection),
                query: Vec::new(),
                body: Some(body(&request.params)),
            },
        };

        Ok(endpoint)
    }
}

#[async_trait]
impl Transport for RestTransport {
    /// Execute one command with one HTTP request
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: The records in the reply (empty for set/remove/move)
    /// - `Err(Error)`: Mapped per the table in the crate docs
    async fn execute(&self, request: &Request) -> Result<Vec<Record>> {
        let endpoint = self.endpoint(request)?;
        let operation = request.operation.as_str();

        tracing::debug!("{} {} ({})", endpoint.method, endpoint.url, operation);

        let mut builder = self
            .client
            .request(endpoint.method.clone(), &endpoint.url)
            .basic_auth(&self.username, Some(&self.password));
        if !endpoint.query.is_empty() {
            builder = builder.query(&endpoint.query);
        }
        if let Some(body) = &endpoint.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            Error::transport(operation, &request.path, format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::transport(operation, &request.path, format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text, request));
        }

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            Error::transport(operation, &request.path, format!("Failed to parse response: {}", e))
        })?;

        parse_records(json).map_err(|msg| Error::transport(operation, &request.path, msg))
    }

    fn transport_name(&self) -> &'static str {
        "rest"
    }
}

/// `.id` a set/remove addresses
fn target(request: &Request) -> Result<&str> {
    request.params.get(ID_KEY).map(String::as_str).ok_or_else(|| {
        Error::transport(
            request.operation.as_str(),
            &request.path,
            format!("missing parameter {}", ID_KEY),
        )
    })
}

/// JSON body of a write; the `.id` travels in the URL
fn body(params: &Record) -> Value {
    let map: Map<String, Value> = params
        .iter()
        .filter(|(key, _)| key.as_str() != ID_KEY)
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    Value::Object(map)
}

/// Flatten a JSON reply into records
fn parse_records(json: Value) -> std::result::Result<Vec<Record>, String> {
    match json {
        Value::Null => Ok(Vec::new()),
        Value::Object(object) => Ok(vec![to_record(object)]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => Ok(to_record(object)),
                other => Err(format!("Invalid response format: expected object, got {}", other)),
            })
            .collect(),
        other => Err(format!("Invalid response format: expected object or array, got {}", other)),
    }
}

fn to_record(object: Map<String, Value>) -> Record {
    object
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                nested @ Value::Object(_) => nested.to_string(),
            };
            Some((key, text))
        })
        .collect()
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, body: &str, request: &Request) -> Error {
    let operation = request.operation.as_str();
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail.or(b.message))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => Error::auth(format!(
            "Router rejected credentials for {} {} (status {})",
            operation, request.path, status
        )),
        404 => Error::not_found(format!("{} {}: {}", operation, request.path, detail)),
        _ if is_no_such_item(&detail) => {
            Error::not_found(format!("{} {}: {}", operation, request.path, detail))
        }
        500..=599 => Error::transport(
            operation,
            &request.path,
            format!("Router error (status {}): {}", status, detail),
        ),
        _ => Error::transport(
            operation,
            &request.path,
            format!("{} (status {})", detail, status),
        ),
    }
}

/// Factory for creating REST transports
pub struct RestTransportFactory;

impl TransportFactory for RestTransportFactory {
    fn create(&self, config: &TransportConfig) -> Result<Box<dyn Transport>> {
        match config {
            TransportConfig::Rest {
                url,
                username,
                password,
                insecure,
            } => {
                config.validate()?;

                if *insecure {
                    tracing::warn!("REST transport accepts invalid TLS certificates for {}", url);
                }

                Ok(Box::new(RestTransport::new(
                    url.clone(),
                    username.clone(),
                    password.clone(),
                    *insecure,
                )?))
            }
            _ => Err(Error::config("Invalid config for REST transport")),
        }
    }
}

/// Register the REST transport with a registry
///
/// # Example
///
/// ```rust
/// use ros_core::TransportRegistry;
///
/// let registry = TransportRegistry::with_builtin();
/// ros_transport_rest::register(&registry);
/// assert!(registry.has_transport("rest"));
/// ```
pub fn register(registry: &TransportRegistry) {
    registry.register_transport("rest", Box::new(RestTransportFactory));
}
