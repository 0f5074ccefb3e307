//! Connection handles and the provider that derives them from inbound requests.

use std::collections::HashMap;
use std::fmt;

use crate::types::{Error, HubConfig, Result};

/// Request metadata key overriding the configured hub endpoint.
pub const META_EDGE_URL: &str = "edge_url";
/// Request metadata key overriding the configured API token.
pub const META_API_TOKEN: &str = "api_token";

/// Per-request metadata supplied by the transport.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Authenticated handle passed to every catalog call. Read-only and reusable.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    endpoint: String,
    api_token: Option<String>,
}

impl Connection {
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolves an inbound request to a connection handle.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self, ctx: &RequestContext) -> Result<Connection>;
}

/// Takes endpoint and token from request metadata, falling back to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigConnectionProvider {
    defaults: HubConfig,
}

impl ConfigConnectionProvider {
    pub fn new(defaults: HubConfig) -> Self {
        Self { defaults }
    }
}

impl ConnectionProvider for ConfigConnectionProvider {
    fn connect(&self, ctx: &RequestContext) -> Result<Connection> {
        let endpoint = ctx
            .get(META_EDGE_URL)
            .or(self.defaults.endpoint.as_deref())
            .ok_or_else(|| {
                Error::validation(format!(
                    "No hub endpoint configured. Supply '{}' in the request metadata or set hub.endpoint.",
                    META_EDGE_URL
                ))
            })?;
        let api_token = ctx
            .get(META_API_TOKEN)
            .or(self.defaults.api_token.as_deref())
            .map(str::to_string);

        Ok(Connection::new(endpoint, api_token))
    }
}
