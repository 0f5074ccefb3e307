//! Top-level IPC router: routes by service, delegates to handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::devicehub::DeviceHub;
use crate::hub::{ConnectionProvider, RequestContext};
use crate::ipc::handlers;
use crate::tools::ToolCatalog;
use crate::types::{Error, Result};

/// Shared state behind every connection. Immutable; calls run concurrently.
pub struct ServiceContext {
    pub hub: DeviceHub,
    pub tools: ToolCatalog,
    pub connections: Arc<dyn ConnectionProvider>,
}

impl ServiceContext {
    pub fn new(hub: DeviceHub, connections: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            hub,
            tools: ToolCatalog::devicehub(),
            connections,
        }
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("hub", &self.hub)
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

/// Decoded request frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IpcRequest {
    pub id: String,
    pub service: String,
    pub method: String,
    pub body: Value,
    /// Transport metadata (`edge_url`, `api_token`).
    pub meta: HashMap<String, String>,
}

/// Route an IPC request to the appropriate service handler.
pub async fn route_request(ctx: &ServiceContext, request: IpcRequest) -> Result<Value> {
    let IpcRequest {
        service,
        method,
        body,
        meta,
        ..
    } = request;
    let body = if body.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        body
    };

    match service.as_str() {
        "devicehub" => {
            let request_ctx = RequestContext { metadata: meta };
            handlers::devicehub::handle(ctx, &method, body, &request_ctx).await
        }
        "tools" => handlers::tools::handle(&ctx.tools, &method, body),
        _ => Err(Error::not_found(format!("Unknown service: {}", service))),
    }
}

// =============================================================================
// Shared helpers used by all handler modules
// =============================================================================

pub fn str_field(body: &Value, key: &str) -> Result<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{ConfigConnectionProvider, InMemoryHub, META_EDGE_URL};
    use crate::types::HubConfig;
    use serde_json::json;

    fn context() -> ServiceContext {
        let hub = DeviceHub::in_memory(Arc::new(InMemoryHub::new()));
        ServiceContext::new(
            hub,
            Arc::new(ConfigConnectionProvider::new(HubConfig::default())),
        )
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let err = route_request(
            &context(),
            IpcRequest {
                service: "kernel".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_null_body_treated_as_empty() {
        let mut meta = HashMap::new();
        meta.insert(META_EDGE_URL.to_string(), "memory://".to_string());
        let body = route_request(
            &context(),
            IpcRequest {
                service: "devicehub".into(),
                method: "list_drivers".into(),
                body: Value::Null,
                meta,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["count"], 0);
    }

    #[test]
    fn test_request_decodes_with_missing_fields() {
        let request: IpcRequest =
            serde_json::from_value(json!({"service": "tools", "method": "list_tools"})).unwrap();
        assert_eq!(request.id, "");
        assert!(request.meta.is_empty());
        assert!(request.body.is_null());
    }
}
