//! DeviceHub service handler: the nine catalog and tag operations.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::devicehub::Envelope;
use crate::hub::RequestContext;
use crate::ipc::router::ServiceContext;
use crate::types::{Error, Result};

pub async fn handle(
    ctx: &ServiceContext,
    method: &str,
    mut body: Value,
    request: &RequestContext,
) -> Result<Value> {
    if !ctx.tools.has_tool(method) {
        return Err(Error::not_found(format!("Unknown devicehub method: {}", method)));
    }
    ctx.tools.check_params(method, &body)?;
    ctx.tools.fill_defaults(method, &mut body)?;

    let conn = ctx.connections.connect(request)?;
    let hub = &ctx.hub;
    tracing::debug!(method, endpoint = conn.endpoint(), "Dispatching devicehub call");

    let envelope: Envelope = match method {
        "list_drivers" => hub.list_drivers(&conn).await?,
        "list_devices" => hub.list_devices(&conn, args(body)?).await?,
        "create_device" => hub.create_device(&conn, args(body)?).await?,
        "list_device_tags" => hub.list_device_tags(&conn, args(body)?).await?,
        "read_tag_value" => hub.read_tag_value(&conn, args(body)?).await?,
        "list_all_tags" => hub.list_all_tags(&conn, args(body)?).await?,
        "create_tag" => hub.create_tag(&conn, args(body)?).await?,
        "update_tag" => hub.update_tag(&conn, args(body)?).await?,
        "delete_tag" => hub.delete_tag(&conn, args(body)?).await?,
        _ => return Err(Error::not_found(format!("Unknown devicehub method: {}", method))),
    };

    Ok(envelope.to_value())
}

fn args<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::validation(format!("Invalid arguments: {}", e)))
}
