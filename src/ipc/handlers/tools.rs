//! Tools service handler: catalog listing, description and prompt generation.

use crate::ipc::router::str_field;
use crate::tools::ToolCatalog;
use crate::types::{Error, Result};
use serde_json::Value;

pub fn handle(catalog: &ToolCatalog, method: &str, body: Value) -> Result<Value> {
    match method {
        "list_tools" => {
            let entries = catalog
                .list_entries()
                .into_iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(serde_json::json!({
                "count": entries.len(),
                "tools": entries,
            }))
        }

        "describe_tool" => {
            let tool_id = str_field(&body, "tool_id")?;
            let entry = catalog
                .get(&tool_id)
                .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", tool_id)))?;

            Ok(serde_json::to_value(entry)?)
        }

        "generate_prompt" => Ok(serde_json::json!({
            "prompt": catalog.generate_prompt(),
        })),

        _ => Err(Error::not_found(format!("Unknown tools method: {}", method))),
    }
}
