//! Operation arguments as they arrive from callers.
//!
//! Every field is optional at the type level so that a missing required
//! argument produces a descriptive validation error instead of a decode error.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Error, Result};

/// Returns the value of a required string argument. Empty counts as missing.
pub(crate) fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(format!("'{}' parameter is required", name))),
    }
}

/// Optional string argument, empty treated as absent.
pub(crate) fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListDevicesArgs {
    pub filter_by_driver: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateDeviceArgs {
    pub name: Option<String>,
    pub selected_driver: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceTagsArgs {
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadTagValueArgs {
    pub device_name: Option<String>,
    pub tag_name: Option<String>,
    pub tag_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListAllTagsArgs {
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTagArgs {
    pub device_name: Option<String>,
    pub tag_name: Option<String>,
    pub value_type: Option<String>,
    pub description: Option<String>,
    pub properties: Option<Vec<Value>>,
    pub publish_cov: Option<bool>,
}

/// Fields not supplied keep their current value on the tag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTagArgs {
    pub device_name: Option<String>,
    pub tag_id: Option<String>,
    pub tag_name: Option<String>,
    pub value_type: Option<String>,
    pub description: Option<String>,
    pub properties: Option<Vec<Value>>,
    pub publish_cov: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteTagArgs {
    pub device_name: Option<String>,
    pub tag_name: Option<String>,
    pub tag_id: Option<String>,
    pub tag_ids: Option<Vec<String>>,
}
