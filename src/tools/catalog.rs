//! Tool catalog: typed metadata, parameter validation, prompt generation.
//!
//! Describes the operations callers may invoke. Arguments are checked against
//! these definitions before any operation contacts the hub.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::types::{Error, Result};

// =============================================================================
// Parameter types
// =============================================================================

/// Accepted JSON shape of one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Bool,
    StringList,
    /// Array of arbitrary JSON values.
    List,
    Optional(Box<ParamType>),
}

impl ParamType {
    /// Check `value` against this type, describing the mismatch on failure.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        let accepted = match (self, value) {
            (ParamType::Optional(_), Value::Null) => true,
            (ParamType::Optional(inner), other) => return inner.validate(other),
            (ParamType::String, Value::String(_))
            | (ParamType::Bool, Value::Bool(_))
            | (ParamType::List, Value::Array(_)) => true,
            (ParamType::StringList, Value::Array(items)) => {
                match items.iter().position(|item| !item.is_string()) {
                    Some(i) => {
                        return Err(format!(
                            "element {} of {} is {}",
                            i,
                            self.display_name(),
                            json_kind(&items[i])
                        ))
                    }
                    None => true,
                }
            }
            _ => false,
        };

        if accepted {
            Ok(())
        } else {
            Err(format!("expected {}, got {}", self.display_name(), json_kind(value)))
        }
    }

    /// Type name as shown in prompts and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Bool => "boolean",
            ParamType::StringList => "string[]",
            ParamType::List => "array",
            ParamType::Optional(inner) => inner.display_name(),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// One named argument of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    /// Inserted by [`ToolCatalog::fill_defaults`] when the caller omits the argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self::required(name, ParamType::Optional(Box::new(param_type)), description)
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        !matches!(self.param_type, ParamType::Optional(_)) && self.default.is_none()
    }
}

// =============================================================================
// Tool entry
// =============================================================================

/// Whether a tool reads or changes hub state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Read,
    Write,
}

/// How much damage a mistaken call can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSemantic {
    ReadOnly,
    Write,
    Destructive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEntry {
    pub id: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
    pub category: ToolCategory,
    pub risk_semantic: RiskSemantic,
}

impl ToolEntry {
    fn new(id: &str, description: &str, risk_semantic: RiskSemantic, parameters: Vec<ParamDef>) -> Self {
        let category = match risk_semantic {
            RiskSemantic::ReadOnly => ToolCategory::Read,
            RiskSemantic::Write | RiskSemantic::Destructive => ToolCategory::Write,
        };
        Self {
            id: id.to_string(),
            description: description.to_string(),
            parameters,
            category,
            risk_semantic,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// `- tool_id(param1: type, param2?: type): description`
    pub fn to_prompt_line(&self) -> String {
        let signature = self
            .parameters
            .iter()
            .map(|p| {
                let marker = if p.is_required() { "" } else { "?" };
                format!("{}{}: {}", p.name, marker, p.param_type.display_name())
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("- {}({}): {}", self.id, signature, self.description)
    }
}

// =============================================================================
// Tool catalog
// =============================================================================

/// Registry of tool metadata, keyed by tool id.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: HashMap<String, ToolEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of every DeviceHub operation.
    pub fn devicehub() -> Self {
        let entries = devicehub_entries()
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        Self { entries }
    }

    /// Add or replace an entry.
    pub fn register(&mut self, entry: ToolEntry) -> Result<()> {
        if entry.id.trim().is_empty() {
            return Err(Error::validation("Tool id cannot be empty"));
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolEntry> {
        self.entries.get(tool_id)
    }

    pub fn has_tool(&self, tool_id: &str) -> bool {
        self.entries.contains_key(tool_id)
    }

    /// Entries ordered by id.
    pub fn list_entries(&self) -> Vec<&ToolEntry> {
        let mut entries: Vec<&ToolEntry> = self.entries.values().collect();
        entries.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    fn entry(&self, tool_id: &str) -> Result<&ToolEntry> {
        self.get(tool_id)
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", tool_id)))
    }

    /// Every problem with `params` for `tool_id`; empty when they are acceptable.
    pub fn validate_params(&self, tool_id: &str, params: &Value) -> Result<Vec<String>> {
        let entry = self.entry(tool_id)?;
        let args: &Map<String, Value> = params
            .as_object()
            .ok_or_else(|| Error::validation("Parameters must be a JSON object"))?;

        let missing = entry
            .parameters
            .iter()
            .filter(|p| p.is_required() && !args.contains_key(&p.name))
            .map(|p| format!("Missing required parameter: {}", p.name));

        let malformed = args.iter().filter_map(|(key, value)| match entry.param(key) {
            None => Some(format!("Unknown parameter: {}", key)),
            Some(def) => def
                .param_type
                .validate(value)
                .err()
                .map(|reason| format!("Parameter '{}': {}", key, reason)),
        });

        Ok(missing.chain(malformed).collect())
    }

    /// Like [`validate_params`](Self::validate_params), folding all problems into one validation error.
    pub fn check_params(&self, tool_id: &str, params: &Value) -> Result<()> {
        let problems = self.validate_params(tool_id, params)?;
        if problems.is_empty() {
            return Ok(());
        }
        Err(Error::validation(format!(
            "Invalid arguments for {}: {}",
            tool_id,
            problems.join("; ")
        )))
    }

    /// Insert declared defaults for omitted arguments. Supplied values are never replaced.
    pub fn fill_defaults(&self, tool_id: &str, params: &mut Value) -> Result<()> {
        let entry = self.entry(tool_id)?;
        let Some(args) = params.as_object_mut() else {
            return Ok(());
        };
        for def in &entry.parameters {
            if let Some(default) = &def.default {
                args.entry(def.name.clone()).or_insert_with(|| default.clone());
            }
        }
        Ok(())
    }

    /// Tool list for an agent's system prompt; empty when nothing is registered.
    pub fn generate_prompt(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        std::iter::once("Available tools:".to_string())
            .chain(self.list_entries().into_iter().map(ToolEntry::to_prompt_line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn device_name_param() -> ParamDef {
    ParamDef::required("device_name", ParamType::String, "Name of the device")
}

fn devicehub_entries() -> Vec<ToolEntry> {
    use ParamType::{Bool, List, String as Str, StringList};
    use RiskSemantic::{Destructive, ReadOnly, Write};

    vec![
        ToolEntry::new(
            "list_drivers",
            "List every driver (industrial protocol adapter) the hub supports",
            ReadOnly,
            vec![],
        ),
        ToolEntry::new(
            "list_devices",
            "List configured devices, optionally filtered by driver",
            ReadOnly,
            vec![ParamDef::optional(
                "filter_by_driver",
                Str,
                "Only return devices using this driver",
            )],
        ),
        ToolEntry::new(
            "create_device",
            "Create a device with a driver's default settings",
            Write,
            vec![
                ParamDef::required("name", Str, "Name of the new device"),
                ParamDef::required("selected_driver", Str, "Driver name, see list_drivers"),
            ],
        ),
        ToolEntry::new(
            "list_device_tags",
            "List the tags (registers) of one device",
            ReadOnly,
            vec![device_name_param()],
        ),
        ToolEntry::new(
            "read_tag_value",
            "Read the current value of a tag by tag_name or tag_id",
            ReadOnly,
            vec![
                device_name_param(),
                ParamDef::optional("tag_name", Str, "Tag name"),
                ParamDef::optional("tag_id", Str, "Tag id"),
            ],
        ),
        ToolEntry::new(
            "list_all_tags",
            "List tags across all devices, optionally for one device name",
            ReadOnly,
            vec![ParamDef::optional("device_name", Str, "Device name filter")],
        ),
        ToolEntry::new(
            "create_tag",
            "Create a tag on a device",
            Write,
            vec![
                device_name_param(),
                ParamDef::required("tag_name", Str, "Name of the new tag"),
                ParamDef::required("value_type", Str, "Value type of the tag"),
                ParamDef::optional("description", Str, "Tag description"),
                ParamDef::optional("properties", List, "Driver-specific register properties")
                    .with_default(json!([])),
                ParamDef::optional("publish_cov", Bool, "Publish change-of-value events")
                    .with_default(json!(false)),
            ],
        ),
        ToolEntry::new(
            "update_tag",
            "Update supplied fields of a tag addressed by id",
            Write,
            vec![
                device_name_param(),
                ParamDef::required("tag_id", Str, "Id of the tag to update"),
                ParamDef::optional("tag_name", Str, "New tag name"),
                ParamDef::optional("value_type", Str, "New value type"),
                ParamDef::optional("description", Str, "New description"),
                ParamDef::optional("properties", List, "New register properties"),
                ParamDef::optional("publish_cov", Bool, "New change-of-value setting"),
            ],
        ),
        ToolEntry::new(
            "delete_tag",
            "Delete tags by tag_ids, tag_id or tag_name",
            Destructive,
            vec![
                device_name_param(),
                ParamDef::optional("tag_name", Str, "Tag name"),
                ParamDef::optional("tag_id", Str, "Tag id"),
                ParamDef::optional("tag_ids", StringList, "Tag ids for batch deletion"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATIONS: [&str; 9] = [
        "list_drivers",
        "list_devices",
        "create_device",
        "list_device_tags",
        "read_tag_value",
        "list_all_tags",
        "create_tag",
        "update_tag",
        "delete_tag",
    ];

    #[test]
    fn test_devicehub_catalog_complete() {
        let catalog = ToolCatalog::devicehub();
        assert_eq!(catalog.len(), OPERATIONS.len());
        for id in OPERATIONS {
            assert!(catalog.has_tool(id), "missing tool {id}");
        }

        let delete = catalog.get("delete_tag").unwrap();
        assert_eq!(delete.risk_semantic, RiskSemantic::Destructive);
        assert_eq!(delete.category, ToolCategory::Write);
        assert_eq!(catalog.get("list_devices").unwrap().category, ToolCategory::Read);
    }

    #[test]
    fn test_blank_id_rejected() {
        let mut catalog = ToolCatalog::new();
        let entry = ToolEntry::new("  ", "nothing", RiskSemantic::ReadOnly, vec![]);
        assert!(catalog.register(entry).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_batch_delete_arguments_accepted() {
        let catalog = ToolCatalog::devicehub();
        let params = json!({"device_name": "PLC1", "tag_ids": ["a", "b"]});
        assert_eq!(catalog.validate_params("delete_tag", &params).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_missing_driver_reported() {
        let catalog = ToolCatalog::devicehub();
        let problems = catalog
            .validate_params("create_device", &json!({"name": "PLC1"}))
            .unwrap();
        assert_eq!(problems, vec!["Missing required parameter: selected_driver"]);
    }

    #[test]
    fn test_wrong_type_and_unknown_key_both_reported() {
        let catalog = ToolCatalog::devicehub();
        let params = json!({"device_name": 7, "bogus": true});
        let problems = catalog.validate_params("list_device_tags", &params).unwrap();
        assert_eq!(problems.len(), 2);
        assert!(problems.contains(&"Parameter 'device_name': expected string, got number".to_string()));
        assert!(problems.contains(&"Unknown parameter: bogus".to_string()));
    }

    #[test]
    fn test_optional_accepts_null() {
        let catalog = ToolCatalog::devicehub();
        assert!(catalog
            .check_params("list_devices", &json!({"filter_by_driver": null}))
            .is_ok());
    }

    #[test]
    fn test_check_params_errors() {
        let catalog = ToolCatalog::devicehub();
        let err = catalog.check_params("reboot_hub", &json!({})).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = catalog.check_params("list_devices", &json!([])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_tag_defaults_filled_without_overwrite() {
        let catalog = ToolCatalog::devicehub();

        let mut params = json!({"device_name": "PLC1", "tag_name": "T", "value_type": "Float"});
        catalog.fill_defaults("create_tag", &mut params).unwrap();
        assert_eq!(params["publish_cov"], false);
        assert_eq!(params["properties"], json!([]));
        assert!(params.get("description").is_none());

        let mut params = json!({"publish_cov": true});
        catalog.fill_defaults("create_tag", &mut params).unwrap();
        assert_eq!(params["publish_cov"], true);
    }

    #[test]
    fn test_string_list_shapes() {
        let ids = ParamType::StringList;
        assert!(ids.validate(&json!(["a", "b"])).is_ok());
        assert_eq!(
            ids.validate(&json!(["a", 2])).unwrap_err(),
            "element 1 of string[] is number"
        );
        assert!(ids.validate(&json!("a")).is_err());
    }

    #[test]
    fn test_prompt_lines() {
        let catalog = ToolCatalog::devicehub();
        assert_eq!(
            catalog.get("list_devices").unwrap().to_prompt_line(),
            "- list_devices(filter_by_driver?: string): List configured devices, optionally filtered by driver"
        );
        assert!(catalog
            .generate_prompt()
            .starts_with("Available tools:\n- create_device(name: string, selected_driver: string)"));
        assert_eq!(ToolCatalog::new().generate_prompt(), "");
    }
}
