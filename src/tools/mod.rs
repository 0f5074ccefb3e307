//! Tool metadata for the DeviceHub operations: typed parameters, validation
//! and prompt generation.

pub mod catalog;

pub use catalog::{ParamDef, ParamType, RiskSemantic, ToolCatalog, ToolCategory, ToolEntry};
