//! Core types for the DeviceHub core.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (DriverId, DeviceId, TagId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for server, hub, logging and IPC

mod config;
mod errors;
mod ids;

pub use config::{Config, HubConfig, IpcConfig, ObservabilityConfig, ServerConfig};
pub use errors::{Error, Result};
pub use ids::{DeviceId, DriverId, TagId};
