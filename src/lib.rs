//! # DeviceHub Core - tool operations for an industrial edge DeviceHub
//!
//! Lets automated agents discover and manage the hub's catalog:
//! - Drivers (protocol adapters), devices and tags (registers)
//! - Tag creation, partial update and single/batch deletion
//! - Live tag value reads through each tag's output topic
//! - Uniform result envelopes for remote failures
//! - Tool catalog with typed parameter validation
//! - TCP+msgpack IPC service layer for external clients
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────────────────────────┐
//!   IPC requests  →  │  router ─► ToolCatalog (validate)    │
//!                    │     │                                │
//!                    │     ▼                                │
//!                    │  DeviceHub ──► CatalogGateway        │
//!                    │     │      └─► LiveValueSource       │
//!                    │     ▼                                │
//!                    │  normalize ─► Envelope               │
//!                    └──────────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod devicehub;
pub mod hub;
pub mod ipc;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use devicehub::{DeviceHub, Envelope, FailureReason};
pub use types::{Config, Error, Result};
