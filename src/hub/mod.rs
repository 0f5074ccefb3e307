//! Seams to the edge hub: catalog access, live values, connections.
//!
//! The hub is the single source of truth. Nothing behind these traits is
//! cached by the core; every operation fetches what it needs again.

pub mod connection;
pub mod memory;
pub mod model;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::Result;

pub use connection::{
    ConfigConnectionProvider, Connection, ConnectionProvider, RequestContext, META_API_TOKEN,
    META_EDGE_URL,
};
pub use memory::{HubFixture, InMemoryHub, MEMORY_ENDPOINT};
pub use model::{Device, Driver, Tag, Topic, TopicDirection};

/// Remote catalog of drivers, devices and tags.
///
/// Implementations report remote failures as `Error::Gateway` or
/// `Error::Timeout`; the core folds those into error envelopes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_drivers(&self, conn: &Connection) -> Result<Vec<Driver>>;

    async fn list_devices(&self, conn: &Connection) -> Result<Vec<Device>>;

    /// Persist a new device and return it as stored.
    async fn create_device(&self, conn: &Connection, device: Device) -> Result<Device>;

    async fn list_device_tags(&self, conn: &Connection, device: &Device) -> Result<Vec<Tag>>;

    async fn list_all_tags(&self, conn: &Connection) -> Result<Vec<Tag>>;

    /// Batch create. Returns the stored tags, possibly empty.
    async fn create_tags(&self, conn: &Connection, tags: Vec<Tag>) -> Result<Vec<Tag>>;

    /// Batch update. Returns the stored tags, possibly empty.
    async fn update_tags(&self, conn: &Connection, tags: Vec<Tag>) -> Result<Vec<Tag>>;

    async fn delete_tag(&self, conn: &Connection, tag: &Tag) -> Result<()>;

    async fn delete_tags(&self, conn: &Connection, tags: &[Tag]) -> Result<()>;
}

/// Live value subsystem: current reading published on a topic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveValueSource: Send + Sync {
    async fn current_value(&self, conn: &Connection, topic: &str) -> Result<Value>;
}
