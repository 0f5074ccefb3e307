//! In-process hub catalog.
//!
//! Backs the offline server mode and the test suites. Seeded programmatically
//! or from a JSON fixture of the same shape as `HubFixture`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::model::{Device, Driver, Tag, Topic, TopicDirection};
use super::{CatalogGateway, Connection, LiveValueSource};
use crate::types::{DeviceId, Error, Result, TagId};

/// Endpoint reported for connections to the in-process catalog.
pub const MEMORY_ENDPOINT: &str = "memory://";

/// Serializable catalog snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubFixture {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// topic → last published payload
    #[serde(default)]
    pub values: HashMap<String, Value>,
}

/// Hub catalog held in memory behind an async lock.
#[derive(Debug, Default)]
pub struct InMemoryHub {
    state: RwLock<HubFixture>,
}

impl InMemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: HubFixture) -> Self {
        Self {
            state: RwLock::new(fixture),
        }
    }

    /// Load a JSON fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let fixture: HubFixture = serde_json::from_str(&raw).map_err(|e| {
            Error::validation(format!("invalid hub fixture {}: {}", path.display(), e))
        })?;
        tracing::info!(
            drivers = fixture.drivers.len(),
            devices = fixture.devices.len(),
            tags = fixture.tags.len(),
            "Loaded hub fixture from {}",
            path.display()
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.state.get_mut().drivers.push(driver);
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.state.get_mut().devices.push(device);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.state.get_mut().tags.push(tag);
        self
    }

    /// Record a reading on a topic, stamped with the current time.
    pub async fn publish(&self, topic: impl Into<String>, value: Value) {
        let payload = serde_json::json!({
            "value": value,
            "timestamp": Utc::now().timestamp_millis(),
        });
        self.state.write().await.values.insert(topic.into(), payload);
    }

    /// Copy of the current catalog.
    pub async fn snapshot(&self) -> HubFixture {
        self.state.read().await.clone()
    }
}

fn output_topic_for(device: Option<&DeviceId>, id: &TagId) -> Topic {
    let device = device.map(DeviceId::as_str).unwrap_or("unbound");
    Topic {
        topic: format!("devicehub.{}.{}", device, id),
        direction: TopicDirection::Output,
    }
}

#[async_trait]
impl CatalogGateway for InMemoryHub {
    async fn list_drivers(&self, _conn: &Connection) -> Result<Vec<Driver>> {
        Ok(self.state.read().await.drivers.clone())
    }

    async fn list_devices(&self, _conn: &Connection) -> Result<Vec<Device>> {
        Ok(self.state.read().await.devices.clone())
    }

    async fn create_device(&self, _conn: &Connection, mut device: Device) -> Result<Device> {
        if device.name.is_empty() {
            return Err(Error::gateway("device name must not be empty"));
        }
        device.id.get_or_insert_with(DeviceId::new);

        self.state.write().await.devices.push(device.clone());
        Ok(device)
    }

    async fn list_device_tags(&self, _conn: &Connection, device: &Device) -> Result<Vec<Tag>> {
        let Some(device_id) = device.id.as_ref() else {
            return Ok(Vec::new());
        };
        let state = self.state.read().await;
        Ok(state
            .tags
            .iter()
            .filter(|t| t.device.as_ref() == Some(device_id))
            .cloned()
            .collect())
    }

    async fn list_all_tags(&self, _conn: &Connection) -> Result<Vec<Tag>> {
        let state = self.state.read().await;
        let names: HashMap<&DeviceId, &str> = state
            .devices
            .iter()
            .filter_map(|d| d.id.as_ref().map(|id| (id, d.name.as_str())))
            .collect();

        Ok(state
            .tags
            .iter()
            .map(|t| {
                let mut tag = t.clone();
                if tag.device_name.is_none() {
                    tag.device_name = tag
                        .device
                        .as_ref()
                        .and_then(|id| names.get(id))
                        .map(|n| n.to_string());
                }
                tag
            })
            .collect())
    }

    async fn create_tags(&self, _conn: &Connection, tags: Vec<Tag>) -> Result<Vec<Tag>> {
        let mut state = self.state.write().await;
        let mut created = Vec::with_capacity(tags.len());
        for mut tag in tags {
            let id = tag.id.get_or_insert_with(TagId::new).clone();
            if tag.topics.is_empty() {
                tag.topics.push(output_topic_for(tag.device.as_ref(), &id));
            }
            state.tags.push(tag.clone());
            created.push(tag);
        }
        Ok(created)
    }

    async fn update_tags(&self, _conn: &Connection, tags: Vec<Tag>) -> Result<Vec<Tag>> {
        let mut state = self.state.write().await;
        let mut updated = Vec::with_capacity(tags.len());
        for tag in tags {
            let id = tag
                .id
                .clone()
                .ok_or_else(|| Error::gateway("cannot update a tag without an id"))?;
            let slot = state
                .tags
                .iter_mut()
                .find(|t| t.has_id(&id))
                .ok_or_else(|| Error::gateway(format!("tag {} does not exist", id)))?;
            *slot = tag.clone();
            updated.push(tag);
        }
        Ok(updated)
    }

    async fn delete_tag(&self, conn: &Connection, tag: &Tag) -> Result<()> {
        self.delete_tags(conn, std::slice::from_ref(tag)).await
    }

    async fn delete_tags(&self, _conn: &Connection, tags: &[Tag]) -> Result<()> {
        let mut state = self.state.write().await;
        for tag in tags {
            let exists = tag
                .id
                .as_ref()
                .is_some_and(|id| state.tags.iter().any(|t| t.has_id(id)));
            if !exists {
                return Err(Error::gateway(format!(
                    "tag '{}' does not exist",
                    tag.tag_name
                )));
            }
        }
        state
            .tags
            .retain(|t| !tags.iter().any(|d| d.id.is_some() && d.id == t.id));
        Ok(())
    }
}

#[async_trait]
impl LiveValueSource for InMemoryHub {
    async fn current_value(&self, _conn: &Connection, topic: &str) -> Result<Value> {
        self.state
            .read()
            .await
            .values
            .get(topic)
            .cloned()
            .ok_or_else(|| Error::gateway(format!("no value published on topic '{}'", topic)))
    }
}
