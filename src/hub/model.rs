//! Raw catalog records as the hub hands them out.
//!
//! Every attribute the hub may omit is an `Option`. "Absent" and "null" both
//! deserialize to `None`, which is what the normalizer drops.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DeviceId, DriverId, TagId};

/// A protocol adapter the hub can instantiate devices from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    #[serde(default)]
    pub id: Option<DriverId>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Property template copied into every device created from this driver.
    #[serde(default)]
    pub default_properties: Map<String, Value>,
}

impl Driver {
    pub fn new(name: impl Into<String>, id: impl Into<DriverId>) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            protocol: None,
            version: None,
            description: None,
            category: None,
            default_properties: Map::new(),
        }
    }
}

/// A configured endpoint bound to a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub id: Option<DeviceId>,
    #[serde(default)]
    pub driver: Option<DriverId>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Device {
    /// A not-yet-persisted device carrying the driver's default properties.
    pub fn from_driver(name: impl Into<String>, driver: &Driver) -> Self {
        Self {
            name: name.into(),
            id: None,
            driver: driver.id.clone(),
            metadata: None,
            description: None,
            properties: Some(driver.default_properties.clone()),
        }
    }
}

/// Direction of a tag's communication channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicDirection {
    Input,
    Output,
}

/// A channel a tag's value flows through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    pub direction: TopicDirection,
}

/// A data point (register) on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub tag_name: String,
    #[serde(default)]
    pub id: Option<TagId>,
    /// Owning device id.
    #[serde(default)]
    pub device: Option<DeviceId>,
    /// Owning device name, when the hub includes it in global listings.
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Driver-specific register configuration entries, in order.
    #[serde(default)]
    pub properties: Option<Vec<Value>>,
    #[serde(default)]
    pub publish_cov: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub scaling: Option<Value>,
    #[serde(default)]
    pub read_write: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Tag {
    pub fn new(device: DeviceId, tag_name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            id: None,
            device: Some(device),
            device_name: None,
            value_type: Some(value_type.into()),
            description: None,
            properties: None,
            publish_cov: None,
            address: None,
            data_type: None,
            scaling: None,
            read_write: None,
            unit: None,
            topics: Vec::new(),
        }
    }

    /// First topic the hub publishes this tag's value on.
    pub fn output_topic(&self) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.direction == TopicDirection::Output)
            .map(|t| t.topic.as_str())
    }

    pub fn has_id(&self, id: &TagId) -> bool {
        self.id.as_ref() == Some(id)
    }
}
