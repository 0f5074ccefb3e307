//! Field normalizer: raw hub records to sparse external records.
//!
//! A normalized record only carries the attributes named by its field spec
//! whose values are present and non-null. Callers must read a missing key as
//! "unknown", never as false or zero.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::hub::{Device, Driver, Tag};

/// Attribute lists per entity kind and listing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Driver,
    Device,
    /// Per-device tag listing: register-level detail.
    TagDetail,
    /// Global tag listing and mutation results.
    TagSummary,
}

impl FieldSpec {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            FieldSpec::Driver => &["name", "id", "protocol", "version", "description", "category"],
            FieldSpec::Device => &["name", "id", "driver", "metadata", "description", "properties"],
            FieldSpec::TagDetail => &[
                "tag_name",
                "id",
                "address",
                "data_type",
                "scaling",
                "read_write",
                "unit",
                "description",
            ],
            FieldSpec::TagSummary => &[
                "tag_name",
                "id",
                "device",
                "value_type",
                "description",
                "publish_cov",
            ],
        }
    }
}

/// Named attribute lookup. `None` means absent.
pub trait Attributes {
    fn attribute(&self, name: &str) -> Option<Value>;
}

fn present<T: Serialize>(value: &Option<T>) -> Option<Value> {
    value.as_ref().and_then(|v| serde_json::to_value(v).ok())
}

impl Attributes for Driver {
    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name.clone())),
            "id" => present(&self.id),
            "protocol" => present(&self.protocol),
            "version" => present(&self.version),
            "description" => present(&self.description),
            "category" => present(&self.category),
            _ => None,
        }
    }
}

impl Attributes for Device {
    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name.clone())),
            "id" => present(&self.id),
            "driver" => present(&self.driver),
            "metadata" => self.metadata.clone(),
            "description" => present(&self.description),
            "properties" => self.properties.clone().map(Value::Object),
            _ => None,
        }
    }
}

impl Attributes for Tag {
    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "tag_name" => Some(Value::String(self.tag_name.clone())),
            "id" => present(&self.id),
            "device" => present(&self.device),
            "device_name" => present(&self.device_name),
            "value_type" => present(&self.value_type),
            "description" => present(&self.description),
            "properties" => self.properties.clone().map(Value::Array),
            "publish_cov" => self.publish_cov.map(Value::Bool),
            "address" => present(&self.address),
            "data_type" => present(&self.data_type),
            "scaling" => self.scaling.clone(),
            "read_write" => present(&self.read_write),
            "unit" => present(&self.unit),
            _ => None,
        }
    }
}

/// Sparse external representation of a hub record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord(Map<String, Value>);

impl NormalizedRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl Attributes for NormalizedRecord {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}

/// Keep the attributes named by `spec` that are present and non-null.
pub fn normalize<T: Attributes + ?Sized>(record: &T, spec: FieldSpec) -> NormalizedRecord {
    let mut out = Map::new();
    for &field in spec.fields() {
        match record.attribute(field) {
            None | Some(Value::Null) => {}
            Some(value) => {
                out.insert(field.to_string(), value);
            }
        }
    }
    NormalizedRecord(out)
}
