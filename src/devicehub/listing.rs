//! Filter & aggregate engine: listings, filters, grouping summaries.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use super::args::{optional, required, DeviceTagsArgs, ListAllTagsArgs, ListDevicesArgs};
use super::envelope::{conclude, Envelope, FailureReason};
use super::normalize::{normalize, FieldSpec, NormalizedRecord};
use super::resolve::require_device;
use super::DeviceHub;
use crate::hub::{Connection, Device, Driver, Tag};
use crate::types::Result;

/// Group key for records lacking the grouped attribute.
pub const UNKNOWN_GROUP: &str = "unknown";

#[derive(Debug, Clone, Serialize)]
pub struct DriverListing {
    pub count: usize,
    pub drivers: Vec<NormalizedRecord>,
    pub driver_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub by_driver: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceFilters {
    pub driver: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceListing {
    pub count: usize,
    pub devices: Vec<NormalizedRecord>,
    pub summary: DeviceSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_applied: Option<DeviceFilters>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTagListing {
    pub device_name: String,
    pub count: usize,
    pub tags: Vec<NormalizedRecord>,
    pub tag_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub by_device: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagFilters {
    pub device_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagListing {
    pub count: usize,
    pub tags: Vec<NormalizedRecord>,
    pub summary: TagSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_applied: Option<TagFilters>,
}

fn str_key<'a>(record: &'a NormalizedRecord, key: &str) -> &'a str {
    record.get_str(key).unwrap_or("")
}

/// Count records per value of `key`, absent values under [`UNKNOWN_GROUP`].
pub fn group_counts(records: &[NormalizedRecord], key: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let group = record.get_str(key).unwrap_or(UNKNOWN_GROUP);
        *counts.entry(group.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Normalized drivers, sorted by name.
pub fn shape_drivers(drivers: &[Driver]) -> Vec<NormalizedRecord> {
    let mut records: Vec<NormalizedRecord> = drivers
        .iter()
        .map(|d| normalize(d, FieldSpec::Driver))
        .collect();
    records.sort_by(|a, b| str_key(a, "name").cmp(str_key(b, "name")));
    records
}

/// Normalized devices whose driver equals `driver_filter` (all when `None`), sorted by name.
pub fn shape_devices(devices: &[Device], driver_filter: Option<&str>) -> Vec<NormalizedRecord> {
    let mut records: Vec<NormalizedRecord> = devices
        .iter()
        .map(|d| normalize(d, FieldSpec::Device))
        .filter(|r| driver_filter.map_or(true, |f| r.get_str("driver") == Some(f)))
        .collect();
    records.sort_by(|a, b| str_key(a, "name").cmp(str_key(b, "name")));
    records
}

/// Normalized per-device tags, sorted by tag name.
pub fn shape_device_tags(tags: &[Tag]) -> Vec<NormalizedRecord> {
    let mut records: Vec<NormalizedRecord> = tags
        .iter()
        .map(|t| normalize(t, FieldSpec::TagDetail))
        .collect();
    records.sort_by(|a, b| str_key(a, "tag_name").cmp(str_key(b, "tag_name")));
    records
}

/// Normalized global tags sorted by (device, tag name).
///
/// The device filter matches the tag's own `device_name`; tags that do not
/// carry a device name are kept.
pub fn shape_all_tags(tags: &[Tag], device_name_filter: Option<&str>) -> Vec<NormalizedRecord> {
    let mut records: Vec<NormalizedRecord> = tags
        .iter()
        .filter(|t| match (device_name_filter, t.device_name.as_deref()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        })
        .map(|t| normalize(t, FieldSpec::TagSummary))
        .collect();
    records.sort_by(|a, b| {
        (str_key(a, "device"), str_key(a, "tag_name"))
            .cmp(&(str_key(b, "device"), str_key(b, "tag_name")))
    });
    records
}

fn names(records: &[NormalizedRecord], key: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get_str(key))
        .map(str::to_string)
        .collect()
}

impl DeviceHub {
    /// All drivers the hub supports.
    pub async fn list_drivers(&self, conn: &Connection) -> Result<Envelope> {
        let outcome: Result<DriverListing> = async {
            let drivers = self.catalog.list_drivers(conn).await?;
            let records = shape_drivers(&drivers);
            tracing::info!("Retrieved {} drivers from hub", records.len());

            Ok(DriverListing {
                count: records.len(),
                driver_names: names(&records, "name"),
                drivers: records,
            })
        }
        .await;

        conclude(
            "retrieving driver list",
            outcome,
            FailureReason::RetrievalFailed,
            json!({"count": 0, "drivers": []}),
        )
    }

    /// Configured devices, optionally narrowed to one driver.
    pub async fn list_devices(&self, conn: &Connection, args: ListDevicesArgs) -> Result<Envelope> {
        let outcome: Result<DeviceListing> = async {
            let filter = optional(&args.filter_by_driver);
            let devices = self.catalog.list_devices(conn).await?;
            let records = shape_devices(&devices, filter);
            tracing::info!(
                fetched = devices.len(),
                "Retrieved {} devices from hub",
                records.len()
            );

            Ok(DeviceListing {
                count: records.len(),
                summary: DeviceSummary {
                    by_driver: group_counts(&records, "driver"),
                },
                devices: records,
                filters_applied: filter.map(|driver| DeviceFilters {
                    driver: driver.to_string(),
                }),
            })
        }
        .await;

        conclude(
            "retrieving devices",
            outcome,
            FailureReason::RetrievalFailed,
            json!({"count": 0, "devices": []}),
        )
    }

    /// Tags of one device, with register-level detail.
    pub async fn list_device_tags(&self, conn: &Connection, args: DeviceTagsArgs) -> Result<Envelope> {
        let outcome: Result<DeviceTagListing> = async {
            let device_name = required(&args.device_name, "device_name")?;
            let device = require_device(self.catalog.as_ref(), conn, device_name).await?;
            let tags = self.catalog.list_device_tags(conn, &device).await?;
            let records = shape_device_tags(&tags);
            tracing::info!("Retrieved {} tags for device '{}'", records.len(), device_name);

            Ok(DeviceTagListing {
                device_name: device_name.to_string(),
                count: records.len(),
                tag_names: names(&records, "tag_name"),
                tags: records,
            })
        }
        .await;

        conclude(
            "retrieving tags",
            outcome,
            FailureReason::RetrievalFailed,
            json!({"count": 0, "tags": []}),
        )
    }

    /// Tags across every device on the hub.
    pub async fn list_all_tags(&self, conn: &Connection, args: ListAllTagsArgs) -> Result<Envelope> {
        let outcome: Result<TagListing> = async {
            let filter = optional(&args.device_name);
            let tags = self.catalog.list_all_tags(conn).await?;
            let records = shape_all_tags(&tags, filter);
            tracing::info!("Retrieved {} tags from hub", records.len());

            Ok(TagListing {
                count: records.len(),
                summary: TagSummary {
                    by_device: group_counts(&records, "device"),
                },
                tags: records,
                filters_applied: filter.map(|name| TagFilters {
                    device_name: name.to_string(),
                }),
            })
        }
        .await;

        conclude(
            "retrieving all tags",
            outcome,
            FailureReason::RetrievalFailed,
            json!({"count": 0, "tags": []}),
        )
    }
}
