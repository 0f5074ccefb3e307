//! Mutation orchestrator: create/update/delete against the hub.
//!
//! Each operation is a single remote mutation preceded by fresh lookups.
//! Nothing is rolled back locally if the hub only partially applies a call.

use serde::Serialize;
use serde_json::{json, Value};

use super::args::{required, CreateDeviceArgs, CreateTagArgs, DeleteTagArgs, UpdateTagArgs};
use super::envelope::{conclude, Envelope, FailureReason};
use super::normalize::{normalize, FieldSpec, NormalizedRecord};
use super::resolve::{find_tag, find_tags, require_device, TagSelector, TagTargets};
use super::DeviceHub;
use crate::hub::{Connection, Device, Tag};
use crate::types::{Error, Result, TagId};

/// Guidance returned with every newly created device.
pub const DEVICE_NEXT_STEPS: [&str; 3] = [
    "Update connection properties (IP address, port, etc.)",
    "Configure tags/registers for data collection",
    "Enable the device to start communication",
];

#[derive(Debug, Clone, Serialize)]
pub struct DeviceCreated {
    pub device: NormalizedRecord,
    pub next_steps: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagChanged {
    pub device_name: String,
    pub tag: NormalizedRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsDeleted {
    pub device_name: String,
    pub deleted_count: usize,
    pub deleted_tags: Vec<String>,
}

/// Partial update of a tag. `None` leaves the current value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPatch {
    pub tag_name: Option<String>,
    pub value_type: Option<String>,
    pub description: Option<String>,
    pub properties: Option<Vec<Value>>,
    pub publish_cov: Option<bool>,
}

impl TagPatch {
    pub fn apply(self, tag: &mut Tag) {
        if let Some(tag_name) = self.tag_name {
            tag.tag_name = tag_name;
        }
        if let Some(value_type) = self.value_type {
            tag.value_type = Some(value_type);
        }
        if let Some(description) = self.description {
            tag.description = Some(description);
        }
        if let Some(properties) = self.properties {
            tag.properties = Some(properties);
        }
        if let Some(publish_cov) = self.publish_cov {
            tag.publish_cov = Some(publish_cov);
        }
    }
}

impl From<UpdateTagArgs> for TagPatch {
    fn from(args: UpdateTagArgs) -> Self {
        Self {
            tag_name: args.tag_name,
            value_type: args.value_type,
            description: args.description,
            properties: args.properties,
            publish_cov: args.publish_cov,
        }
    }
}

impl DeleteTagArgs {
    /// Which tags to delete: a non-empty `tag_ids` list wins over `tag_id`,
    /// which wins over `tag_name`.
    pub fn targets(&self) -> Option<TagTargets> {
        let ids: Vec<TagId> = self
            .tag_ids
            .iter()
            .flatten()
            .filter(|id| !id.is_empty())
            .map(|id| TagId::from(id.as_str()))
            .collect();
        if !ids.is_empty() {
            return Some(TagTargets::Ids(ids));
        }
        if let Some(id) = self.tag_id.as_deref().filter(|s| !s.is_empty()) {
            return Some(TagTargets::One(TagSelector::Id(TagId::from(id))));
        }
        self.tag_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|name| TagTargets::One(TagSelector::Name(name.to_string())))
    }
}

fn device_id_of(device: &Device) -> Result<crate::types::DeviceId> {
    device
        .id
        .clone()
        .ok_or_else(|| Error::internal(format!("Device '{}' has no id on the hub", device.name)))
}

impl DeviceHub {
    /// Create a device from a driver's default property template.
    pub async fn create_device(&self, conn: &Connection, args: CreateDeviceArgs) -> Result<Envelope> {
        let outcome: Result<DeviceCreated> = async {
            let name = required(&args.name, "name")?;
            let selected_driver = required(&args.selected_driver, "selected_driver")?;

            let drivers = self.catalog.list_drivers(conn).await?;
            let Some(driver) = drivers.iter().find(|d| d.name == selected_driver) else {
                let known: Vec<&str> = drivers.iter().map(|d| d.name.as_str()).collect();
                return Err(Error::validation(format!(
                    "Driver '{}' not found. Available drivers: {:?}",
                    selected_driver, known
                )));
            };
            if driver.id.is_none() {
                return Err(Error::internal(format!(
                    "Driver '{}' has no id on the hub",
                    driver.name
                )));
            }

            let created = self
                .catalog
                .create_device(conn, Device::from_driver(name, driver))
                .await?;
            tracing::info!("Created device '{}' with driver '{}'", name, selected_driver);

            Ok(DeviceCreated {
                device: normalize(&created, FieldSpec::Device),
                next_steps: DEVICE_NEXT_STEPS.to_vec(),
            })
        }
        .await;

        conclude("creating device", outcome, FailureReason::CreationFailed, json!({}))
    }

    /// Create one tag on a device.
    pub async fn create_tag(&self, conn: &Connection, args: CreateTagArgs) -> Result<Envelope> {
        let outcome: Result<TagChanged> = async {
            let device_name = required(&args.device_name, "device_name")?;
            let tag_name = required(&args.tag_name, "tag_name")?;
            let value_type = required(&args.value_type, "value_type")?;

            let device = require_device(self.catalog.as_ref(), conn, device_name).await?;

            let mut tag = Tag::new(device_id_of(&device)?, tag_name, value_type);
            tag.description = args.description.clone();
            tag.properties = Some(args.properties.clone().unwrap_or_default());
            tag.publish_cov = Some(args.publish_cov.unwrap_or(false));

            let created = self
                .catalog
                .create_tags(conn, vec![tag])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::internal("Tag creation returned no results"))?;
            tracing::info!("Created tag '{}' on device '{}'", tag_name, device_name);

            Ok(TagChanged {
                device_name: device_name.to_string(),
                tag: normalize(&created, FieldSpec::TagSummary),
            })
        }
        .await;

        conclude("creating tag", outcome, FailureReason::CreationFailed, json!({}))
    }

    /// Partially update a tag addressed by id.
    pub async fn update_tag(&self, conn: &Connection, args: UpdateTagArgs) -> Result<Envelope> {
        let outcome: Result<TagChanged> = async {
            let device_name = required(&args.device_name, "device_name")?.to_string();
            let tag_id = args
                .tag_id
                .clone()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::validation("'tag_id' parameter is required for updates"))?;

            let device = require_device(self.catalog.as_ref(), conn, &device_name).await?;
            let selector = TagSelector::Id(TagId::from(tag_id.as_str()));
            let mut tag = find_tag(self.catalog.as_ref(), conn, &device, &selector)
                .await?
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Tag with ID '{}' not found on device '{}'",
                        tag_id, device_name
                    ))
                })?;

            TagPatch::from(args.clone()).apply(&mut tag);

            let updated = self
                .catalog
                .update_tags(conn, vec![tag])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::internal("Tag update returned no results"))?;
            tracing::info!("Updated tag '{}' on device '{}'", tag_id, device_name);

            Ok(TagChanged {
                device_name,
                tag: normalize(&updated, FieldSpec::TagSummary),
            })
        }
        .await;

        conclude("updating tag", outcome, FailureReason::UpdateFailed, json!({}))
    }

    /// Delete one or many tags. Identifiers that match nothing are skipped.
    pub async fn delete_tag(&self, conn: &Connection, args: DeleteTagArgs) -> Result<Envelope> {
        let outcome: Result<TagsDeleted> = async {
            let device_name = required(&args.device_name, "device_name")?;
            let targets = args.targets().ok_or_else(|| {
                Error::validation("Either 'tag_name', 'tag_id', or 'tag_ids' is required")
            })?;

            let device = require_device(self.catalog.as_ref(), conn, device_name).await?;
            let doomed = find_tags(self.catalog.as_ref(), conn, &device, &targets).await?;

            match doomed.as_slice() {
                [] => return Err(Error::validation("No matching tags found to delete")),
                [single] => self.catalog.delete_tag(conn, single).await?,
                many => self.catalog.delete_tags(conn, many).await?,
            }
            tracing::info!("Deleted {} tag(s) from device '{}'", doomed.len(), device_name);

            Ok(TagsDeleted {
                device_name: device_name.to_string(),
                deleted_count: doomed.len(),
                deleted_tags: doomed.into_iter().map(|t| t.tag_name).collect(),
            })
        }
        .await;

        conclude(
            "deleting tag(s)",
            outcome,
            FailureReason::DeletionFailed,
            json!({"deleted_count": 0, "deleted_tags": []}),
        )
    }
}
