//! Identifier resolver: name/id to exactly one hub record.
//!
//! Every lookup fetches the collection fresh and scans it linearly. The first
//! exact match wins; there is no case folding or fuzzy matching.

use crate::hub::{CatalogGateway, Connection, Device, Tag};
use crate::types::{Error, Result, TagId};

/// Remediation hint attached to unknown-device errors.
pub const DEVICE_DISCOVERY_HINT: &str = "Use list_devices to see available devices.";
/// Remediation hint attached to missing tag identifiers.
pub const TAG_DISCOVERY_HINT: &str = "Use list_device_tags to see available tags.";

/// Identifies a single tag on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSelector {
    Name(String),
    Id(TagId),
}

impl TagSelector {
    /// Build a selector from optional arguments. A non-empty name takes
    /// precedence over an id when both are given.
    pub fn from_args(tag_name: Option<&str>, tag_id: Option<&str>) -> Option<Self> {
        let tag_name = tag_name.filter(|s| !s.is_empty());
        let tag_id = tag_id.filter(|s| !s.is_empty());
        match (tag_name, tag_id) {
            (Some(name), Some(id)) => {
                tracing::debug!(tag_name = name, ignored_tag_id = id, "Both tag_name and tag_id supplied; using tag_name");
                Some(TagSelector::Name(name.to_string()))
            }
            (Some(name), None) => Some(TagSelector::Name(name.to_string())),
            (None, Some(id)) => Some(TagSelector::Id(TagId::from(id))),
            (None, None) => None,
        }
    }

    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            TagSelector::Name(name) => tag.tag_name == *name,
            TagSelector::Id(id) => tag.has_id(id),
        }
    }

    /// Human-readable form used in messages: `name 'Temp'` / `ID 't1'`.
    pub fn describe(&self) -> String {
        match self {
            TagSelector::Name(name) => format!("name '{}'", name),
            TagSelector::Id(id) => format!("ID '{}'", id),
        }
    }
}

/// Which tags a batch operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagTargets {
    Ids(Vec<TagId>),
    One(TagSelector),
}

/// First device whose name equals `name`.
pub async fn find_device(
    catalog: &dyn CatalogGateway,
    conn: &Connection,
    name: &str,
) -> Result<Option<Device>> {
    let devices = catalog.list_devices(conn).await?;
    Ok(devices.into_iter().find(|d| d.name == name))
}

/// Like [`find_device`], but an unknown name is a validation error.
pub async fn require_device(
    catalog: &dyn CatalogGateway,
    conn: &Connection,
    name: &str,
) -> Result<Device> {
    find_device(catalog, conn, name).await?.ok_or_else(|| {
        Error::validation(format!(
            "Device '{}' not found. {}",
            name, DEVICE_DISCOVERY_HINT
        ))
    })
}

/// First tag on `device` matching `selector`.
pub async fn find_tag(
    catalog: &dyn CatalogGateway,
    conn: &Connection,
    device: &Device,
    selector: &TagSelector,
) -> Result<Option<Tag>> {
    let tags = catalog.list_device_tags(conn, device).await?;
    Ok(tags.into_iter().find(|t| selector.matches(t)))
}

/// All tags on `device` matching `targets`; unmatched identifiers are skipped.
pub async fn find_tags(
    catalog: &dyn CatalogGateway,
    conn: &Connection,
    device: &Device,
    targets: &TagTargets,
) -> Result<Vec<Tag>> {
    let tags = catalog.list_device_tags(conn, device).await?;
    Ok(select_tags(&tags, targets))
}

/// Pick the targeted tags out of a fetched collection, in request order.
/// Repeated ids resolve once.
pub fn select_tags(tags: &[Tag], targets: &TagTargets) -> Vec<Tag> {
    match targets {
        TagTargets::One(selector) => tags
            .iter()
            .find(|t| selector.matches(t))
            .cloned()
            .into_iter()
            .collect(),
        TagTargets::Ids(ids) => {
            let mut selected: Vec<Tag> = Vec::with_capacity(ids.len());
            for id in ids {
                if selected.iter().any(|t| t.has_id(id)) {
                    continue;
                }
                if let Some(tag) = tags.iter().find(|t| t.has_id(id)) {
                    selected.push(tag.clone());
                }
            }
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{Driver, InMemoryHub};
    use crate::types::DeviceId;

    fn tag(name: &str, id: &str) -> Tag {
        let mut tag = Tag::new(DeviceId::from("d1"), name, "float64");
        tag.id = Some(TagId::from(id));
        tag
    }

    #[test]
    fn test_selector_prefers_name() {
        let selector = TagSelector::from_args(Some("Temp"), Some("t9")).unwrap();
        assert_eq!(selector, TagSelector::Name("Temp".into()));
        assert_eq!(
            TagSelector::from_args(Some(""), Some("t9")),
            Some(TagSelector::Id(TagId::from("t9")))
        );
        assert_eq!(TagSelector::from_args(None, None), None);
    }

    #[test]
    fn test_select_skips_unknown_ids() {
        let tags = vec![tag("A", "a"), tag("B", "b"), tag("C", "c")];
        let targets = TagTargets::Ids(vec![
            TagId::from("a"),
            TagId::from("zzz"),
            TagId::from("c"),
            TagId::from("a"),
        ]);

        let names: Vec<String> = select_tags(&tags, &targets)
            .into_iter()
            .map(|t| t.tag_name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_first_match_wins() {
        let tags = vec![tag("Dup", "first"), tag("Dup", "second")];
        let selected = select_tags(&tags, &TagTargets::One(TagSelector::Name("Dup".into())));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, Some(TagId::from("first")));
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let tags = vec![tag("Temp", "t1")];
        let selected = select_tags(&tags, &TagTargets::One(TagSelector::Name("temp".into())));
        assert!(selected.is_empty());
    }

    #[tokio::test]
    async fn test_require_device_unknown_mentions_discovery() {
        let hub = InMemoryHub::new();
        let conn = Connection::new("memory://", None);
        let err = require_device(&hub, &conn, "Ghost").await.unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("Device 'Ghost' not found"));
                assert!(msg.contains("list_devices"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_device_first_match() {
        let driver = Driver::new("ModbusTCP", "drv-1");
        let mut first = Device::from_driver("PLC1", &driver);
        first.id = Some(DeviceId::from("d1"));
        let mut second = first.clone();
        second.id = Some(DeviceId::from("d2"));

        let hub = InMemoryHub::new().with_device(first).with_device(second);
        let conn = Connection::new("memory://", None);
        let device = find_device(&hub, &conn, "PLC1").await.unwrap().unwrap();
        assert_eq!(device.id, Some(DeviceId::from("d1")));
    }
}
