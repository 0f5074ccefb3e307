//! Tag value resolver: live reading of a tag through its output topic.

use serde::Serialize;
use serde_json::{json, Value};

use super::args::{optional, required, ReadTagValueArgs};
use super::envelope::{conclude, Envelope, FailureReason};
use super::resolve::{find_tag, require_device, TagSelector, TAG_DISCOVERY_HINT};
use super::DeviceHub;
use crate::hub::Connection;
use crate::types::{Error, Result, TagId};

#[derive(Debug, Clone, Serialize)]
pub struct TagValue {
    pub device_name: String,
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
    /// Payload of the live value subsystem, unmodified.
    pub data: Value,
}

impl DeviceHub {
    /// Current value of a tag, addressed by name or id.
    pub async fn read_tag_value(&self, conn: &Connection, args: ReadTagValueArgs) -> Result<Envelope> {
        let outcome: Result<TagValue> = async {
            let device_name = required(&args.device_name, "device_name")?;
            let selector = TagSelector::from_args(optional(&args.tag_name), optional(&args.tag_id))
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Either 'tag_name' or 'tag_id' is required. {}",
                        TAG_DISCOVERY_HINT
                    ))
                })?;

            let device = require_device(self.catalog.as_ref(), conn, device_name).await?;
            let tag = find_tag(self.catalog.as_ref(), conn, &device, &selector)
                .await?
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Tag with {} not found on device '{}'",
                        selector.describe(),
                        device_name
                    ))
                })?;

            // A readable tag always has an output channel; its absence is a hub misconfiguration.
            let topic = tag.output_topic().ok_or_else(|| {
                Error::internal(format!("No output topic found for tag {}", selector.describe()))
            })?;

            let data = self.live.current_value(conn, topic).await?;
            tracing::info!(topic, "Read value for tag {} on device '{}'", selector.describe(), device_name);

            Ok(TagValue {
                device_name: device_name.to_string(),
                tag_name: tag.tag_name.clone(),
                tag_id: tag.id.clone(),
                data,
            })
        }
        .await;

        conclude("reading tag value", outcome, FailureReason::ReadFailed, json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{
        Device, Driver, MockCatalogGateway, MockLiveValueSource, Tag, Topic, TopicDirection,
    };
    use crate::observability::AlertCounter;
    use crate::types::DeviceId;
    use std::sync::Arc;

    fn conn() -> Connection {
        Connection::new("memory://", None)
    }

    fn catalog_with(tag: Tag) -> MockCatalogGateway {
        let mut catalog = MockCatalogGateway::new();
        catalog.expect_list_devices().returning(|_| {
            let mut device = Device::from_driver("PLC1", &Driver::new("ModbusTCP", "drv-1"));
            device.id = Some(DeviceId::from("d1"));
            Ok(vec![device])
        });
        catalog
            .expect_list_device_tags()
            .returning(move |_, _| Ok(vec![tag.clone()]));
        catalog
    }

    fn temp_tag(direction: TopicDirection) -> Tag {
        let mut tag = Tag::new(DeviceId::from("d1"), "Temp", "float64");
        tag.id = Some(TagId::from("t1"));
        tag.topics = vec![Topic {
            topic: "devicehub.d1.t1".into(),
            direction,
        }];
        tag
    }

    #[tokio::test]
    async fn test_reads_output_topic_by_id() {
        let mut live = MockLiveValueSource::new();
        live.expect_current_value()
            .withf(|_, topic| topic == "devicehub.d1.t1")
            .returning(|_, _| Ok(json!({"value": 21.5, "timestamp": 1})));

        let hub = DeviceHub::new(
            Arc::new(catalog_with(temp_tag(TopicDirection::Output))),
            Arc::new(live),
        );
        let envelope = hub
            .read_tag_value(
                &conn(),
                ReadTagValueArgs {
                    device_name: Some("PLC1".into()),
                    tag_id: Some("t1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            envelope.data(),
            &json!({
                "device_name": "PLC1",
                "tag_name": "Temp",
                "tag_id": "t1",
                "data": {"value": 21.5, "timestamp": 1},
            })
        );
    }

    #[tokio::test]
    async fn test_input_only_tag_is_system_error() {
        let mut live = MockLiveValueSource::new();
        live.expect_current_value().never();

        let hub = DeviceHub::new(
            Arc::new(catalog_with(temp_tag(TopicDirection::Input))),
            Arc::new(live),
        );
        let err = hub
            .read_tag_value(
                &conn(),
                ReadTagValueArgs {
                    device_name: Some("PLC1".into()),
                    tag_name: Some("Temp".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_input_only_tag_leaves_log_trace() {
        let alerts = AlertCounter::default();
        let _guard = alerts.install();

        let hub = DeviceHub::new(
            Arc::new(catalog_with(temp_tag(TopicDirection::Input))),
            Arc::new(MockLiveValueSource::new()),
        );
        let err = hub
            .read_tag_value(
                &conn(),
                ReadTagValueArgs {
                    device_name: Some("PLC1".into()),
                    tag_name: Some("Temp".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "internal error: No output topic found for tag name 'Temp'"
        );
        assert_eq!(alerts.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_identifiers_rejected_before_lookup() {
        let mut catalog = MockCatalogGateway::new();
        catalog.expect_list_devices().never();
        let hub = DeviceHub::new(Arc::new(catalog), Arc::new(MockLiveValueSource::new()));

        let err = hub
            .read_tag_value(
                &conn(),
                ReadTagValueArgs {
                    device_name: Some("PLC1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("list_device_tags"));
    }

    #[tokio::test]
    async fn test_live_value_failure_becomes_read_failed() {
        let mut live = MockLiveValueSource::new();
        live.expect_current_value()
            .returning(|_, _| Err(Error::timeout("value subsystem did not answer")));

        let hub = DeviceHub::new(
            Arc::new(catalog_with(temp_tag(TopicDirection::Output))),
            Arc::new(live),
        );
        let envelope = hub
            .read_tag_value(
                &conn(),
                ReadTagValueArgs {
                    device_name: Some("PLC1".into()),
                    tag_name: Some("Temp".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(envelope.reason(), Some(FailureReason::ReadFailed));
    }
}
