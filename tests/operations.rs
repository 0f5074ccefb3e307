//! Library-level scenarios against the in-memory hub.

use devicehub_core::devicehub::{
    CreateDeviceArgs, CreateTagArgs, DeleteTagArgs, DeviceTagsArgs, ListAllTagsArgs,
    ListDevicesArgs, ReadTagValueArgs, UpdateTagArgs, DEVICE_NEXT_STEPS,
};
use devicehub_core::hub::{
    ConfigConnectionProvider, Connection, ConnectionProvider, Device, Driver, InMemoryHub,
    RequestContext, Tag, Topic, TopicDirection,
};
use devicehub_core::types::{DeviceId, HubConfig, TagId};
use devicehub_core::{DeviceHub, Error, FailureReason};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn conn() -> Connection {
    let provider = ConfigConnectionProvider::new(HubConfig {
        endpoint: Some("memory://edge".into()),
        ..Default::default()
    });
    provider.connect(&RequestContext::new()).unwrap()
}

fn plc(name: &str, id: &str, driver: &Driver) -> Device {
    let mut device = Device::from_driver(name, driver);
    device.id = Some(DeviceId::from(id));
    device
}

fn tag(device: &str, name: &str, id: &str) -> Tag {
    let mut tag = Tag::new(DeviceId::from(device), name, "Float");
    tag.id = Some(TagId::from(id));
    tag.topics = vec![Topic {
        topic: format!("devicehub.{}.{}", device, id),
        direction: TopicDirection::Output,
    }];
    tag
}

/// Two drivers, two devices, three tags on PLC1 and one on PLC2.
fn plant() -> Arc<InMemoryHub> {
    let modbus = Driver::new("ModbusTCP", "drv-modbus");
    let opcua = Driver::new("OPC-UA", "drv-opcua");
    Arc::new(
        InMemoryHub::new()
            .with_device(plc("PLC1", "dev-1", &modbus))
            .with_device(plc("PLC2", "dev-2", &opcua))
            .with_driver(modbus)
            .with_driver(opcua)
            .with_tag(tag("dev-1", "Temp", "t-temp"))
            .with_tag(tag("dev-1", "Flow", "t-flow"))
            .with_tag(tag("dev-1", "Level", "t-level"))
            .with_tag(tag("dev-2", "Speed", "t-speed")),
    )
}

fn names(data: &Value, key: &str) -> Vec<String> {
    data[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["tag_name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_device_and_filter_listing() {
    let hub = DeviceHub::in_memory(plant());
    let conn = conn();

    let created = hub
        .create_device(
            &conn,
            CreateDeviceArgs {
                name: Some("PLC3".into()),
                selected_driver: Some("ModbusTCP".into()),
            },
        )
        .await
        .unwrap();
    assert!(created.is_success());
    assert_eq!(created.data()["device"]["driver"], "drv-modbus");
    assert_eq!(created.data()["next_steps"], json!(DEVICE_NEXT_STEPS));

    let listing = hub
        .list_devices(
            &conn,
            ListDevicesArgs {
                filter_by_driver: Some("drv-modbus".into()),
            },
        )
        .await
        .unwrap();
    let data = listing.data();
    assert_eq!(data["count"], 2);
    assert_eq!(data["devices"][0]["name"], "PLC1");
    assert_eq!(data["devices"][1]["name"], "PLC3");
    assert_eq!(data["summary"]["by_driver"], json!({"drv-modbus": 2}));
    assert_eq!(data["filters_applied"], json!({"driver": "drv-modbus"}));
}

#[tokio::test]
async fn test_unknown_driver_lists_available() {
    let hub = DeviceHub::in_memory(plant());
    let err = hub
        .create_device(
            &conn(),
            CreateDeviceArgs {
                name: Some("PLC3".into()),
                selected_driver: Some("Profinet".into()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    let message = err.to_string();
    assert!(message.contains("Driver 'Profinet' not found"));
    assert!(message.contains("ModbusTCP"));
    assert!(message.contains("OPC-UA"));
}

#[tokio::test]
async fn test_create_tag_defaults() {
    let memory = plant();
    let hub = DeviceHub::in_memory(memory.clone());

    let envelope = hub
        .create_tag(
            &conn(),
            CreateTagArgs {
                device_name: Some("PLC1".into()),
                tag_name: Some("Pressure".into()),
                value_type: Some("Float".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let data = envelope.data();
    assert_eq!(data["device_name"], "PLC1");
    assert_eq!(data["tag"]["tag_name"], "Pressure");
    assert_eq!(data["tag"]["device"], "dev-1");
    assert_eq!(data["tag"]["value_type"], "Float");
    assert_eq!(data["tag"]["publish_cov"], false);
    assert!(data["tag"].get("description").is_none());

    let stored = memory.snapshot().await;
    let pressure = stored.tags.iter().find(|t| t.tag_name == "Pressure").unwrap();
    assert_eq!(pressure.properties, Some(vec![]));
}

#[tokio::test]
async fn test_update_tag_changes_only_supplied_fields() {
    let memory = plant();
    let hub = DeviceHub::in_memory(memory.clone());

    let envelope = hub
        .update_tag(
            &conn(),
            UpdateTagArgs {
                device_name: Some("PLC1".into()),
                tag_id: Some("t-flow".into()),
                description: Some("Inlet flow".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let tag = &envelope.data()["tag"];
    assert_eq!(tag["tag_name"], "Flow");
    assert_eq!(tag["value_type"], "Float");
    assert_eq!(tag["description"], "Inlet flow");

    let stored = memory.snapshot().await;
    let flow = stored.tags.iter().find(|t| t.tag_name == "Flow").unwrap();
    assert_eq!(flow.description.as_deref(), Some("Inlet flow"));
    assert_eq!(flow.device, Some(DeviceId::from("dev-1")));
}

#[tokio::test]
async fn test_update_unknown_tag_id() {
    let hub = DeviceHub::in_memory(plant());
    let err = hub
        .update_tag(
            &conn(),
            UpdateTagArgs {
                device_name: Some("PLC1".into()),
                tag_id: Some("t-speed".into()),
                tag_name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Tag with ID 't-speed' not found on device 'PLC1'"));
}

#[tokio::test]
async fn test_batch_delete_skips_unknown_ids() {
    let memory = plant();
    let hub = DeviceHub::in_memory(memory.clone());

    let envelope = hub
        .delete_tag(
            &conn(),
            DeleteTagArgs {
                device_name: Some("PLC1".into()),
                tag_ids: Some(vec!["t-level".into(), "missing".into(), "t-temp".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        envelope.data(),
        &json!({
            "device_name": "PLC1",
            "deleted_count": 2,
            "deleted_tags": ["Level", "Temp"],
        })
    );

    let remaining: Vec<String> = memory
        .snapshot()
        .await
        .tags
        .into_iter()
        .map(|t| t.tag_name)
        .collect();
    assert_eq!(remaining, vec!["Flow", "Speed"]);
}

#[tokio::test]
async fn test_delete_nothing_matched() {
    let hub = DeviceHub::in_memory(plant());
    let err = hub
        .delete_tag(
            &conn(),
            DeleteTagArgs {
                device_name: Some("PLC1".into()),
                tag_name: Some("Speed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "validation error: No matching tags found to delete");
}

#[tokio::test]
async fn test_device_tags_sorted() {
    let hub = DeviceHub::in_memory(plant());
    let envelope = hub
        .list_device_tags(
            &conn(),
            DeviceTagsArgs {
                device_name: Some("PLC1".into()),
            },
        )
        .await
        .unwrap();

    let data = envelope.data();
    assert_eq!(data["count"], 3);
    assert_eq!(data["tag_names"], json!(["Flow", "Level", "Temp"]));
    assert_eq!(names(data, "tags"), vec!["Flow", "Level", "Temp"]);
}

#[tokio::test]
async fn test_all_tags_grouped_and_filtered() {
    let hub = DeviceHub::in_memory(plant());
    let conn = conn();

    let all = hub.list_all_tags(&conn, ListAllTagsArgs::default()).await.unwrap();
    let data = all.data();
    assert_eq!(data["count"], 4);
    assert_eq!(data["summary"]["by_device"], json!({"dev-1": 3, "dev-2": 1}));
    assert_eq!(names(data, "tags"), vec!["Flow", "Level", "Temp", "Speed"]);
    assert!(data.get("filters_applied").is_none());

    let filtered = hub
        .list_all_tags(
            &conn,
            ListAllTagsArgs {
                device_name: Some("PLC2".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.data()["count"], 1);
    assert_eq!(filtered.data()["filters_applied"], json!({"device_name": "PLC2"}));
}

#[tokio::test]
async fn test_read_published_value() {
    let memory = plant();
    let hub = DeviceHub::in_memory(memory.clone());
    let conn = conn();

    let created = hub
        .create_tag(
            &conn,
            CreateTagArgs {
                device_name: Some("PLC2".into()),
                tag_name: Some("Torque".into()),
                value_type: Some("Float".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let tag_id = created.data()["tag"]["id"].as_str().unwrap().to_string();

    memory
        .publish(format!("devicehub.dev-2.{}", tag_id), json!(12.5))
        .await;

    let read = hub
        .read_tag_value(
            &conn,
            ReadTagValueArgs {
                device_name: Some("PLC2".into()),
                tag_name: Some("Torque".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let data = read.data();
    assert_eq!(data["tag_name"], "Torque");
    assert_eq!(data["tag_id"], tag_id.as_str());
    assert_eq!(data["data"]["value"], 12.5);
    assert!(data["data"]["timestamp"].is_i64());
}

#[tokio::test]
async fn test_read_before_publish_is_envelope() {
    let hub = DeviceHub::in_memory(plant());
    let read = hub
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

    assert!(!read.is_success());
    assert_eq!(read.reason(), Some(FailureReason::ReadFailed));
    assert_eq!(read.data(), &json!({}));
}
