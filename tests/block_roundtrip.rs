//! ---
//! spark_section: "15-testing-qa-runbook"
//! spark_subsection: "integration-tests"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Cross-crate tests for block encoding and persistence."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use spark_codec::{decode, ObjectType};
use spark_common::AppConfig;
use spark_datastore::{BlockRecord, BlockStore, DataStore, FileDataStore};
use spark_proto::{decode_checked, Pid, PidPersisted};

fn workspace_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(relative)
}

#[test]
fn shipped_config_parses_with_defaults() {
    let raw = std::fs::read_to_string(workspace_file("configs/spark.toml")).unwrap();
    let config: AppConfig = raw.parse().unwrap();
    assert_eq!(config.service.name, "spark");
    assert_eq!(config.datastore.action_timeout, Duration::from_secs(5));
    assert_eq!(config.datastore.retry_interval, Duration::from_secs(1));
    assert_ne!(config.database_path(false), config.database_path(true));
}

#[tokio::test]
async fn blocks_survive_store_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config: AppConfig = format!(
        "[datastore]\ndatabase = \"{}\"\nsystem_database = \"{}\"\n",
        dir.path().join("db.json").display(),
        dir.path().join("sys.json").display()
    )
    .parse()
    .unwrap();

    let open = || {
        FileDataStore::new(config.database_path(false), config.datastore.read_only)
            .with_action_timeout(config.datastore.action_timeout)
    };

    let blocks = BlockStore::new(open());
    blocks.store().start().await.unwrap();
    blocks
        .save(BlockRecord::new(
            "sensor-1",
            ObjectType::ONE_WIRE_TEMP_SENSOR,
            json!({"settings": {"address": "KP7p/ggAABc=", "offset": 0}}),
        ))
        .await
        .unwrap();
    blocks
        .save(BlockRecord::new(
            "kettle-pid",
            ObjectType::PID,
            json!({
                "settings": {"kp": 25, "ti": 600, "enabled": true},
                "state": {"inputValue": 1500, "outputValue": 80},
                "links": {"input": "KP7p/ggAABc="}
            }),
        ))
        .await
        .unwrap();
    blocks.store().close().await.unwrap();

    let reopened = BlockStore::new(open());
    reopened.store().start().await.unwrap();
    let listed = reopened.list().await.unwrap();
    assert_eq!(
        listed.iter().map(|r| r.service_id.as_str()).collect::<Vec<_>>(),
        vec!["sensor-1", "kettle-pid"]
    );

    let sensor_bytes = reopened.encoded("sensor-1").await.unwrap().unwrap();
    assert_eq!(
        decode(ObjectType::ONE_WIRE_TEMP_SENSOR, &sensor_bytes).unwrap(),
        json!({"settings": {"address": "KP7p/ggAABc="}})
    );

    // The stored PID has no runtime state left to send back.
    let pid_bytes = reopened.encoded("kettle-pid").await.unwrap().unwrap();
    let pid: Pid = decode_checked(&pid_bytes[1..]).unwrap();
    assert!(pid.state.is_none());
    let persisted: PidPersisted = decode_checked(&pid_bytes[1..]).unwrap();
    assert_eq!(pid.to_persisted(), persisted);
    assert_eq!(persisted.settings.map(|s| s.kp), Some(25));

    reopened.store().close().await.unwrap();
}

#[tokio::test]
async fn second_block_with_same_id_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    let blocks = BlockStore::new(FileDataStore::new(dir.path().join("db.json"), false));
    blocks.store().start().await.unwrap();

    for value in [10, 20] {
        blocks
            .save(BlockRecord::new(
                "setpoint",
                ObjectType::TEMPERATURE,
                json!({ "value": value }),
            ))
            .await
            .unwrap();
    }
    let all = blocks.store().all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["obj"], json!({"value": 20}));

    blocks.store().close().await.unwrap();
}
