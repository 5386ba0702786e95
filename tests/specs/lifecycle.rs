//! End-to-end lifecycle specs against a state-file-backed stub driver.

use crate::prelude::*;
use rack_adapters::ProcessCommandRunner;
use rack_core::{ServiceKey, ServiceStatus};
use rack_engine::{ActionError, ServiceController};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// A driver whose `ps` report is backed by a state file that `run` and
/// `stop` rewrite, with log chatter around every JSON payload.
const DRIVER_BODY: &str = r#"case "$2" in
  list)
    echo "Picked up JAVA_TOOL_OPTIONS: -Xmx64m"
    echo '[{"alias":"kafka","description":"Apache Kafka","aliasImplementation":"strimzi,redpanda"}]'
    ;;
  ps)
    echo "chatter before the payload"
    cat "$RACK_STATE_FILE"
    ;;
  run)
    echo '[{"alias":"kafka","description":"Apache Kafka","aliasImplementation":"strimzi"}]' > "$RACK_STATE_FILE"
    echo "provisioned $3"
    ;;
  stop)
    echo '[]' > "$RACK_STATE_FILE"
    ;;
  log)
    echo "log line for $3"
    ;;
  *)
    echo "unknown subcommand $2" >&2
    exit 2
    ;;
esac"#;

fn stateful_controller(dir: &TempDir) -> ServiceController<ProcessCommandRunner> {
    let state_file = dir.path().join("state.json");
    fs::write(&state_file, "[]\n").unwrap();

    let driver = stub_driver(dir, DRIVER_BODY);
    let mut config = stub_config(&driver);
    config
        .driver
        .env
        .insert("RACK_STATE_FILE".to_string(), state_file.display().to_string());
    ServiceController::new(config, ProcessCommandRunner::new())
}

async fn wait_for_status(
    controller: &ServiceController<ProcessCommandRunner>,
    key: &ServiceKey,
    expected: ServiceStatus,
) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if controller.service_state(key).status == expected {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "key {} never reached {}, stuck at {}",
            key,
            expected,
            controller.service_state(key).status
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn full_lifecycle_discover_start_observe_stop() {
    let dir = TempDir::new().unwrap();
    let controller = stateful_controller(&dir);
    let strimzi = ServiceKey::new("kafka:strimzi");

    controller.discover().await.unwrap();
    controller.refresh_running().await.unwrap();

    let view = controller.view();
    let kafka = view.service("kafka").unwrap();
    assert_eq!(kafka.status, ServiceStatus::Stopped);
    assert!(kafka.has_implementations());
    assert_eq!(kafka.implementations.len(), 2);

    controller.start(strimzi.clone()).await.unwrap();
    assert_eq!(
        controller.service_state(&strimzi).status,
        ServiceStatus::Starting
    );
    assert!(controller
        .service_state(&strimzi)
        .startup_output
        .unwrap()
        .contains("provisioned kafka:strimzi"));

    // the delayed confirmation poll reads the rewritten state file
    wait_for_status(&controller, &strimzi, ServiceStatus::Running).await;
    let view = controller.view();
    let kafka = view.service("kafka").unwrap();
    assert!(kafka.is_running());
    assert_eq!(
        kafka.implementation("strimzi").unwrap().status,
        ServiceStatus::Running
    );
    assert_eq!(
        kafka.implementation("redpanda").unwrap().status,
        ServiceStatus::Stopped
    );

    let logs = controller.logs(strimzi.clone()).await.unwrap();
    assert!(logs.contains("log line for kafka:strimzi"));

    controller.stop(strimzi.clone()).await.unwrap();
    wait_for_status(&controller, &strimzi, ServiceStatus::Stopped).await;

    controller.shutdown();
}

#[tokio::test]
async fn unreachable_container_runtime_is_classified() {
    let dir = TempDir::new().unwrap();
    let driver = stub_driver(
        &dir,
        "echo 'Could not find a valid Docker environment. Please see logs and check configuration' >&2\nexit 1",
    );
    let controller = ServiceController::new(stub_config(&driver), ProcessCommandRunner::new());

    let err = controller.start("kafka").await.unwrap_err();
    assert!(matches!(err, ActionError::Environment { .. }), "got: {}", err);
    assert!(!err.diagnostics().is_empty());
    assert_eq!(
        controller
            .service_state(&ServiceKey::new("kafka"))
            .status,
        ServiceStatus::Stopped
    );
}

#[tokio::test]
async fn background_poll_observes_externally_started_services() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("state.json");
    fs::write(&state_file, "[]\n").unwrap();

    let driver = stub_driver(&dir, DRIVER_BODY);
    let mut config = stub_config(&driver);
    config.poll_interval = Duration::from_millis(100);
    config
        .driver
        .env
        .insert("RACK_STATE_FILE".to_string(), state_file.display().to_string());
    let controller = ServiceController::new(config, ProcessCommandRunner::new());

    let handle = controller.spawn_poll_loop();
    let mut listener = controller.subscribe();

    // something outside this process starts kafka
    fs::write(
        &state_file,
        r#"[{"alias":"kafka","description":"Apache Kafka"}]"#,
    )
    .unwrap();

    assert!(listener.changed().await);
    wait_for_status(&controller, &ServiceKey::new("kafka"), ServiceStatus::Running).await;

    controller.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
