use std::sync::Arc;

use serial_test::serial;
use temp_env::with_vars;
use tokio::sync::watch;

use super::NodeBuilder;
use crate::FaultInjectorConfig;
use crate::FaultRegistry;
use crate::FaultRequest;
use crate::FaultType;
use crate::Outcome;

fn test_config() -> FaultInjectorConfig {
    let mut config = FaultInjectorConfig::default();
    config.control.listen_address = "127.0.0.1:0".parse().unwrap();
    config.faults.push(FaultRequest {
        start_from: Some(2),
        ..FaultRequest::new("dcs_write", FaultType::Exception)
    });
    config
}

fn no_fault_env() -> Vec<(&'static str, Option<&'static str>)> {
    vec![("FAULT_POINT", None)]
}

#[tokio::test]
#[serial]
async fn build_arms_configured_faults() {
    let (_tx, rx) = watch::channel(());
    let node = with_vars(no_fault_env(), || {
        NodeBuilder::new(test_config(), rx).build().unwrap().ready().unwrap()
    });

    assert_eq!(node.name, "postgres0");
    assert!(node.registry.is_active("dcs_write"));
    assert_eq!(node.registry.hit("dcs_write"), Outcome::Continue);
    assert_eq!(node.registry.hit("dcs_write"), Outcome::RaiseFault);
}

#[tokio::test]
#[serial]
async fn build_arms_fault_from_environment() {
    let (_tx, rx) = watch::channel(());
    let node = with_vars(
        vec![
            ("FAULT_POINT", Some("promote")),
            ("FAULT_TYPE", Some("marker")),
        ],
        || NodeBuilder::new(test_config(), rx).build().unwrap().ready().unwrap(),
    );

    assert!(node.registry.is_active("promote"));
    assert!(node.registry.is_active("dcs_write"));
}

#[tokio::test]
#[serial]
async fn build_shares_supplied_registry() {
    let registry = Arc::new(FaultRegistry::new());
    let (_tx, rx) = watch::channel(());
    let node = with_vars(no_fault_env(), || {
        NodeBuilder::new(test_config(), rx)
            .registry(registry.clone())
            .build()
            .unwrap()
            .ready()
            .unwrap()
    });

    assert!(Arc::ptr_eq(&registry, &node.registry));
    assert!(Arc::ptr_eq(&registry, node.controller.registry()));
    assert!(registry.is_active("dcs_write"));
}

#[tokio::test]
#[serial]
async fn build_fails_on_invalid_startup_fault() {
    let mut config = test_config();
    config
        .faults
        .push(FaultRequest::new("promote", FaultType::Sleep));
    let (_tx, rx) = watch::channel(());

    let result = with_vars(no_fault_env(), || NodeBuilder::new(config, rx).build());
    assert!(result.is_err());
}

#[test]
fn ready_without_build_fails() {
    let (_tx, rx) = watch::channel(());
    assert!(NodeBuilder::new(test_config(), rx).ready().is_err());
}

#[tokio::test]
#[serial]
async fn start_control_server_binds_ephemeral_port() {
    let (tx, rx) = watch::channel(());
    let builder = with_vars(no_fault_env(), || {
        NodeBuilder::new(test_config(), rx).build().unwrap()
    })
    .start_control_server()
    .unwrap();

    let addr = builder.control_address().expect("control server bound");
    assert_ne!(addr.port(), 0);
    assert!(tokio::net::TcpStream::connect(addr).await.is_ok());
    tx.send(()).unwrap();
}

#[tokio::test]
#[serial]
async fn disabled_control_server_is_not_started() {
    let mut config = test_config();
    config.control.enabled = false;
    let (_tx, rx) = watch::channel(());
    let builder = with_vars(no_fault_env(), || NodeBuilder::new(config, rx).build().unwrap())
        .start_control_server()
        .unwrap();
    assert!(builder.control_address().is_none());
}
