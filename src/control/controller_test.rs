use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::Error;
use crate::FaultType;
use crate::Outcome;

fn controller() -> FaultController {
    FaultController::new(Arc::new(FaultRegistry::new()))
}

fn exception(
    name: &str,
    start_from: Option<u64>,
    end_after: Option<u64>,
) -> FaultRequest {
    FaultRequest {
        start_from,
        end_after,
        ..FaultRequest::new(name, FaultType::Exception)
    }
}

#[test]
fn inject_then_query_reports_active() {
    let ctl = controller();
    assert_eq!(
        ctl.handle(ControlCommand::Inject(exception("test_exception", Some(3), Some(4))))
            .unwrap(),
        ControlResponse::Ok
    );
    assert_eq!(
        ctl.handle(ControlCommand::Query {
            fault_name: "test_exception".to_string()
        })
        .unwrap(),
        ControlResponse::Status {
            fault_name: "test_exception".to_string(),
            active: true
        }
    );
}

#[test]
fn query_unknown_point_is_inactive_not_an_error() {
    let ctl = controller();
    assert_eq!(
        ctl.handle(ControlCommand::Query {
            fault_name: "unknown".to_string()
        })
        .unwrap(),
        ControlResponse::Status {
            fault_name: "unknown".to_string(),
            active: false
        }
    );
}

#[test]
fn sleep_request_is_converted_to_delay() {
    let ctl = controller();
    let request = FaultRequest {
        sleep_time: Some(42.0),
        ..FaultRequest::new("test_sleep", FaultType::Sleep)
    };
    ctl.handle(ControlCommand::Inject(request)).unwrap();
    assert_eq!(
        ctl.registry().hit("test_sleep"),
        Outcome::Delay(Duration::from_secs(42))
    );
}

#[test]
fn invalid_inject_is_rejected_and_state_unchanged() {
    let ctl = controller();

    let missing_sleep = FaultRequest::new("test_sleep", FaultType::Sleep);
    assert!(matches!(
        ctl.handle(ControlCommand::Inject(missing_sleep)),
        Err(Error::InvalidParameters(_))
    ));

    let negative_sleep = FaultRequest {
        sleep_time: Some(-1.0),
        ..FaultRequest::new("test_sleep", FaultType::Sleep)
    };
    assert!(matches!(
        ctl.handle(ControlCommand::Inject(negative_sleep)),
        Err(Error::InvalidParameters(_))
    ));

    assert!(matches!(
        ctl.handle(ControlCommand::Inject(exception("test_exception", Some(4), Some(3)))),
        Err(Error::InvalidParameters(_))
    ));

    assert_eq!(
        ctl.handle(ControlCommand::QueryAll).unwrap(),
        ControlResponse::Active {
            fault_names: vec![]
        }
    );
}

#[test]
fn deactivate_reports_previous_state() {
    let ctl = controller();
    ctl.handle(ControlCommand::Inject(exception("p", None, None)))
        .unwrap();

    assert_eq!(
        ctl.handle(ControlCommand::Deactivate {
            fault_name: "p".to_string()
        })
        .unwrap(),
        ControlResponse::Deactivated {
            fault_name: "p".to_string(),
            was_active: true
        }
    );
    assert_eq!(
        ctl.handle(ControlCommand::Deactivate {
            fault_name: "p".to_string()
        })
        .unwrap(),
        ControlResponse::Deactivated {
            fault_name: "p".to_string(),
            was_active: false
        }
    );
}

#[test]
fn deactivate_all_then_query_all_is_empty() {
    let ctl = controller();
    for name in ["a", "b", "c"] {
        ctl.handle(ControlCommand::Inject(exception(name, None, None)))
            .unwrap();
    }
    assert_eq!(
        ctl.handle(ControlCommand::QueryAll).unwrap(),
        ControlResponse::Active {
            fault_names: vec!["a".to_string(), "b".to_string(), "c".to_string()]
        }
    );

    assert_eq!(
        ctl.handle(ControlCommand::DeactivateAll).unwrap(),
        ControlResponse::Ok
    );
    assert_eq!(
        ctl.handle(ControlCommand::QueryAll).unwrap(),
        ControlResponse::Active {
            fault_names: vec![]
        }
    );
}

#[test]
fn describe_includes_hit_counts() {
    let ctl = controller();
    ctl.handle(ControlCommand::Inject(exception("p", Some(2), None)))
        .unwrap();
    ctl.registry().hit("p");

    match ctl.handle(ControlCommand::Describe).unwrap() {
        ControlResponse::Points { points } => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].fault_name, "p");
            assert_eq!(points[0].start_from, 2);
            assert_eq!(points[0].hits, 1);
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[test]
fn commands_use_snake_case_tags_on_the_wire() {
    let command: ControlCommand = serde_json::from_str(
        r#"{"command":"inject","fault_name":"test_exception","fault_type":"exception","start_from":3,"end_after":4}"#,
    )
    .unwrap();
    assert_eq!(
        command,
        ControlCommand::Inject(exception("test_exception", Some(3), Some(4)))
    );

    let command: ControlCommand =
        serde_json::from_str(r#"{"command":"deactivate_all"}"#).unwrap();
    assert_eq!(command, ControlCommand::DeactivateAll);

    let response = serde_json::to_value(ControlResponse::Status {
        fault_name: "p".to_string(),
        active: false,
    })
    .unwrap();
    assert_eq!(response["status"], "status");
    assert_eq!(response["active"], false);
}
