//! BDD test runner for the fault injection control surface.
//!
//! Executes the Gherkin feature files in `features/`. Steps talk to a
//! [`FaultController`] exactly like a remote harness would, and play the
//! role of an instrumented call site when "hitting" a fault point.

use std::sync::Arc;

use cucumber::given;
use cucumber::then;
use cucumber::when;
use cucumber::World;
use ha_fault_injector::ControlCommand;
use ha_fault_injector::ControlResponse;
use ha_fault_injector::FaultController;
use ha_fault_injector::FaultRegistry;
use ha_fault_injector::FaultRequest;
use ha_fault_injector::FaultType;
use ha_fault_injector::Outcome;

/// State shared across the steps of one scenario.
#[derive(Debug, Default, World)]
pub struct FaultWorld {
    /// Member name the registry belongs to
    member: String,
    controller: Option<FaultController>,
    /// Result of the last control command
    last_result: Option<Result<ControlResponse, String>>,
}

impl FaultWorld {
    fn controller(&self) -> &FaultController {
        self.controller
            .as_ref()
            .expect("Given a fault registry step must run first")
    }

    fn send(
        &mut self,
        command: ControlCommand,
    ) {
        let result = self.controller().handle(command).map_err(|e| e.to_string());
        self.last_result = Some(result);
    }

    fn inject(
        &mut self,
        request: FaultRequest,
    ) {
        self.send(ControlCommand::Inject(request));
    }

    fn is_active(
        &self,
        name: &str,
    ) -> bool {
        match self.controller().handle(ControlCommand::Query {
            fault_name: name.to_string(),
        }) {
            Ok(ControlResponse::Status { active, .. }) => active,
            other => panic!("unexpected query response {:?}", other),
        }
    }
}

fn parse_fault_type(raw: &str) -> FaultType {
    raw.parse().expect("known fault type")
}

fn describe(outcome: Outcome) -> String {
    match outcome {
        Outcome::Continue => "continue".to_string(),
        Outcome::RaiseFault => "raise".to_string(),
        Outcome::Delay(d) => format!("delay {}s", d.as_secs_f64()),
    }
}

// ============================================================================
// GIVEN
// ============================================================================

#[given(regex = r"^a fault registry for (\w+)$")]
fn fresh_registry(
    world: &mut FaultWorld,
    member: String,
) {
    world.member = member;
    world.controller = Some(FaultController::new(Arc::new(FaultRegistry::new())));
}

// ============================================================================
// WHEN
// ============================================================================

#[when(regex = r"^I inject fault '(\w+)' \(type=(\w+)\)$")]
fn inject_fault(
    world: &mut FaultWorld,
    name: String,
    fault_type: String,
) {
    world.inject(FaultRequest::new(name, parse_fault_type(&fault_type)));
}

#[when(regex = r"^I inject fault '(\w+)' \(type=(\w+), start_from=(\d+), end_after=(\d+)\)$")]
fn inject_fault_with_window(
    world: &mut FaultWorld,
    name: String,
    fault_type: String,
    start_from: u64,
    end_after: u64,
) {
    world.inject(FaultRequest {
        start_from: Some(start_from),
        end_after: Some(end_after),
        ..FaultRequest::new(name, parse_fault_type(&fault_type))
    });
}

#[when(regex = r"^I inject fault '(\w+)' \(type=sleep, sleep_time=(\d+)\)$")]
fn inject_sleep_fault(
    world: &mut FaultWorld,
    name: String,
    sleep_time: u64,
) {
    world.inject(FaultRequest {
        sleep_time: Some(sleep_time as f64),
        ..FaultRequest::new(name, FaultType::Sleep)
    });
}

#[when(regex = r"^I deactivate fault point '(\w+)'$")]
fn deactivate_fault_point(
    world: &mut FaultWorld,
    name: String,
) {
    world.send(ControlCommand::Deactivate { fault_name: name });
}

#[when("I deactivate all fault points")]
fn deactivate_all(world: &mut FaultWorld) {
    world.send(ControlCommand::DeactivateAll);
}

// ============================================================================
// THEN
// ============================================================================

#[then(regex = r"^fault point '(\w+)' is active$")]
fn fault_point_is_active(
    world: &mut FaultWorld,
    name: String,
) {
    assert!(world.is_active(&name), "{} should be active on {}", name, world.member);
}

#[then(regex = r"^fault point '(\w+)' is not active$")]
fn fault_point_is_not_active(
    world: &mut FaultWorld,
    name: String,
) {
    assert!(!world.is_active(&name), "{} should not be active on {}", name, world.member);
}

#[then("there are no activated fault points")]
fn no_activated_fault_points(world: &mut FaultWorld) {
    match world.controller().handle(ControlCommand::QueryAll) {
        Ok(ControlResponse::Active { fault_names }) => {
            assert!(fault_names.is_empty(), "still active: {:?}", fault_names)
        }
        other => panic!("unexpected query_all response {:?}", other),
    }
}

#[then("the injection is rejected")]
fn injection_is_rejected(world: &mut FaultWorld) {
    match &world.last_result {
        Some(Err(e)) => assert!(e.starts_with("Invalid fault parameters"), "{}", e),
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[then(regex = r#"^hitting '(\w+)' (\d+) times yields "([^"]*)"$"#)]
fn hitting_yields(
    world: &mut FaultWorld,
    name: String,
    times: usize,
    expected: String,
) {
    let registry = world.controller().registry().clone();
    let observed: Vec<String> = (0..times).map(|_| describe(registry.hit(&name))).collect();
    let expected: Vec<String> = expected.split(',').map(|s| s.trim().to_string()).collect();
    assert_eq!(observed, expected);
}

// ============================================================================
// MAIN FUNCTION
// ============================================================================

#[tokio::main]
async fn main() {
    FaultWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("features/")
        .await;
}
