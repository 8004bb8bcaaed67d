//! BDD step definitions for workflow feature

use std::sync::Arc;

use cucumber::{given, then, when};

use carline::board::{Board, NewDismissal};
use carline::config::SchoolConfig;
use carline::model::DismissalStatus;
use carline::state::new_state_handle;
use carline::store::MemoryStore;
use carline::workflow::StaffAction;

use crate::world::CarlineWorld;

pub fn school(cones: u32) -> SchoolConfig {
    SchoolConfig {
        id: "bdd".to_string(),
        name: "BDD Elementary".to_string(),
        timezone: "UTC".to_string(),
        default_cone_count: cones,
    }
}

fn parse_action(s: &str) -> StaffAction {
    match s {
        "send" => StaffAction::Send,
        "complete" => StaffAction::Complete,
        "dismiss" => StaffAction::Dismiss,
        "archive" => StaffAction::Archive,
        other => panic!("Unknown action: {}", other),
    }
}

fn parse_status(s: &str) -> DismissalStatus {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .unwrap_or_else(|_| panic!("Unknown status: {}", s))
}

async fn join(world: &mut CarlineWorld, car: u32, cone: Option<u32>) {
    let result = world
        .board()
        .create_dismissal_at(
            NewDismissal {
                car_number: car,
                student_ids: vec![],
                cone,
            },
            world.now_ms,
        )
        .await;
    if let Ok(d) = &result {
        world.cars.insert(car, d.id.clone());
    }
    world.last_result = Some(result);
}

#[given(expr = "a school with {int} cones")]
async fn school_with_cones(world: &mut CarlineWorld, cones: u32) {
    let board = Board::new(
        Arc::new(MemoryStore::new()),
        new_state_handle("bdd", chrono_tz::UTC),
        &school(cones),
    )
    .expect("valid school config");
    board.load_at(world.now_ms).await.expect("initial load");
    world.board = Some(board);
}

#[given(expr = "car {int} has joined the line")]
#[when(expr = "car {int} joins the line")]
async fn car_joins(world: &mut CarlineWorld, car: u32) {
    join(world, car, None).await;
}

#[given(expr = "car {int} has joined the line at cone {int}")]
#[when(expr = "car {int} joins the line at cone {int}")]
async fn car_joins_at(world: &mut CarlineWorld, car: u32, cone: u32) {
    join(world, car, Some(cone)).await;
}

#[given(expr = "staff {word} car {int}")]
#[when(expr = "staff {word} car {int}")]
async fn staff_act(world: &mut CarlineWorld, action: String, car: u32) {
    let id = world.car_id(car);
    let result = world
        .board()
        .act_at(&id, parse_action(&action), world.now_ms)
        .await;
    world.last_result = Some(result);
}

#[then(expr = "car {int} should be at cone {int}")]
async fn car_at_cone(world: &mut CarlineWorld, car: u32, cone: u32) {
    let view = world.board().queues().await;
    let queue = view
        .cone(cone)
        .unwrap_or_else(|| panic!("cone {} is not out", cone));
    assert!(
        queue.entries.iter().any(|e| e.car_number == car),
        "car {} not in cone {}: {:?}",
        car,
        cone,
        queue.entries
    );
}

#[then(expr = "car {int} should have status {string}")]
async fn car_has_status(world: &mut CarlineWorld, car: u32, status: String) {
    let id = world.car_id(car);
    let state = world.board().state().read().await;
    let dismissal = state
        .dismissals
        .get(&id)
        .unwrap_or_else(|| panic!("car {} not in state", car));
    assert_eq!(dismissal.status, parse_status(&status));
}

#[then(expr = "car {int} should have a sent time")]
async fn car_has_sent_time(world: &mut CarlineWorld, car: u32) {
    let id = world.car_id(car);
    let state = world.board().state().read().await;
    assert_eq!(state.dismissals[&id].sent_at_ms, Some(world.now_ms));
}

#[then(expr = "cone {int} should list cars {string}")]
async fn cone_lists(world: &mut CarlineWorld, cone: u32, cars: String) {
    let expected: Vec<u32> = cars
        .split(',')
        .map(|c| c.trim().parse().expect("car number"))
        .collect();
    let view = world.board().queues().await;
    let actual: Vec<u32> = view
        .cone(cone)
        .unwrap_or_else(|| panic!("cone {} is not out", cone))
        .entries
        .iter()
        .map(|e| e.car_number)
        .collect();
    assert_eq!(actual, expected);
}

#[then(expr = "cone {int} should be empty")]
async fn cone_empty(world: &mut CarlineWorld, cone: u32) {
    let view = world.board().queues().await;
    assert!(view
        .cone(cone)
        .unwrap_or_else(|| panic!("cone {} is not out", cone))
        .entries
        .is_empty());
}

#[then(expr = "the summary should count {int} {string}")]
async fn summary_counts(world: &mut CarlineWorld, count: usize, status: String) {
    let summary = world.board().summary().await;
    assert_eq!(summary.count(parse_status(&status)), count);
}

#[then(expr = "the summary total should be {int}")]
async fn summary_total(world: &mut CarlineWorld, total: usize) {
    assert_eq!(world.board().summary().await.total, total);
}
