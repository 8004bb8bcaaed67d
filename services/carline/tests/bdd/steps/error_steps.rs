//! BDD step definitions for error reporting feature

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use cucumber::{given, then, when};
use tokio::sync::broadcast;

use carline::board::Board;
use carline::model::{Dismissal, Lane, Student};
use carline::state::new_state_handle;
use carline::store::{DocumentStore, StoreEvent};
use carline::workflow::StaffAction;
use carline::CarlineError;

use crate::steps::workflow_steps::school;
use crate::world::CarlineWorld;

/// A store whose every call fails
#[derive(Debug)]
struct OfflineStore {
    events: broadcast::Sender<StoreEvent>,
}

impl OfflineStore {
    fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }

    fn offline<T>() -> carline::Result<T> {
        Err(CarlineError::Store("connection refused".to_string()))
    }
}

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn get_lane(&self, _school_id: &str, _date: NaiveDate) -> carline::Result<Option<Lane>> {
        Self::offline()
    }

    async fn put_lane(&self, _lane: Lane) -> carline::Result<()> {
        Self::offline()
    }

    async fn list_dismissals(
        &self,
        _school_id: &str,
        _from_ms: u64,
        _to_ms: u64,
    ) -> carline::Result<Vec<Dismissal>> {
        Self::offline()
    }

    async fn get_dismissal(&self, _id: &str) -> carline::Result<Option<Dismissal>> {
        Self::offline()
    }

    async fn put_dismissal(&self, _dismissal: Dismissal) -> carline::Result<()> {
        Self::offline()
    }

    async fn list_students(&self, _school_id: &str) -> carline::Result<Vec<Student>> {
        Self::offline()
    }

    async fn put_student(&self, _student: Student) -> carline::Result<()> {
        Self::offline()
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[given("a school whose store is offline")]
async fn offline_school(world: &mut CarlineWorld) {
    let board = Board::new(
        Arc::new(OfflineStore::new()),
        new_state_handle("bdd", chrono_tz::UTC),
        &school(2),
    )
    .expect("valid school config");
    world.board = Some(board);
}

#[when("the board loads")]
async fn board_loads(world: &mut CarlineWorld) {
    let result = world.board().load_at(world.now_ms).await;
    if let Err(e) = result {
        world.last_result = Some(Err(e));
    }
}

#[when("staff send an unknown car")]
async fn send_unknown(world: &mut CarlineWorld) {
    let result = world
        .board()
        .act_at("no-such-car", StaffAction::Send, world.now_ms)
        .await;
    world.last_result = Some(result);
}

#[then("the operation should fail")]
fn operation_fails(world: &mut CarlineWorld) {
    match &world.last_result {
        Some(Err(_)) => {}
        other => panic!("expected a failure, got {:?}", other),
    }
}

#[then("the operation should succeed")]
fn operation_succeeds(world: &mut CarlineWorld) {
    match &world.last_result {
        Some(Ok(_)) => {}
        other => panic!("expected success, got {:?}", other),
    }
}

#[then(expr = "the board should show {string}")]
async fn board_shows(world: &mut CarlineWorld, message: String) {
    assert_eq!(world.board().last_error().await, Some(message));
}

#[then("the board should show no error")]
async fn board_shows_no_error(world: &mut CarlineWorld) {
    assert_eq!(world.board().last_error().await, None);
}
