//! BDD step definitions for auto-clear feature

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use carline::auto_clear::AutoClear;
use carline::config::AutoClearConfig;

use crate::world::CarlineWorld;

#[given(expr = "an auto-clear delay of {int} seconds")]
fn auto_clear_delay(world: &mut CarlineWorld, seconds: u64) {
    world.auto_clear_delay_seconds = seconds;
}

#[given(expr = "{int} seconds pass")]
#[when(expr = "{int} seconds pass")]
fn seconds_pass(world: &mut CarlineWorld, seconds: u64) {
    world.now_ms += seconds * 1000;
}

#[when("the auto-clear timer fires")]
async fn timer_fires(world: &mut CarlineWorld) {
    let config = AutoClearConfig {
        enabled: true,
        delay_seconds: world.auto_clear_delay_seconds,
        check_interval_seconds: 30,
    };
    let auto_clear = AutoClear::new(world.board().clone(), &config, CancellationToken::new());
    world.cleared = auto_clear.sweep(world.now_ms).await;
}

#[then(expr = "{int} car(s) should have been auto-cleared")]
fn cars_cleared(world: &mut CarlineWorld, count: usize) {
    assert_eq!(world.cleared, count);
}

#[then(expr = "car {int} should have a completion time")]
async fn car_has_completion_time(world: &mut CarlineWorld, car: u32) {
    let id = world.car_id(car);
    let state = world.board().state().read().await;
    assert_eq!(state.dismissals[&id].dismissed_at_ms, Some(world.now_ms));
}
