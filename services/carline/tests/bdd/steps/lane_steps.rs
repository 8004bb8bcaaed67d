//! BDD step definitions for lane feature

use cucumber::{then, when};

use carline::board::NewDismissal;

use crate::world::CarlineWorld;

#[when(expr = "staff set the cone count to {int}")]
async fn set_cone_count(world: &mut CarlineWorld, cones: u32) {
    let result = world
        .board()
        .set_cone_count_at(cones, world.now_ms)
        .await;
    if let Err(e) = result {
        world.last_result = Some(Err(e));
    }
}

#[then(expr = "today's lane should have {int} cones")]
async fn lane_has_cones(world: &mut CarlineWorld, cones: u32) {
    let lane = world.board().lane().await.expect("lane not loaded");
    assert_eq!(lane.cone_count, cones);
    assert_eq!(world.board().queues().await.cones.len(), cones as usize);
}

#[then(expr = "the next car should go to cone {int}")]
async fn next_car_cone(world: &mut CarlineWorld, cone: u32) {
    let dismissal = world
        .board()
        .create_dismissal_at(
            NewDismissal {
                car_number: 999,
                student_ids: vec![],
                cone: None,
            },
            world.now_ms,
        )
        .await
        .expect("create dismissal");
    assert_eq!(dismissal.cone, cone);
}

#[then(expr = "car {int} should be unassigned")]
async fn car_unassigned(world: &mut CarlineWorld, car: u32) {
    let view = world.board().queues().await;
    assert!(view.unassigned.iter().any(|e| e.car_number == car));
    assert!(view
        .cones
        .iter()
        .all(|q| q.entries.iter().all(|e| e.car_number != car)));
}
