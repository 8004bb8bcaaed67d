//! Per-day lane lookup and cone assignment

use chrono::NaiveDate;

use crate::model::Lane;
use crate::store::DocumentStore;

/// Most cones a lane can have out at once
pub const MAX_CONES: u32 = 50;

/// Fetch the school's lane for `date`, creating it on first access
pub async fn ensure_lane(
    store: &dyn DocumentStore,
    school_id: &str,
    date: NaiveDate,
    timezone: &str,
    default_cone_count: u32,
    now_ms: u64,
) -> crate::Result<Lane> {
    if let Some(lane) = store.get_lane(school_id, date).await? {
        return Ok(lane);
    }

    let lane = Lane::new(school_id, date, default_cone_count.clamp(1, MAX_CONES), timezone, now_ms);
    tracing::info!(
        "Creating lane for '{}' on {} with {} cones",
        school_id,
        date,
        lane.cone_count
    );
    store.put_lane(lane.clone()).await?;
    Ok(lane)
}

/// Take the cone the pointer is on and advance it round-robin
pub fn next_cone(lane: &mut Lane, now_ms: u64) -> u32 {
    let count = lane.cone_count.max(1);
    let cone = if (1..=count).contains(&lane.next_cone) {
        lane.next_cone
    } else {
        1
    };
    lane.next_cone = cone % count + 1;
    lane.updated_at_ms = now_ms;
    cone
}

/// Change how many cones are out today
pub fn set_cone_count(lane: &mut Lane, cone_count: u32, now_ms: u64) -> crate::Result<()> {
    if !(1..=MAX_CONES).contains(&cone_count) {
        return Err(crate::CarlineError::InvalidInput(format!(
            "cone count must be between 1 and {}, got {}",
            MAX_CONES, cone_count
        )));
    }
    lane.cone_count = cone_count;
    if lane.next_cone > cone_count {
        lane.next_cone = 1;
    }
    lane.updated_at_ms = now_ms;
    Ok(())
}
