//! Staff operations on the pickup board
//!
//! Every operation writes through the store, mirrors the result into the
//! shared state, and on failure leaves the generic error message in
//! `BoardState::last_error`.

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::config::SchoolConfig;
use crate::lane;
use crate::model::{Dismissal, Lane};
use crate::queue::{QueueView, Summary};
use crate::state::StateHandle;
use crate::store::{DocumentStore, StoreEvent};
use crate::workflow::{self, StaffAction};

/// A car joining the line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDismissal {
    pub car_number: u32,
    #[serde(default)]
    pub student_ids: Vec<String>,
    /// Explicit cone; the lane pointer picks one when absent
    #[serde(default)]
    pub cone: Option<u32>,
}

#[derive(Clone)]
pub struct Board {
    store: Arc<dyn DocumentStore>,
    state: StateHandle,
    school: SchoolConfig,
    tz: Tz,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("school_id", &self.school.id)
            .field("timezone", &self.tz)
            .finish()
    }
}

impl Board {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        state: StateHandle,
        school: &SchoolConfig,
    ) -> crate::Result<Self> {
        Ok(Self {
            store,
            state,
            tz: school.tz()?,
            school: school.clone(),
        })
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Load today's lane, dismissals and students into the shared state
    pub async fn load(&self) -> crate::Result<()> {
        self.load_at(clock::current_epoch_ms()).await
    }

    pub async fn load_at(&self, now_ms: u64) -> crate::Result<()> {
        let result = self.fetch_snapshot(now_ms).await;
        let mut state = self.state.write().await;
        match result {
            Ok((lane, dismissals, students)) => {
                tracing::debug!(
                    "Loaded lane {} with {} dismissals and {} students",
                    lane.key(),
                    dismissals.len(),
                    students.len()
                );
                state.replace_snapshot(lane, dismissals, students, now_ms);
                state.clear_error();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load board for '{}': {}", self.school.id, e);
                state.record_error(&e);
                Err(e)
            }
        }
    }

    /// Reload once the school day has moved past the loaded lane.
    /// Returns true when a reload happened.
    pub async fn roll_over_at(&self, now_ms: u64) -> crate::Result<bool> {
        let previous = {
            let state = self.state.read().await;
            if !state.is_stale(now_ms) {
                return Ok(false);
            }
            state.lane.as_ref().map(|lane| lane.date)
        };
        self.load_at(now_ms).await?;
        tracing::info!(
            "Rolled '{}' over from {:?} to {}",
            self.school.id,
            previous,
            clock::school_date(self.tz, now_ms)
        );
        Ok(true)
    }

    async fn fetch_snapshot(
        &self,
        now_ms: u64,
    ) -> crate::Result<(Lane, Vec<Dismissal>, Vec<crate::model::Student>)> {
        let lane = self.current_lane(now_ms).await?;
        let (from, to) = clock::day_window(lane.date, self.tz);
        let dismissals = self
            .store
            .list_dismissals(&self.school.id, from, to)
            .await?;
        let students = self.store.list_students(&self.school.id).await?;
        Ok((lane, dismissals, students))
    }

    async fn current_lane(&self, now_ms: u64) -> crate::Result<Lane> {
        lane::ensure_lane(
            self.store.as_ref(),
            &self.school.id,
            clock::school_date(self.tz, now_ms),
            &self.school.timezone,
            self.school.default_cone_count,
            now_ms,
        )
        .await
    }

    /// Add a car to the line
    pub async fn create_dismissal(&self, request: NewDismissal) -> crate::Result<Dismissal> {
        self.create_dismissal_at(request, clock::current_epoch_ms())
            .await
    }

    pub async fn create_dismissal_at(
        &self,
        request: NewDismissal,
        now_ms: u64,
    ) -> crate::Result<Dismissal> {
        let result = self.try_create(request, now_ms).await;
        self.track(result).await
    }

    async fn try_create(&self, request: NewDismissal, now_ms: u64) -> crate::Result<Dismissal> {
        let mut lane = self.current_lane(now_ms).await?;
        let cone = match request.cone {
            Some(cone) if cone == 0 || cone > lane.cone_count => {
                return Err(crate::CarlineError::InvalidInput(format!(
                    "cone {} is not out today (1-{})",
                    cone, lane.cone_count
                )));
            }
            Some(cone) => {
                self.mirror(StoreEvent::LaneChanged(lane), now_ms).await;
                cone
            }
            None => {
                let cone = lane::next_cone(&mut lane, now_ms);
                self.store.put_lane(lane.clone()).await?;
                self.mirror(StoreEvent::LaneChanged(lane), now_ms).await;
                cone
            }
        };

        let dismissal = Dismissal::new(
            self.school.id.clone(),
            request.car_number,
            cone,
            request.student_ids,
            now_ms,
        );
        self.store.put_dismissal(dismissal.clone()).await?;
        tracing::info!(
            "Car {} queued at cone {} ({})",
            dismissal.car_number,
            cone,
            dismissal.id
        );
        self.mirror(StoreEvent::DismissalChanged(dismissal.clone()), now_ms)
            .await;
        Ok(dismissal)
    }

    pub async fn send(&self, id: &str) -> crate::Result<Dismissal> {
        self.act(id, StaffAction::Send).await
    }

    pub async fn complete(&self, id: &str) -> crate::Result<Dismissal> {
        self.act(id, StaffAction::Complete).await
    }

    pub async fn dismiss(&self, id: &str) -> crate::Result<Dismissal> {
        self.act(id, StaffAction::Dismiss).await
    }

    pub async fn archive(&self, id: &str) -> crate::Result<Dismissal> {
        self.act(id, StaffAction::Archive).await
    }

    pub async fn act(&self, id: &str, action: StaffAction) -> crate::Result<Dismissal> {
        self.act_at(id, action, clock::current_epoch_ms()).await
    }

    pub async fn act_at(
        &self,
        id: &str,
        action: StaffAction,
        now_ms: u64,
    ) -> crate::Result<Dismissal> {
        let result = self.try_act(id, action, now_ms).await;
        self.track(result).await
    }

    async fn try_act(
        &self,
        id: &str,
        action: StaffAction,
        now_ms: u64,
    ) -> crate::Result<Dismissal> {
        let mut dismissal = self
            .store
            .get_dismissal(id)
            .await?
            .ok_or_else(|| crate::CarlineError::NotFound(format!("dismissal {}", id)))?;
        let previous = dismissal.status;
        workflow::apply(&mut dismissal, action, now_ms);
        self.store.put_dismissal(dismissal.clone()).await?;
        tracing::info!(
            "Car {} {}: {} -> {}",
            dismissal.car_number,
            action,
            previous,
            dismissal.status
        );
        self.mirror(StoreEvent::DismissalChanged(dismissal.clone()), now_ms)
            .await;
        Ok(dismissal)
    }

    /// Complete a sent car if the stored copy is still overdue.
    /// Returns `None` when another client moved it on first.
    pub async fn clear_if_due(
        &self,
        id: &str,
        delay: Duration,
        now_ms: u64,
    ) -> crate::Result<Option<Dismissal>> {
        let result = self.try_clear_if_due(id, delay, now_ms).await;
        self.record_failure(result).await
    }

    async fn try_clear_if_due(
        &self,
        id: &str,
        delay: Duration,
        now_ms: u64,
    ) -> crate::Result<Option<Dismissal>> {
        let Some(mut dismissal) = self.store.get_dismissal(id).await? else {
            return Ok(None);
        };
        if !workflow::is_auto_clear_due(&dismissal, now_ms, delay) {
            self.mirror(StoreEvent::DismissalChanged(dismissal), now_ms)
                .await;
            return Ok(None);
        }
        workflow::apply(&mut dismissal, StaffAction::Complete, now_ms);
        self.store.put_dismissal(dismissal.clone()).await?;
        tracing::info!(
            "Auto-cleared car {} at cone {} ({})",
            dismissal.car_number,
            dismissal.cone,
            dismissal.id
        );
        self.mirror(StoreEvent::DismissalChanged(dismissal.clone()), now_ms)
            .await;
        Ok(Some(dismissal))
    }

    /// Change how many cones are out today
    pub async fn set_cone_count(&self, cone_count: u32) -> crate::Result<Lane> {
        self.set_cone_count_at(cone_count, clock::current_epoch_ms())
            .await
    }

    pub async fn set_cone_count_at(&self, cone_count: u32, now_ms: u64) -> crate::Result<Lane> {
        let result = self.try_set_cone_count(cone_count, now_ms).await;
        self.track(result).await
    }

    async fn try_set_cone_count(&self, cone_count: u32, now_ms: u64) -> crate::Result<Lane> {
        let mut lane = self.current_lane(now_ms).await?;
        lane::set_cone_count(&mut lane, cone_count, now_ms)?;
        self.store.put_lane(lane.clone()).await?;
        tracing::info!("Lane {} now has {} cones", lane.key(), cone_count);
        self.mirror(StoreEvent::LaneChanged(lane.clone()), now_ms)
            .await;
        Ok(lane)
    }

    pub async fn lane(&self) -> Option<Lane> {
        self.state.read().await.lane.clone()
    }

    pub async fn queues(&self) -> QueueView {
        self.state.read().await.queue_view()
    }

    pub async fn summary(&self) -> Summary {
        self.state.read().await.summary()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    async fn mirror(&self, event: StoreEvent, now_ms: u64) {
        self.state.write().await.apply_event(event, now_ms);
    }

    async fn track<T>(&self, result: crate::Result<T>) -> crate::Result<T> {
        if result.is_ok() {
            self.state.write().await.clear_error();
        }
        self.record_failure(result).await
    }

    // Background work only adds errors; a staff action is what clears them.
    async fn record_failure<T>(&self, result: crate::Result<T>) -> crate::Result<T> {
        if let Err(e) = &result {
            tracing::warn!("Board operation failed for '{}': {}", self.school.id, e);
            self.state.write().await.record_error(e);
        }
        result
    }
}
