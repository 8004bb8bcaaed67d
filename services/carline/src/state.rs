//! Shared board state: the live mirror of today's lane, dismissals and students

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use tokio::sync::RwLock;

use crate::clock;
use crate::model::{Dismissal, Lane, Student};
use crate::queue::{self, QueueView, Summary};
use crate::store::StoreEvent;
use crate::workflow;

/// Everything the dashboard and background tasks read
#[derive(Debug)]
pub struct BoardState {
    pub school_id: String,
    pub timezone: Tz,
    pub lane: Option<Lane>,
    pub dismissals: HashMap<String, Dismissal>,
    pub students: HashMap<String, Student>,
    /// Generic message from the most recent failed operation
    pub last_error: Option<String>,
    pub last_sync_epoch_ms: u64,
    pub started_at: Instant,
}

impl BoardState {
    pub fn new(school_id: impl Into<String>, timezone: Tz) -> Self {
        Self {
            school_id: school_id.into(),
            timezone,
            lane: None,
            dismissals: HashMap::new(),
            students: HashMap::new(),
            last_error: None,
            last_sync_epoch_ms: 0,
            started_at: Instant::now(),
        }
    }

    /// Replace everything with a freshly loaded snapshot
    pub fn replace_snapshot(
        &mut self,
        lane: Lane,
        dismissals: Vec<Dismissal>,
        students: Vec<Student>,
        now_ms: u64,
    ) {
        self.lane = Some(lane);
        self.dismissals = dismissals.into_iter().map(|d| (d.id.clone(), d)).collect();
        self.students = students.into_iter().map(|s| (s.id.clone(), s)).collect();
        self.last_sync_epoch_ms = now_ms;
    }

    /// Fold one change from the store in, returning true if the board changed
    pub fn apply_event(&mut self, event: StoreEvent, now_ms: u64) -> bool {
        let applied = match event {
            StoreEvent::LaneChanged(lane) => {
                let current_day = self.lane.as_ref().map(|l| l.date);
                if lane.school_id != self.school_id
                    || current_day.is_some_and(|day| lane.date < day)
                {
                    false
                } else {
                    let new_day = current_day != Some(lane.date);
                    self.lane = Some(lane);
                    if new_day {
                        self.drop_outside_window();
                    }
                    true
                }
            }
            StoreEvent::DismissalChanged(dismissal) => {
                if dismissal.school_id != self.school_id || !self.in_window(&dismissal) {
                    false
                } else {
                    self.dismissals.insert(dismissal.id.clone(), dismissal);
                    true
                }
            }
            StoreEvent::StudentChanged(student) => {
                if student.school_id != self.school_id {
                    false
                } else {
                    self.students.insert(student.id.clone(), student);
                    true
                }
            }
        };
        if applied {
            self.last_sync_epoch_ms = now_ms;
        }
        applied
    }

    /// Whether the board has moved past its lane's school day at `now_ms`
    pub fn is_stale(&self, now_ms: u64) -> bool {
        match &self.lane {
            Some(lane) => lane.date != clock::school_date(self.timezone, now_ms),
            None => true,
        }
    }

    // Before the first lane arrives there is no window to filter by.
    fn in_window(&self, dismissal: &Dismissal) -> bool {
        if self.lane.is_none() {
            return true;
        }
        let (start, end) = self.window();
        (start..end).contains(&dismissal.created_at_ms)
    }

    fn drop_outside_window(&mut self) {
        let (start, end) = self.window();
        self.dismissals.retain(|_, d| (start..end).contains(&d.created_at_ms));
    }

    /// Epoch-ms range of the lane's school day, empty before the first load
    pub fn window(&self) -> (u64, u64) {
        match &self.lane {
            Some(lane) => clock::day_window(lane.date, self.timezone),
            None => (0, 0),
        }
    }

    /// Today's non-archived dismissals in arrival order
    pub fn visible_dismissals(&self) -> Vec<Dismissal> {
        let mut visible: Vec<Dismissal> = queue::visible(self.dismissals.values(), self.window())
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.car_number.cmp(&b.car_number))
        });
        visible
    }

    pub fn queue_view(&self) -> QueueView {
        match &self.lane {
            Some(lane) => QueueView::build(
                lane,
                self.dismissals.values(),
                &self.students,
                self.window(),
            ),
            None => QueueView::default(),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary::from_dismissals(queue::visible(self.dismissals.values(), self.window()))
    }

    /// Sent records that have waited longer than `delay`
    pub fn auto_clear_candidates(&self, now_ms: u64, delay: Duration) -> Vec<Dismissal> {
        queue::visible(self.dismissals.values(), self.window())
            .filter(|d| workflow::is_auto_clear_due(d, now_ms, delay))
            .cloned()
            .collect()
    }

    pub fn record_error(&mut self, error: &crate::CarlineError) {
        self.last_error = Some(error.user_message().to_string());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<BoardState>>;

pub fn new_state_handle(school_id: impl Into<String>, timezone: Tz) -> StateHandle {
    Arc::new(RwLock::new(BoardState::new(school_id, timezone)))
}
