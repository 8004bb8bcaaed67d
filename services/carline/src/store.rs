//! Document store seam and the in-memory implementation
//!
//! The board never owns records; it reads and writes through a
//! [`DocumentStore`] and learns about changes made by any client from the
//! store's change feed.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use crate::model::{lane_key, Dismissal, Lane, Student};

const EVENT_CAPACITY: usize = 256;

/// A document written by any client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum StoreEvent {
    LaneChanged(Lane),
    DismissalChanged(Dismissal),
    StudentChanged(Student),
}

/// Collections backing the board: lanes, dismissals and students
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_lane(&self, school_id: &str, date: NaiveDate) -> crate::Result<Option<Lane>>;

    async fn put_lane(&self, lane: Lane) -> crate::Result<()>;

    /// Dismissals for a school created in `[from_ms, to_ms)`
    async fn list_dismissals(
        &self,
        school_id: &str,
        from_ms: u64,
        to_ms: u64,
    ) -> crate::Result<Vec<Dismissal>>;

    async fn get_dismissal(&self, id: &str) -> crate::Result<Option<Dismissal>>;

    async fn put_dismissal(&self, dismissal: Dismissal) -> crate::Result<()>;

    async fn list_students(&self, school_id: &str) -> crate::Result<Vec<Student>>;

    async fn put_student(&self, student: Student) -> crate::Result<()>;

    /// Live change feed. Each receiver sees writes made after it subscribed.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Initial documents for a [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub dismissals: Vec<Dismissal>,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl StoreSeed {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::CarlineError::Store(format!("Failed to read seed file {:?}: {}", path, e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Default)]
struct Collections {
    lanes: HashMap<String, Lane>,
    dismissals: HashMap<String, Dismissal>,
    students: HashMap<(String, String), Student>,
}

/// Process-local store with a broadcast change feed
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            collections: RwLock::new(Collections::default()),
            events,
        }
    }

    pub fn with_seed(seed: StoreSeed) -> Self {
        let mut collections = Collections::default();
        for lane in seed.lanes {
            collections.lanes.insert(lane.key(), lane);
        }
        for dismissal in seed.dismissals {
            collections
                .dismissals
                .insert(dismissal.id.clone(), dismissal);
        }
        for student in seed.students {
            collections
                .students
                .insert((student.school_id.clone(), student.id.clone()), student);
        }
        tracing::debug!(
            "Seeded store: {} lanes, {} dismissals, {} students",
            collections.lanes.len(),
            collections.dismissals.len(),
            collections.students.len()
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            collections: RwLock::new(collections),
            events,
        }
    }

    fn publish(&self, event: StoreEvent) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_lane(&self, school_id: &str, date: NaiveDate) -> crate::Result<Option<Lane>> {
        let collections = self.collections.read().await;
        Ok(collections.lanes.get(&lane_key(school_id, date)).cloned())
    }

    async fn put_lane(&self, lane: Lane) -> crate::Result<()> {
        self.collections
            .write()
            .await
            .lanes
            .insert(lane.key(), lane.clone());
        self.publish(StoreEvent::LaneChanged(lane));
        Ok(())
    }

    async fn list_dismissals(
        &self,
        school_id: &str,
        from_ms: u64,
        to_ms: u64,
    ) -> crate::Result<Vec<Dismissal>> {
        let collections = self.collections.read().await;
        let mut dismissals: Vec<Dismissal> = collections
            .dismissals
            .values()
            .filter(|d| d.school_id == school_id)
            .filter(|d| d.created_at_ms >= from_ms && d.created_at_ms < to_ms)
            .cloned()
            .collect();
        dismissals.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(dismissals)
    }

    async fn get_dismissal(&self, id: &str) -> crate::Result<Option<Dismissal>> {
        Ok(self.collections.read().await.dismissals.get(id).cloned())
    }

    async fn put_dismissal(&self, dismissal: Dismissal) -> crate::Result<()> {
        self.collections
            .write()
            .await
            .dismissals
            .insert(dismissal.id.clone(), dismissal.clone());
        self.publish(StoreEvent::DismissalChanged(dismissal));
        Ok(())
    }

    async fn list_students(&self, school_id: &str) -> crate::Result<Vec<Student>> {
        let collections = self.collections.read().await;
        let mut students: Vec<Student> = collections
            .students
            .values()
            .filter(|s| s.school_id == school_id)
            .cloned()
            .collect();
        students.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(students)
    }

    async fn put_student(&self, student: Student) -> crate::Result<()> {
        self.collections.write().await.students.insert(
            (student.school_id.clone(), student.id.clone()),
            student.clone(),
        );
        self.publish(StoreEvent::StudentChanged(student));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
