//! Derived views over the day's dismissals: per-cone queues and status counts

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::lane::MAX_CONES;
use crate::model::{Dismissal, DismissalStatus, Lane, Student};

/// Dismissals created inside `window` that have not been archived
pub fn visible<'a>(
    dismissals: impl IntoIterator<Item = &'a Dismissal>,
    window: (u64, u64),
) -> impl Iterator<Item = &'a Dismissal> {
    let (start, end) = window;
    dismissals.into_iter().filter(move |d| {
        d.created_at_ms >= start
            && d.created_at_ms < end
            && d.status != DismissalStatus::Historical
    })
}

/// One car as the board shows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,
    pub car_number: u32,
    pub cone: u32,
    pub status: DismissalStatus,
    pub students: Vec<String>,
    pub created_at_ms: u64,
    pub sent_at_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConeQueue {
    pub cone: u32,
    pub entries: Vec<QueueEntry>,
}

/// Active cars grouped by cone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    pub cones: Vec<ConeQueue>,
    /// Active cars whose cone is not out today
    pub unassigned: Vec<QueueEntry>,
}

impl QueueView {
    pub fn build<'a>(
        lane: &Lane,
        dismissals: impl IntoIterator<Item = &'a Dismissal>,
        students: &HashMap<String, Student>,
        window: (u64, u64),
    ) -> Self {
        // A lane written by another client may carry any count.
        let mut cones: Vec<ConeQueue> = (1..=lane.cone_count.min(MAX_CONES))
            .map(|cone| ConeQueue {
                cone,
                entries: Vec::new(),
            })
            .collect();
        let mut unassigned = Vec::new();

        for dismissal in visible(dismissals, window).filter(|d| d.status.is_active()) {
            let entry = to_entry(dismissal, students);
            match cones.get_mut((dismissal.cone as usize).wrapping_sub(1)) {
                Some(queue) => queue.entries.push(entry),
                None => unassigned.push(entry),
            }
        }

        for queue in &mut cones {
            sort_entries(&mut queue.entries);
        }
        sort_entries(&mut unassigned);

        Self { cones, unassigned }
    }

    pub fn cone(&self, cone: u32) -> Option<&ConeQueue> {
        self.cones.iter().find(|q| q.cone == cone)
    }
}

fn to_entry(dismissal: &Dismissal, students: &HashMap<String, Student>) -> QueueEntry {
    QueueEntry {
        id: dismissal.id.clone(),
        car_number: dismissal.car_number,
        cone: dismissal.cone,
        status: dismissal.status,
        students: dismissal
            .student_ids
            .iter()
            .map(|id| {
                students
                    .get(id)
                    .map(Student::display_name)
                    .unwrap_or_else(|| id.clone())
            })
            .collect(),
        created_at_ms: dismissal.created_at_ms,
        sent_at_ms: dismissal.sent_at_ms,
    }
}

fn sort_entries(entries: &mut [QueueEntry]) {
    entries.sort_by(|a, b| {
        a.created_at_ms
            .cmp(&b.created_at_ms)
            .then_with(|| a.car_number.cmp(&b.car_number))
    });
}

/// Number of dismissals in each status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub counts: BTreeMap<DismissalStatus, usize>,
    pub total: usize,
}

impl Summary {
    pub fn from_dismissals<'a>(dismissals: impl IntoIterator<Item = &'a Dismissal>) -> Self {
        let mut counts: BTreeMap<DismissalStatus, usize> =
            DismissalStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total = 0;
        for dismissal in dismissals {
            *counts.entry(dismissal.status).or_default() += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn count(&self, status: DismissalStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}
