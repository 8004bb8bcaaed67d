//! Lane, dismissal and student records

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The day's pickup configuration for one school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub school_id: String,
    pub date: NaiveDate,
    pub cone_count: u32,
    /// Cone the next unassigned car goes to
    pub next_cone: u32,
    pub timezone: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Lane {
    pub fn new(
        school_id: impl Into<String>,
        date: NaiveDate,
        cone_count: u32,
        timezone: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            school_id: school_id.into(),
            date,
            cone_count,
            next_cone: 1,
            timezone: timezone.into(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Store key: one lane per school per day
    pub fn key(&self) -> String {
        lane_key(&self.school_id, self.date)
    }
}

pub fn lane_key(school_id: &str, date: NaiveDate) -> String {
    format!("{}:{}", school_id, date)
}

/// Where a car is in the pickup workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalStatus {
    Waiting,
    Queued,
    Sent,
    AtCone,
    Completed,
    Dismissed,
    Historical,
}

impl DismissalStatus {
    pub const ALL: [DismissalStatus; 7] = [
        DismissalStatus::Waiting,
        DismissalStatus::Queued,
        DismissalStatus::Sent,
        DismissalStatus::AtCone,
        DismissalStatus::Completed,
        DismissalStatus::Dismissed,
        DismissalStatus::Historical,
    ];

    /// No further staff action moves the record on
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DismissalStatus::Completed | DismissalStatus::Dismissed | DismissalStatus::Historical
        )
    }

    /// Shown in its cone's queue
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            DismissalStatus::Completed | DismissalStatus::Historical
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DismissalStatus::Waiting => "waiting",
            DismissalStatus::Queued => "queued",
            DismissalStatus::Sent => "sent",
            DismissalStatus::AtCone => "at_cone",
            DismissalStatus::Completed => "completed",
            DismissalStatus::Dismissed => "dismissed",
            DismissalStatus::Historical => "historical",
        }
    }
}

impl fmt::Display for DismissalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One car's pickup record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub id: String,
    pub school_id: String,
    pub car_number: u32,
    pub cone: u32,
    #[serde(default)]
    pub student_ids: Vec<String>,
    pub status: DismissalStatus,
    pub created_at_ms: u64,
    #[serde(default)]
    pub sent_at_ms: Option<u64>,
    #[serde(default)]
    pub dismissed_at_ms: Option<u64>,
    pub updated_at_ms: u64,
}

impl Dismissal {
    /// New waiting record with a fresh id
    pub fn new(
        school_id: impl Into<String>,
        car_number: u32,
        cone: u32,
        student_ids: Vec<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            school_id: school_id.into(),
            car_number,
            cone,
            student_ids,
            status: DismissalStatus::Waiting,
            created_at_ms: now_ms,
            sent_at_ms: None,
            dismissed_at_ms: None,
            updated_at_ms: now_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub school_id: String,
    pub first_name: String,
    /// Full last name or just an initial
    #[serde(default)]
    pub last_name: String,
}

impl Student {
    /// "Ada L." style name for the board
    pub fn display_name(&self) -> String {
        match self.last_name.trim().chars().next() {
            Some(initial) => format!(
                "{} {}.",
                self.first_name.trim(),
                initial.to_uppercase()
            ),
            None => self.first_name.trim().to_string(),
        }
    }
}
