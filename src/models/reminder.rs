// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder receipts and scheduling requests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Receipt of a scheduled reminder, persisted in the offline store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub staff_id: String,
    pub title: String,
    pub message: String,
    /// Label of the chosen offset, e.g. "A Week Before"
    pub delay_option: String,
    /// Handle of the scheduled job
    pub job_id: String,
    pub fire_at: DateTime<Utc>,
}

impl Reminder {
    /// Same staff, title, message and offset as `other`.
    pub fn duplicates(&self, other: &Reminder) -> bool {
        self.staff_id == other.staff_id
            && self.title == other.title
            && self.message == other.message
            && self.delay_option == other.delay_option
    }

    /// Job tag shared by every reminder of one staff member.
    pub fn tag(&self) -> String {
        staff_tag(&self.staff_id)
    }
}

pub fn staff_tag(staff_id: &str) -> String {
    format!("reminder_{staff_id}")
}

/// How long before the event a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderOffset {
    #[serde(rename = "A Month Before")]
    MonthBefore,
    #[serde(rename = "A Week Before")]
    WeekBefore,
    #[serde(rename = "A Day Before")]
    DayBefore,
}

impl ReminderOffset {
    pub const ALL: [ReminderOffset; 3] = [
        ReminderOffset::MonthBefore,
        ReminderOffset::WeekBefore,
        ReminderOffset::DayBefore,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReminderOffset::MonthBefore => "A Month Before",
            ReminderOffset::WeekBefore => "A Week Before",
            ReminderOffset::DayBefore => "A Day Before",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            ReminderOffset::MonthBefore => Duration::days(30),
            ReminderOffset::WeekBefore => Duration::days(7),
            ReminderOffset::DayBefore => Duration::days(1),
        }
    }

    /// Label without the trailing " Before" ("A Week").
    pub fn short_label(self) -> &'static str {
        self.label().trim_end_matches(" Before")
    }
}

/// Kind of roster event a reminder refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WardCall,
    GymCall,
    Leave,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::WardCall => "Ward call",
            EventKind::GymCall => "Gym call",
            EventKind::Leave => "Leave",
        }
    }

    /// Week events are numbered by ISO week, leave by month.
    pub fn is_weekly(self) -> bool {
        !matches!(self, EventKind::Leave)
    }
}

/// Request to book a reminder for a staff member's event.
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderRequest {
    pub staff_id: String,
    pub kind: EventKind,
    pub year: i32,
    /// ISO week for call events, month for leave
    pub value: u32,
    pub offset: ReminderOffset,
}
