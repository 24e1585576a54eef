// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-year schedule collections (call weeks, leave months).
//!
//! Stored in the `staff` table as a JSON array of `{ "year", "values" }`
//! groups. Groups are kept sorted by year with sorted, unique values, and a
//! group is dropped as soon as it becomes empty, so adding and then removing
//! the same value always restores the original collection.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Values (week or month numbers) booked within a single year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct YearGroup {
    pub year: i32,
    #[serde(default)]
    pub values: Vec<u32>,
}

/// A schedule collection grouped by year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<YearGroup>>", into = "Vec<YearGroup>")]
pub struct Schedule(Vec<YearGroup>);

impl Schedule {
    /// Build a normalized schedule from arbitrary groups.
    ///
    /// Duplicate years are merged, values are sorted and deduplicated and
    /// empty groups are dropped.
    pub fn new(groups: impl IntoIterator<Item = YearGroup>) -> Self {
        let mut schedule = Schedule(Vec::new());
        for group in groups {
            for value in group.values {
                schedule.add(group.year, value);
            }
        }
        schedule
    }

    pub fn groups(&self) -> &[YearGroup] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values booked in `year` (empty if none).
    pub fn values_for(&self, year: i32) -> &[u32] {
        self.0
            .iter()
            .find(|g| g.year == year)
            .map(|g| g.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, year: i32, value: u32) -> bool {
        self.values_for(year).binary_search(&value).is_ok()
    }

    /// Book `value` in `year`. Returns `false` if it was already booked.
    pub fn add(&mut self, year: i32, value: u32) -> bool {
        let idx = match self.0.binary_search_by_key(&year, |g| g.year) {
            Ok(idx) => idx,
            Err(idx) => {
                self.0.insert(
                    idx,
                    YearGroup {
                        year,
                        values: Vec::new(),
                    },
                );
                idx
            }
        };

        let values = &mut self.0[idx].values;
        match values.binary_search(&value) {
            Ok(_) => false,
            Err(pos) => {
                values.insert(pos, value);
                true
            }
        }
    }

    /// Unbook `value` from `year`. Returns `false` if it was not booked.
    pub fn remove(&mut self, year: i32, value: u32) -> bool {
        let Ok(idx) = self.0.binary_search_by_key(&year, |g| g.year) else {
            return false;
        };

        let values = &mut self.0[idx].values;
        let Ok(pos) = values.binary_search(&value) else {
            return false;
        };
        values.remove(pos);

        if values.is_empty() {
            self.0.remove(idx);
        }
        true
    }

    /// Flip the booking of `value` in `year`. Returns whether it is now booked.
    pub fn toggle(&mut self, year: i32, value: u32) -> bool {
        if self.remove(year, value) {
            false
        } else {
            self.add(year, value)
        }
    }
}

impl From<Option<Vec<YearGroup>>> for Schedule {
    fn from(groups: Option<Vec<YearGroup>>) -> Self {
        Schedule::new(groups.unwrap_or_default())
    }
}

impl From<Schedule> for Vec<YearGroup> {
    fn from(schedule: Schedule) -> Self {
        schedule.0
    }
}

/// Which schedule column of a staff row is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleField {
    OnCall,
    GymCall,
    Leave,
}

impl ScheduleField {
    /// Column name in the `staff` table.
    pub fn column(self) -> &'static str {
        match self {
            ScheduleField::OnCall => "on_call_dates",
            ScheduleField::GymCall => "gym_call_dates",
            ScheduleField::Leave => "leave_dates",
        }
    }
}
