// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster queries over the staff directory.

use crate::models::{Role, ScheduleField, StaffMember};
use serde::Serialize;

/// Who is on duty in a given week.
///
/// Slots with nobody assigned are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallLineup {
    /// Up to three interns on ward call, ordered by unit
    pub ward_call: [Option<StaffMember>; 3],
    pub gym_call: Option<StaffMember>,
    /// Physiotherapist grades (NYSC to Principal)
    pub second_on_call: Option<StaffMember>,
    /// Deputy Director or Director
    pub third_on_call: Option<StaffMember>,
}

impl CallLineup {
    /// The six slots in display order.
    pub fn slots(&self) -> [Option<&StaffMember>; 6] {
        [
            self.ward_call[0].as_ref(),
            self.ward_call[1].as_ref(),
            self.ward_call[2].as_ref(),
            self.gym_call.as_ref(),
            self.second_on_call.as_ref(),
            self.third_on_call.as_ref(),
        ]
    }
}

fn on_ward_call(staff: &StaffMember, year: i32, week: u32) -> bool {
    staff.schedule(ScheduleField::OnCall).contains(year, week)
}

fn on_gym_call(staff: &StaffMember, year: i32, week: u32) -> bool {
    staff.schedule(ScheduleField::GymCall).contains(year, week)
}

/// On ward or gym call in `week` of `year`.
pub fn is_on_call(staff: &StaffMember, year: i32, week: u32) -> bool {
    on_ward_call(staff, year, week) || on_gym_call(staff, year, week)
}

/// On leave in `month` of `year`.
pub fn is_on_leave(staff: &StaffMember, year: i32, month: u32) -> bool {
    staff.schedule(ScheduleField::Leave).contains(year, month)
}

/// Build the call line-up for `week` of `year`.
pub fn staff_on_call(staff: &[StaffMember], year: i32, week: u32) -> CallLineup {
    let on_call: Vec<&StaffMember> = staff
        .iter()
        .filter(|s| is_on_call(s, year, week))
        .collect();

    let mut interns: Vec<&StaffMember> = on_call
        .iter()
        .copied()
        .filter(|s| s.role == Role::Intern && !on_gym_call(s, year, week))
        .collect();
    interns.sort_by_key(|s| s.unit.code());

    let mut lineup = CallLineup::default();
    for (slot, staff) in lineup.ward_call.iter_mut().zip(interns) {
        *slot = Some(staff.clone());
    }

    lineup.gym_call = on_call
        .iter()
        .find(|s| on_gym_call(s, year, week))
        .map(|s| (*s).clone());
    lineup.second_on_call = on_call
        .iter()
        .find(|s| (2..=5).contains(&s.role.code()))
        .map(|s| (*s).clone());
    lineup.third_on_call = on_call
        .iter()
        .find(|s| (6..=7).contains(&s.role.code()))
        .map(|s| (*s).clone());

    lineup
}

/// Staff on leave in `month` of `year`, ordered by role code.
pub fn staff_on_leave(staff: &[StaffMember], year: i32, month: u32) -> Vec<StaffMember> {
    let mut on_leave: Vec<StaffMember> = staff
        .iter()
        .filter(|s| is_on_leave(s, year, month))
        .cloned()
        .collect();
    on_leave.sort_by_key(|s| s.role.code());
    on_leave
}
