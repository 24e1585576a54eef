// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staff directory model, role/unit codes and form validation.

use crate::error::AppError;
use crate::models::schedule::{Schedule, ScheduleField};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Staff row stored in the `staff` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    /// UUID (also the storage key of the photo)
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub unit: Unit,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    /// Public URL of the photo, empty if none
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    /// Ward-call weeks by year
    #[serde(default)]
    pub on_call_dates: Schedule,
    /// Gym-call weeks by year
    #[serde(default)]
    pub gym_call_dates: Schedule,
    /// Leave months by year
    #[serde(default)]
    pub leave_dates: Schedule,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn schedule(&self, field: ScheduleField) -> &Schedule {
        match field {
            ScheduleField::OnCall => &self.on_call_dates,
            ScheduleField::GymCall => &self.gym_call_dates,
            ScheduleField::Leave => &self.leave_dates,
        }
    }
}

/// Staff grade. Stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Role {
    Intern,
    Nysc,
    Physiotherapist,
    Senior,
    Principal,
    DeputyDirector,
    Director,
    /// Any code outside 1..=7, preserved as-is.
    Unknown(i32),
}

impl Role {
    /// Every assignable role, in code order.
    pub const ALL: [Role; 7] = [
        Role::Intern,
        Role::Nysc,
        Role::Physiotherapist,
        Role::Senior,
        Role::Principal,
        Role::DeputyDirector,
        Role::Director,
    ];

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Role::Intern,
            2 => Role::Nysc,
            3 => Role::Physiotherapist,
            4 => Role::Senior,
            5 => Role::Principal,
            6 => Role::DeputyDirector,
            7 => Role::Director,
            other => Role::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Role::Intern => 1,
            Role::Nysc => 2,
            Role::Physiotherapist => 3,
            Role::Senior => 4,
            Role::Principal => 5,
            Role::DeputyDirector => 6,
            Role::Director => 7,
            Role::Unknown(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Intern => "Intern Physiotherapist",
            Role::Nysc => "NYSC Physiotherapist",
            Role::Physiotherapist => "Physiotherapist",
            Role::Senior => "Senior Physiotherapist",
            Role::Principal => "Principal Physiotherapist",
            Role::DeputyDirector => "Deputy Director",
            Role::Director => "Director",
            Role::Unknown(_) => "N/A",
        }
    }
}

impl From<i32> for Role {
    fn from(code: i32) -> Self {
        Role::from_code(code)
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

/// Clinical unit. Stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Unit {
    Neurology,
    Orthopedics,
    Paediatrics,
    /// Any code outside 1..=3, preserved as-is.
    Unknown(i32),
}

impl Unit {
    /// Every assignable unit, in code order.
    pub const ALL: [Unit; 3] = [Unit::Neurology, Unit::Orthopedics, Unit::Paediatrics];

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Unit::Neurology,
            2 => Unit::Orthopedics,
            3 => Unit::Paediatrics,
            other => Unit::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Unit::Neurology => 1,
            Unit::Orthopedics => 2,
            Unit::Paediatrics => 3,
            Unit::Unknown(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Neurology => "Neurology",
            Unit::Orthopedics => "Orthopedics",
            Unit::Paediatrics => "Paediatrics",
            Unit::Unknown(_) => "Unknown Unit",
        }
    }
}

impl From<i32> for Unit {
    fn from(code: i32) -> Self {
        Unit::from_code(code)
    }
}

impl From<Unit> for i32 {
    fn from(unit: Unit) -> Self {
        unit.code()
    }
}

// ─── Forms ───────────────────────────────────────────────────

/// Profile fields submitted when adding or editing a staff member.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StaffForm {
    #[validate(custom(function = "first_name_present"))]
    pub first_name: String,
    #[validate(custom(function = "last_name_present"))]
    pub last_name: String,
    #[validate(custom(function = "ten_digit_phone"))]
    pub phone: String,
    #[validate(
        required(message = "Please select a role"),
        range(min = 1, max = 7, message = "Please select a role")
    )]
    pub role: Option<i32>,
    #[validate(
        required(message = "Please select a unit"),
        range(min = 1, max = 3, message = "Please select a unit")
    )]
    pub unit: Option<i32>,
}

/// Field order used to pick the message reported for an invalid form.
const STAFF_FORM_FIELDS: [&str; 5] = ["first_name", "last_name", "phone", "role", "unit"];

impl StaffForm {
    /// Validate and return the first failure as a user-facing message.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::BadRequest(first_message(&errors, &STAFF_FORM_FIELDS)))
    }

    /// Build a new staff row with empty schedules.
    pub fn into_staff(self, id: String, image_url: String) -> StaffMember {
        StaffMember {
            id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: Role::from_code(self.role.unwrap_or_default()),
            unit: Unit::from_code(self.unit.unwrap_or_default()),
            phone: self.phone.trim().to_string(),
            image_url,
            on_call_dates: Schedule::default(),
            gym_call_dates: Schedule::default(),
            leave_dates: Schedule::default(),
        }
    }

    /// Copy the profile fields onto an existing row, keeping its schedules.
    pub fn apply_to(self, staff: &mut StaffMember) {
        staff.first_name = self.first_name.trim().to_string();
        staff.last_name = self.last_name.trim().to_string();
        staff.phone = self.phone.trim().to_string();
        staff.role = Role::from_code(self.role.unwrap_or_default());
        staff.unit = Unit::from_code(self.unit.unwrap_or_default());
    }
}

/// Administrator sign-in credentials.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// Pick the message of the first failing field in `order`.
pub(crate) fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let field_errors = errors.field_errors();
    order
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .flat_map(|errs| errs.iter())
        .chain(field_errors.values().flat_map(|errs| errs.iter()))
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn first_name_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message("required", "First name is required"));
    }
    Ok(())
}

fn last_name_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message("required", "Last name is required"));
    }
    Ok(())
}

fn ten_digit_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(with_message(
            "phone",
            "Phone number must be exactly 10 digits (e.g., 8012345678)",
        ));
    }
    Ok(())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message(
            "required",
            "Please enter both email and password",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> StaffForm {
        StaffForm {
            first_name: "Sope".to_string(),
            last_name: "Adesida".to_string(),
            phone: "8012345678".to_string(),
            role: Some(1),
            unit: Some(3),
        }
    }

    #[test]
    fn role_codes_cover_every_label() {
        for (idx, role) in Role::ALL.iter().enumerate() {
            let code = idx as i32 + 1;
            assert_eq!(role.code(), code);
            assert_eq!(Role::from_code(code), *role);
            assert_ne!(role.label(), "N/A");
        }
        for code in [0, -1, 8, 99] {
            assert_eq!(Role::from_code(code), Role::Unknown(code));
            assert_eq!(Role::from_code(code).label(), "N/A");
        }
    }

    #[test]
    fn unit_codes_cover_every_label() {
        let labels: Vec<&str> = Unit::ALL.iter().map(|u| u.label()).collect();
        assert_eq!(labels, vec!["Neurology", "Orthopedics", "Paediatrics"]);
        for code in [0, 4, -1] {
            assert_eq!(Unit::from_code(code).label(), "Unknown Unit");
            assert_eq!(Unit::from_code(code).code(), code);
        }
    }

    #[test]
    fn staff_row_round_trips_integer_codes() {
        let json = r#"{
            "id": "a1", "first_name": "Paul", "last_name": "Onimowo",
            "role": 7, "unit": 9, "phone": "8012345678", "image_url": null,
            "on_call_dates": [{"year": 2025, "values": [5, 6]}],
            "gym_call_dates": null
        }"#;
        let staff: StaffMember = serde_json::from_str(json).unwrap();

        assert_eq!(staff.role, Role::Director);
        assert_eq!(staff.unit, Unit::Unknown(9));
        assert!(staff.gym_call_dates.is_empty());
        assert!(staff.leave_dates.is_empty());

        let value = serde_json::to_value(&staff).unwrap();
        assert_eq!(value["role"], 7);
        assert_eq!(value["unit"], 9);
    }

    #[test]
    fn valid_form_passes() {
        assert!(form().check().is_ok());
    }

    #[test]
    fn form_reports_first_failure_in_field_order() {
        let mut f = form();
        f.last_name = " ".to_string();
        f.phone = "123".to_string();
        f.role = None;
        assert_eq!(f.check().unwrap_err().to_string(), "Last name is required");

        let mut f = form();
        f.phone = "80123456a8".to_string();
        assert_eq!(
            f.check().unwrap_err().to_string(),
            "Phone number must be exactly 10 digits (e.g., 8012345678)"
        );

        let mut f = form();
        f.unit = None;
        assert_eq!(f.check().unwrap_err().to_string(), "Please select a unit");
    }

    #[test]
    fn form_rejects_codes_outside_the_label_set() {
        let f: StaffForm = serde_json::from_str(
            r#"{"first_name":"Ada","last_name":"Obi","phone":"8012345678","role":42,"unit":-5}"#,
        )
        .unwrap();
        assert_eq!(f.check().unwrap_err().to_string(), "Please select a role");

        let mut f = form();
        f.unit = Some(4);
        assert_eq!(f.check().unwrap_err().to_string(), "Please select a unit");

        let mut f = form();
        f.role = Some(7);
        f.unit = Some(1);
        assert!(f.check().is_ok());
    }

    #[test]
    fn apply_to_keeps_schedules() {
        let mut staff = form().into_staff("id-1".to_string(), String::new());
        staff.on_call_dates.add(2025, 3);

        let mut edit = form();
        edit.first_name = "  Kehinde ".to_string();
        edit.role = Some(4);
        edit.apply_to(&mut staff);

        assert_eq!(staff.first_name, "Kehinde");
        assert_eq!(staff.role, Role::Senior);
        assert!(staff.on_call_dates.contains(2025, 3));
    }

    #[test]
    fn blank_credentials_rejected() {
        let creds = Credentials {
            email: "admin@example.com".to_string(),
            password: "  ".to_string(),
        };
        assert!(creds.validate().is_err());
    }
}
