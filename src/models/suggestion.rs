// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Suggestion box model.

use crate::error::AppError;
use crate::models::staff::first_message;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

fn anonymous() -> String {
    "Anonymous".to_string()
}

/// Suggestion row stored in the `suggestions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub text: String,
    #[serde(default = "anonymous")]
    pub author: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_by: Option<String>,
    /// Creation time, ms since the Unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub resolved_timestamp: Option<i64>,
    #[serde(default)]
    pub resolution_note: Option<String>,
}

/// Patch body sent when an administrator resolves a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionUpdate {
    pub resolved: bool,
    pub resolved_by: String,
    pub resolved_timestamp: i64,
    pub resolution_note: String,
}

/// Body of a new suggestion submitted by any user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSuggestion {
    #[validate(custom(function = "suggestion_text_present"))]
    pub text: String,
    /// Blank or missing authors are recorded as "Anonymous".
    #[serde(default)]
    pub author: Option<String>,
}

impl NewSuggestion {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::BadRequest(first_message(&errors, &["text"])))
    }

    pub fn into_suggestion(self, id: String, timestamp: i64) -> Suggestion {
        let author = self
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(anonymous);

        Suggestion {
            id,
            text: self.text.trim().to_string(),
            author,
            resolved: false,
            resolved_by: None,
            timestamp,
            resolved_timestamp: None,
            resolution_note: None,
        }
    }
}

/// Body of a resolve request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub resolution_note: String,
}

fn suggestion_text_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("Suggestion cannot be empty")));
    }
    Ok(())
}
