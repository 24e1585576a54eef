// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator session issued by the auth backend.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in administrator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    /// Email of the signed-in administrator, if the backend returned one
    pub email: Option<String>,
}

impl Session {
    /// Whether the access token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

/// Public view of the session, without tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub signed_in: bool,
    pub email: Option<String>,
}

impl From<Option<&Session>> for SessionStatus {
    fn from(session: Option<&Session>) -> Self {
        Self {
            signed_in: session.is_some(),
            email: session.and_then(|s| s.email.clone()),
        }
    }
}
