// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator session management.
//!
//! Holds the current session, keeps the backend client's bearer token in
//! sync with it and broadcasts sign-in status changes.

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::staff::first_message;
use crate::models::{Credentials, Session, SessionStatus};
use chrono::{Duration, Utc};
use tokio::sync::{watch, RwLock};
use validator::Validate;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Name recorded as resolver when the session carries no email.
const FALLBACK_ADMIN_NAME: &str = "Admin";

pub struct AuthService {
    db: SupabaseDb,
    session: RwLock<Option<Session>>,
    status: watch::Sender<SessionStatus>,
}

impl AuthService {
    pub fn new(db: SupabaseDb) -> Self {
        let (status, _) = watch::channel(SessionStatus::from(None));
        Self {
            db,
            session: RwLock::new(None),
            status,
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionStatus, AppError> {
        credentials
            .validate()
            .map_err(|e| AppError::BadRequest(first_message(&e, &["email", "password"])))?;

        let session = self
            .db
            .sign_in_with_password(credentials.email.trim(), &credentials.password)
            .await?;
        tracing::info!(email = ?session.email, "Administrator signed in");

        Ok(self.store(Some(session)).await)
    }

    /// Sign out, revoking the session at the backend when reachable.
    pub async fn sign_out(&self) -> SessionStatus {
        let previous = self.session.read().await.clone();
        if let Some(session) = previous {
            if let Err(e) = self.db.sign_out(&session.access_token).await {
                tracing::warn!(error = %e, "Backend sign-out failed; clearing local session");
            }
        }
        tracing::info!("Administrator signed out");
        self.store(None).await
    }

    /// Exchange the refresh token for a new session.
    ///
    /// A rejected refresh token ends the session.
    pub async fn refresh(&self) -> Result<SessionStatus, AppError> {
        let Some(refresh_token) = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
        else {
            return Err(AppError::Unauthorized);
        };

        match self.db.refresh_session(&refresh_token).await {
            Ok(session) => {
                tracing::debug!("Session refreshed");
                Ok(self.store(Some(session)).await)
            }
            Err(AppError::Unauthorized) => {
                tracing::warn!("Refresh token rejected; signing out");
                self.store(None).await;
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh the session if it expires within the refresh margin.
    ///
    /// Connectivity failures keep the current session so cached work can
    /// continue.
    pub async fn ensure_fresh(&self) -> Result<(), AppError> {
        let expiring = self
            .session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| {
                s.expires_within(Utc::now(), Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
            });

        if expiring {
            match self.refresh().await {
                Ok(_) => {}
                Err(e) if e.is_connectivity() => {
                    tracing::debug!(error = %e, "Deferring session refresh while offline");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.status.borrow().signed_in
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Name recorded on suggestions this administrator resolves.
    pub fn admin_name(&self) -> String {
        self.status
            .borrow()
            .email
            .clone()
            .unwrap_or_else(|| FALLBACK_ADMIN_NAME.to_string())
    }

    async fn store(&self, session: Option<Session>) -> SessionStatus {
        let mut guard = self.session.write().await;
        self.db
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        let status = SessionStatus::from(session.as_ref());
        *guard = session;
        self.status.send_replace(status.clone());
        status
    }

    /// Install a session directly (tests only).
    #[doc(hidden)]
    pub async fn set_session_for_test(&self, session: Session) {
        self.store(Some(session)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(email: Option<&str>) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_backend() {
        let auth = AuthService::new(SupabaseDb::new_mock());
        let err = auth
            .sign_in(&Credentials {
                email: "".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter both email and password");
    }

    #[tokio::test]
    async fn status_tracks_session() {
        let auth = AuthService::new(SupabaseDb::new_mock());
        let mut rx = auth.subscribe();
        assert!(!auth.is_signed_in());
        assert_eq!(auth.admin_name(), "Admin");

        auth.set_session_for_test(session(Some("head@physio.ng"))).await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().signed_in);
        assert_eq!(auth.admin_name(), "head@physio.ng");

        // Offline backend: local session is still cleared
        let status = auth.sign_out().await;
        assert!(!status.signed_in);
        assert!(!auth.is_signed_in());
    }

    #[tokio::test]
    async fn refresh_without_session_is_unauthorized() {
        let auth = AuthService::new(SupabaseDb::new_mock());
        assert!(matches!(auth.refresh().await, Err(AppError::Unauthorized)));
        assert!(auth.ensure_fresh().await.is_ok());
    }
}
