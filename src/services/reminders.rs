// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local reminder scheduling.
//!
//! A reminder is a one-shot delayed notification handed to a [`JobScheduler`].
//! Receipts of pending reminders are kept in the offline store so they can be
//! listed, cancelled and re-armed after a restart. When a job fires it
//! delivers through the [`Notifier`] and drops its receipt.

use crate::calendar;
use crate::db::OfflineCache;
use crate::error::AppError;
use crate::models::reminder::staff_tag;
use crate::models::{EventKind, Reminder, ReminderRequest, StaffMember};
use chrono::{DateTime, Local, TimeZone, Utc};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

pub const REMINDER_IN_PAST: &str =
    "The reminder date selected is in the past! Please select a future time.";
pub const REMINDER_DUPLICATE: &str = "Reminder for this has already been set!";

/// Deferred job facility.
pub trait JobScheduler: Send + Sync {
    /// Run `job` after `delay`. `tag` groups jobs for bulk cancellation.
    fn enqueue(&self, job_id: &str, tag: &str, delay: Duration, job: BoxFuture<'static, ()>);

    /// Returns whether a pending job was cancelled.
    fn cancel(&self, job_id: &str) -> bool;

    /// Returns the number of pending jobs cancelled.
    fn cancel_by_tag(&self, tag: &str) -> usize;

    fn cancel_all(&self) -> usize;

    fn pending(&self) -> usize;
}

/// Delivers a due reminder to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that writes due reminders to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!(title, message, "Reminder due");
    }
}

struct ScheduledJob {
    tag: String,
    handle: JoinHandle<()>,
}

/// One spawned tokio task per job.
#[derive(Default)]
pub struct TokioJobScheduler {
    jobs: Arc<DashMap<String, ScheduledJob>>,
}

impl TokioJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobScheduler for TokioJobScheduler {
    fn enqueue(&self, job_id: &str, tag: &str, delay: Duration, job: BoxFuture<'static, ()>) {
        self.jobs.retain(|_, j| !j.handle.is_finished());

        let jobs = Arc::clone(&self.jobs);
        let id = job_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
            jobs.remove(&id);
        });

        if let Some(previous) = self.jobs.insert(
            job_id.to_string(),
            ScheduledJob {
                tag: tag.to_string(),
                handle,
            },
        ) {
            previous.handle.abort();
        }
    }

    fn cancel(&self, job_id: &str) -> bool {
        match self.jobs.remove(job_id) {
            Some((_, job)) => {
                let pending = !job.handle.is_finished();
                job.handle.abort();
                pending
            }
            None => false,
        }
    }

    fn cancel_by_tag(&self, tag: &str) -> usize {
        let ids: Vec<String> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().tag == tag)
            .map(|entry| entry.key().clone())
            .collect();
        ids.iter().filter(|id| self.cancel(id)).count()
    }

    fn cancel_all(&self) -> usize {
        let ids: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        ids.iter().filter(|id| self.cancel(id)).count()
    }

    fn pending(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| !entry.value().handle.is_finished())
            .count()
    }
}

/// Start of the event a reminder refers to, in UTC.
///
/// Call events start at 09:00 local time on the Monday of the ISO week;
/// leave starts at 09:00 on the first of the month.
pub fn event_start(kind: EventKind, year: i32, value: u32) -> Option<DateTime<Utc>> {
    let naive = if kind.is_weekly() {
        calendar::week_event_start(year, value)?
    } else {
        calendar::month_event_start(year, value)?
    };
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// When the reminder for `request` should fire.
pub fn fire_time(request: &ReminderRequest) -> Option<DateTime<Utc>> {
    Some(event_start(request.kind, request.year, request.value)? - request.offset.duration())
}

/// "A Week's Ward call Reminder"
pub fn reminder_title(request: &ReminderRequest) -> String {
    format!(
        "{}'s {} Reminder",
        request.offset.short_label(),
        request.kind.label()
    )
}

/// "For Ada Obi's Leave coming up in July, 2025."
pub fn reminder_message(staff: &StaffMember, request: &ReminderRequest) -> String {
    let when = if request.kind.is_weekly() {
        format!("Week {}", request.value)
    } else {
        calendar::month_info(request.value)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| format!("Month {}", request.value))
    };
    format!(
        "For {} {}'s {} coming up in {}, {}.",
        staff.first_name,
        staff.last_name,
        request.kind.label(),
        when,
        request.year
    )
}

/// Books, lists and cancels reminders.
#[derive(Clone)]
pub struct ReminderService {
    inner: Arc<Inner>,
}

struct Inner {
    scheduler: Arc<dyn JobScheduler>,
    notifier: Arc<dyn Notifier>,
    cache: OfflineCache,
    receipts: Mutex<Vec<Reminder>>,
    updates: watch::Sender<Vec<Reminder>>,
}

impl ReminderService {
    pub fn new(
        scheduler: Arc<dyn JobScheduler>,
        notifier: Arc<dyn Notifier>,
        cache: OfflineCache,
    ) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                scheduler,
                notifier,
                cache,
                receipts: Mutex::new(Vec::new()),
                updates,
            }),
        }
    }

    /// Book a reminder for `staff`'s event.
    pub async fn schedule(
        &self,
        staff: &StaffMember,
        request: &ReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<Reminder, AppError> {
        let valid_value = if request.kind.is_weekly() {
            (1..=53).contains(&request.value)
        } else {
            (1..=12).contains(&request.value)
        };
        if !valid_value {
            return Err(AppError::BadRequest(format!(
                "Invalid {} {}",
                if request.kind.is_weekly() { "week" } else { "month" },
                request.value
            )));
        }

        let fire_at = fire_time(request)
            .ok_or_else(|| AppError::BadRequest("Invalid reminder date".to_string()))?;
        if fire_at <= now {
            return Err(AppError::BadRequest(REMINDER_IN_PAST.to_string()));
        }

        let reminder = Reminder {
            staff_id: staff.id.clone(),
            title: reminder_title(request),
            message: reminder_message(staff, request),
            delay_option: request.offset.label().to_string(),
            job_id: uuid::Uuid::new_v4().to_string(),
            fire_at,
        };

        let mut receipts = self.inner.receipts.lock().await;
        if receipts.iter().any(|r| r.duplicates(&reminder)) {
            return Err(AppError::BadRequest(REMINDER_DUPLICATE.to_string()));
        }

        self.arm(&reminder, now);
        receipts.push(reminder.clone());
        self.publish(&receipts).await;

        tracing::info!(
            staff_id = %reminder.staff_id,
            job_id = %reminder.job_id,
            fire_at = %reminder.fire_at,
            "Reminder scheduled"
        );
        Ok(reminder)
    }

    pub async fn list(&self) -> Vec<Reminder> {
        self.inner.receipts.lock().await.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Reminder>> {
        self.inner.updates.subscribe()
    }

    /// Cancel one reminder by its job id.
    pub async fn cancel(&self, job_id: &str) -> Result<(), AppError> {
        let mut receipts = self.inner.receipts.lock().await;
        let before = receipts.len();
        receipts.retain(|r| r.job_id != job_id);
        if receipts.len() == before {
            return Err(AppError::NotFound(format!("Reminder {}", job_id)));
        }

        self.inner.scheduler.cancel(job_id);
        self.publish(&receipts).await;
        tracing::info!(job_id, "Reminder cancelled");
        Ok(())
    }

    /// Cancel every reminder of one staff member. Returns how many were removed.
    pub async fn cancel_for_staff(&self, staff_id: &str) -> usize {
        let mut receipts = self.inner.receipts.lock().await;
        let before = receipts.len();
        receipts.retain(|r| r.staff_id != staff_id);
        let removed = before - receipts.len();

        self.inner.scheduler.cancel_by_tag(&staff_tag(staff_id));
        self.publish(&receipts).await;
        tracing::info!(staff_id, removed, "Reminders cancelled for staff member");
        removed
    }

    pub async fn cancel_all(&self) -> usize {
        let mut receipts = self.inner.receipts.lock().await;
        let removed = receipts.len();
        receipts.clear();

        self.inner.scheduler.cancel_all();
        self.publish(&receipts).await;
        tracing::info!(removed, "All reminders cancelled");
        removed
    }

    /// Re-arm persisted reminders, dropping any whose time has passed.
    ///
    /// Returns the number of reminders re-armed.
    pub async fn restore(&self, now: DateTime<Utc>) -> usize {
        let stored = self.inner.cache.load_reminders().await;
        let total = stored.len();

        let mut receipts = self.inner.receipts.lock().await;
        receipts.clear();
        for reminder in stored {
            if reminder.fire_at <= now {
                tracing::debug!(job_id = %reminder.job_id, "Dropping stale reminder");
                continue;
            }
            self.arm(&reminder, now);
            receipts.push(reminder);
        }

        let restored = receipts.len();
        self.publish(&receipts).await;
        tracing::info!(restored, dropped = total - restored, "Reminders restored");
        restored
    }

    fn arm(&self, reminder: &Reminder, now: DateTime<Utc>) {
        let delay = (reminder.fire_at - now).to_std().unwrap_or_default();
        let service = self.clone();
        let fired = reminder.clone();

        self.inner.scheduler.enqueue(
            &reminder.job_id,
            &reminder.tag(),
            delay,
            Box::pin(async move { service.fire(fired).await }),
        );
    }

    async fn fire(&self, reminder: Reminder) {
        self.inner.notifier.notify(&reminder.title, &reminder.message);

        let mut receipts = self.inner.receipts.lock().await;
        receipts.retain(|r| r.job_id != reminder.job_id);
        self.publish(&receipts).await;
        tracing::info!(job_id = %reminder.job_id, "Reminder delivered");
    }

    /// Persist and broadcast the receipt list.
    async fn publish(&self, receipts: &[Reminder]) {
        if let Err(e) = self.inner.cache.save_reminders(receipts).await {
            tracing::warn!(error = %e, "Failed to persist reminders");
        }
        self.inner.updates.send_replace(receipts.to_vec());
    }
}
