use crate::status::JobStatus;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub type JobId = Uuid;

/// A single asynchronous operation (a migration preview or run) and its
/// observable state: status, append-only log, and a cooperative
/// cancellation flag that running work polls at well-defined points.
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    pub connection_id: String,
    pub started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    status: Mutex<JobStatus>,
    error: Mutex<Option<String>>,
    log: Mutex<Vec<String>>,
    cancelled: AtomicBool,
}

impl Job {
    pub(crate) fn new(job_type: impl Into<String>, connection_id: impl Into<String>, now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            job_type: job_type.into(),
            connection_id: connection_id.into(),
            started_at: now,
            finished_at: Mutex::new(None),
            status: Mutex::new(JobStatus::Running),
            error: Mutex::new(None),
            log: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
        })
    }

    pub fn status(&self) -> JobStatus {
        *self.status.lock()
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.finished_at.lock()
    }

    /// Append one line to the job's log. Safe under concurrent callers.
    pub fn append_log(&self, line: impl Into<String>) {
        self.log.lock().push(line.into());
    }

    /// Lines appended since `offset`, plus the new offset to resume from.
    pub fn log_since(&self, offset: usize) -> (Vec<String>, usize) {
        let log = self.log.lock();
        if offset >= log.len() {
            (Vec::new(), log.len())
        } else {
            (log[offset..].to_vec(), log.len())
        }
    }

    pub fn log_len(&self) -> usize {
        self.log.lock().len()
    }

    /// Mark the job cancelled. Running work observes this via
    /// [`Job::is_cancelled`] at its own poll points; nothing is preempted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Transition to `Completed`. Idempotent: only the first terminal
    /// transition has any effect.
    pub fn complete(&self, now: DateTime<Utc>) {
        self.finish(JobStatus::Completed, None, now);
    }

    /// Transition to `Failed` with `message`. Idempotent.
    pub fn fail(&self, message: impl Into<String>, now: DateTime<Utc>) {
        self.finish(JobStatus::Failed, Some(message.into()), now);
    }

    /// Transition to `Cancelled`. Idempotent.
    pub fn mark_cancelled(&self, now: DateTime<Utc>) {
        self.finish(JobStatus::Cancelled, None, now);
    }

    fn finish(&self, target: JobStatus, message: Option<String>, now: DateTime<Utc>) {
        let mut status = self.status.lock();
        if status.is_terminal() {
            return;
        }
        *status = target;
        if let Some(message) = message {
            *self.error.lock() = Some(message);
        }
        *self.finished_at.lock() = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn complete_then_fail_keeps_first_terminal_state() {
        let job = Job::new("preview", "conn-1", now());
        job.complete(now());
        job.fail("too late", now());

        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
    }

    #[test]
    fn log_since_returns_only_new_lines() {
        let job = Job::new("run", "conn-1", now());
        job.append_log("first");
        let (lines, offset) = job.log_since(0);
        assert_eq!(lines, vec!["first".to_string()]);

        job.append_log("second");
        let (lines, _offset) = job.log_since(offset);
        assert_eq!(lines, vec!["second".to_string()]);
    }

    #[test]
    fn cancel_is_observable_without_changing_status() {
        let job = Job::new("run", "conn-1", now());
        job.cancel();
        assert!(job.is_cancelled());
        assert_eq!(job.status(), JobStatus::Running);
    }
}
