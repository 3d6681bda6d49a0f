use crate::job::{Job, JobId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory registry of jobs, keyed by ID. The direct model here is a
/// `DashMap`-backed room registry: cheap concurrent reads, no global lock
/// held across a request.
#[derive(Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Arc<Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Register a new `Running` job and return it.
    pub fn create(&self, job_type: impl Into<String>, connection_id: impl Into<String>) -> Arc<Job> {
        let job = Job::new(job_type, connection_id, Utc::now());
        self.jobs.insert(job.id, job.clone());
        job
    }

    pub fn get(&self, id: JobId) -> Option<Arc<Job>> {
        self.jobs.get(&id).map(|e| e.clone())
    }

    /// All jobs, most-recently-started first.
    pub fn list(&self) -> Vec<Arc<Job>> {
        let mut all: Vec<Arc<Job>> = self.jobs.iter().map(|e| e.clone()).collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_most_recent_first() {
        let store = JobStore::new();
        let first = store.create("preview", "conn-1");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create("run", "conn-1");

        let listed = store.list();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let store = JobStore::new();
        assert!(store.get(uuid::Uuid::new_v4()).is_none());
    }
}
