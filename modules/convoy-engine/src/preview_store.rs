use crate::data::{ExportedData, MigrationPreview};
use dashmap::DashMap;
use uuid::Uuid;

/// Holds one preview job's output until the paired run job consumes it.
/// Written once by the preview job on completion, read once by the run job,
/// then removed so state never accumulates across many preview/run cycles.
#[derive(Default)]
pub struct PreviewStore {
    entries: DashMap<Uuid, (ExportedData, MigrationPreview)>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, job_id: Uuid, data: ExportedData, preview: MigrationPreview) {
        self.entries.insert(job_id, (data, preview));
    }

    /// Remove and return the entry for `job_id`, if present.
    pub fn take(&self, job_id: Uuid) -> Option<(ExportedData, MigrationPreview)> {
        self.entries.remove(&job_id).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_removes_the_entry() {
        let store = PreviewStore::new();
        let id = Uuid::new_v4();
        store.put(id, ExportedData::default(), MigrationPreview::default());

        assert!(store.take(id).is_some());
        assert!(store.take(id).is_none());
    }
}
