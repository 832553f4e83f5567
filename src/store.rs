//! Serialized consumer of poll updates.
//!
//! All cross-job state lives here and is mutated by a single logical thread
//! of control applying updates in channel order, so no locking is needed. A
//! successful poll replaces the job's tree wholesale; handles into the old
//! tree fail `NotFound` rather than observing a half-updated structure.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::client::JobId;
use crate::explorer::browser::Browser;
use crate::explorer::tree::FileTree;
use crate::poller::{PollStatus, PollUpdate};

/// Everything known about one job's output.
#[derive(Debug)]
pub struct JobOutput {
    pub status: PollStatus,
    pub attempts: u32,
    /// Reconstructed output tree; present once the job succeeded.
    pub tree: Option<FileTree>,
    pub logs: Option<String>,
    pub error: Option<String>,
}

impl JobOutput {
    fn fresh() -> JobOutput {
        JobOutput {
            status: PollStatus::Pending,
            attempts: 0,
            tree: None,
            logs: None,
            error: None,
        }
    }
}

/// Per-job status and output, keyed by job id.
#[derive(Debug, Default)]
pub struct JobOutputStore {
    jobs: HashMap<JobId, JobOutput>,
}

impl JobOutputStore {
    pub fn new() -> JobOutputStore {
        JobOutputStore::default()
    }

    /// Apply one update. Returns `false` if the update was dropped by the
    /// monotonic progress guard.
    ///
    /// Guard rules: within one poll cycle, a status may never regress, and
    /// nothing is accepted after a terminal status — except a `Pending`,
    /// which necessarily belongs to a freshly re-registered task (the poller
    /// emits nothing else for a job after its terminal update) and resets
    /// the entry.
    pub fn apply(&mut self, update: PollUpdate) -> bool {
        let entry = self
            .jobs
            .entry(update.job)
            .or_insert_with(JobOutput::fresh);

        if entry.status.is_terminal() {
            if update.status == PollStatus::Pending {
                *entry = JobOutput::fresh();
                return true;
            }
            tracing::debug!(job = %update.job, status = ?update.status, "dropping update after terminal");
            return false;
        }
        if update.status.rank() < entry.status.rank() {
            tracing::debug!(job = %update.job, status = ?update.status, "dropping stale update");
            return false;
        }

        entry.status = update.status;
        entry.attempts = entry.attempts.max(update.attempts);
        if let Some(logs) = update.logs {
            entry.logs = Some(logs);
        }
        entry.error = update.error;

        if update.status == PollStatus::Succeeded {
            let files = update.files.unwrap_or_default();
            let name = update.job.to_string();
            let tree = FileTree::build(&name, files.into_iter().map(|f| (f.path.clone(), f)));
            if tree.skipped() > 0 {
                tracing::warn!(job = %update.job, skipped = tree.skipped(), "output listing had unusable paths");
            }
            entry.tree = Some(tree);
        }
        true
    }

    /// Apply every update currently sitting in the channel, without waiting.
    /// Suited to a per-tick UI cycle; returns the number applied.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<PollUpdate>) -> usize {
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            if self.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    pub fn get(&self, job: JobId) -> Option<&JobOutput> {
        self.jobs.get(&job)
    }

    pub fn tree(&self, job: JobId) -> Option<&FileTree> {
        self.jobs.get(&job).and_then(|o| o.tree.as_ref())
    }

    /// Open a browsing session over the job's current tree, if any.
    pub fn session(&self, job: JobId) -> Option<Browser> {
        self.tree(job).cloned().map(Browser::new)
    }

    /// Forget a job entirely (e.g. its node was deleted from the pipeline).
    pub fn remove(&mut self, job: JobId) -> Option<JobOutput> {
        self.jobs.remove(&job)
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&JobId, &JobOutput)> {
        self.jobs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FileRecord;

    fn update(job: u64, status: PollStatus, attempts: u32) -> PollUpdate {
        PollUpdate {
            job: JobId(job),
            status,
            attempts,
            files: None,
            logs: None,
            error: None,
        }
    }

    fn succeeded(job: u64, paths: &[&str]) -> PollUpdate {
        let mut u = update(job, PollStatus::Succeeded, 2);
        u.files = Some(
            paths
                .iter()
                .enumerate()
                .map(|(i, p)| FileRecord {
                    id: i as u64,
                    path: p.to_string(),
                    size: 1,
                    resource_url: String::new(),
                })
                .collect(),
        );
        u.logs = Some("finished".into());
        u
    }

    #[test]
    fn success_builds_tree_named_after_job() {
        let mut store = JobOutputStore::new();
        assert!(store.apply(update(7, PollStatus::Pending, 0)));
        assert!(store.apply(update(7, PollStatus::Running, 1)));
        assert!(store.apply(succeeded(7, &["data/a.txt", "data/b.txt"])));

        let output = store.get(JobId(7)).unwrap();
        assert_eq!(output.status, PollStatus::Succeeded);
        assert_eq!(output.logs.as_deref(), Some("finished"));

        let tree = store.tree(JobId(7)).unwrap();
        assert_eq!(tree.name(tree.root()).unwrap(), "7");
        assert_eq!(tree.leaf_paths().len(), 2);
    }

    #[test]
    fn stale_update_is_dropped() {
        let mut store = JobOutputStore::new();
        store.apply(update(1, PollStatus::Running, 1));
        assert!(!store.apply(update(1, PollStatus::Pending, 0)));
        assert_eq!(store.get(JobId(1)).unwrap().status, PollStatus::Running);
    }

    #[test]
    fn nothing_lands_after_terminal() {
        let mut store = JobOutputStore::new();
        store.apply(update(2, PollStatus::Cancelled, 1));
        assert!(!store.apply(update(2, PollStatus::Running, 2)));
        assert!(!store.apply(succeeded(2, &["x.txt"])));
        assert_eq!(store.get(JobId(2)).unwrap().status, PollStatus::Cancelled);
        assert!(store.tree(JobId(2)).is_none());
    }

    #[test]
    fn pending_after_terminal_resets_the_cycle() {
        let mut store = JobOutputStore::new();
        store.apply(succeeded(3, &["a.txt"]));
        assert!(store.tree(JobId(3)).is_some());

        // Fresh task after re-registration.
        assert!(store.apply(update(3, PollStatus::Pending, 0)));
        let output = store.get(JobId(3)).unwrap();
        assert_eq!(output.status, PollStatus::Pending);
        assert!(output.tree.is_none());
    }

    #[test]
    fn failure_keeps_error_and_no_tree() {
        let mut store = JobOutputStore::new();
        let mut u = update(4, PollStatus::Failed, 3);
        u.error = Some("job reported FinishedWithError".into());
        store.apply(u);

        let output = store.get(JobId(4)).unwrap();
        assert_eq!(output.status, PollStatus::Failed);
        assert!(output.error.as_ref().unwrap().contains("FinishedWithError"));
        assert!(store.tree(JobId(4)).is_none());
        assert!(store.session(JobId(4)).is_none());
    }

    #[test]
    fn session_browses_the_stored_tree() {
        let mut store = JobOutputStore::new();
        store.apply(succeeded(5, &["data/a.txt", "top.json"]));

        let browser = store.session(JobId(5)).unwrap();
        let names: Vec<String> = browser
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["data", "top.json"]);
    }

    #[test]
    fn replacement_tree_invalidates_old_session_handles() {
        let mut store = JobOutputStore::new();
        store.apply(succeeded(6, &["a/old.txt"]));
        let old_session = store.session(JobId(6)).unwrap();
        let stale = old_session.tree().resolve("a/old.txt").unwrap();

        // New cycle, new output.
        store.apply(update(6, PollStatus::Pending, 0));
        store.apply(succeeded(6, &["a/new.txt"]));
        let new_tree = store.tree(JobId(6)).unwrap();
        assert!(new_tree.name(stale).is_err());
        assert!(new_tree.resolve("a/new.txt").is_ok());
    }

    #[test]
    fn drain_applies_queued_updates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(update(8, PollStatus::Pending, 0)).unwrap();
        tx.send(update(8, PollStatus::Running, 1)).unwrap();
        tx.send(succeeded(8, &["out.txt"])).unwrap();

        let mut store = JobOutputStore::new();
        assert_eq!(store.drain(&mut rx), 3);
        assert_eq!(store.get(JobId(8)).unwrap().status, PollStatus::Succeeded);
        assert_eq!(store.drain(&mut rx), 0);
    }

    #[test]
    fn remove_forgets_the_job() {
        let mut store = JobOutputStore::new();
        store.apply(succeeded(9, &["a.txt"]));
        assert!(store.remove(JobId(9)).is_some());
        assert!(store.get(JobId(9)).is_none());
        assert!(store.remove(JobId(9)).is_none());
    }
}
