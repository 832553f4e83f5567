//! Status polling for in-flight jobs.
//!
//! One spawned task per registered job id. A task fetches the job's status,
//! sleeps the configured (optionally backed-off) interval while the remote
//! side is still working, and exits on the first terminal result. Fetches
//! within one job are strictly sequential; distinct jobs are independent.
//! Every status change is pushed over one unbounded channel to a single
//! consumer, so per-job updates arrive in emission order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{FileRecord, JobId, JobState, StatusClient};
use crate::config::PollerConfig;

/// Local lifecycle status of one poll task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl PollStatus {
    /// Progress rank: `Pending < Running <` any terminal status. Terminal
    /// statuses share a rank — only one of them is ever observed per task.
    pub fn rank(&self) -> u8 {
        match self {
            PollStatus::Pending => 0,
            PollStatus::Running => 1,
            PollStatus::Succeeded | PollStatus::Failed | PollStatus::Cancelled => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

/// One status-change notification for a job.
#[derive(Debug, Clone)]
pub struct PollUpdate {
    pub job: JobId,
    pub status: PollStatus,
    /// Fetch attempts issued so far.
    pub attempts: u32,
    /// Output listing; present on `Succeeded` when the server supplied one.
    pub files: Option<Vec<FileRecord>>,
    /// Compute log carried through for diagnostic display.
    pub logs: Option<String>,
    /// Failure description; present on `Failed`.
    pub error: Option<String>,
}

impl PollUpdate {
    fn bare(job: JobId, status: PollStatus, attempts: u32) -> PollUpdate {
        PollUpdate {
            job,
            status,
            attempts,
            files: None,
            logs: None,
            error: None,
        }
    }
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages one cancellable polling task per active job id.
pub struct ResourcePoller<C: ?Sized> {
    client: Arc<C>,
    config: PollerConfig,
    tx: mpsc::UnboundedSender<PollUpdate>,
    tasks: HashMap<JobId, PollTask>,
}

impl<C> ResourcePoller<C>
where
    C: StatusClient + ?Sized + 'static,
{
    /// Create a poller and the receiving end of its update channel.
    pub fn new(client: Arc<C>, config: PollerConfig) -> (Self, mpsc::UnboundedReceiver<PollUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ResourcePoller {
                client,
                config,
                tx,
                tasks: HashMap::new(),
            },
            rx,
        )
    }

    /// Start polling a job. Returns `false` (and does nothing) if a task for
    /// this id is still active; a job whose previous task reached a terminal
    /// state or was cancelled starts fresh from `Pending`.
    pub fn register(&mut self, job: JobId) -> bool {
        if let Some(task) = self.tasks.get(&job) {
            if !task.handle.is_finished() {
                return false;
            }
        }
        tracing::debug!(%job, "registering poll task");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_job(
            Arc::clone(&self.client),
            job,
            self.config,
            self.tx.clone(),
            cancel.clone(),
        ));
        self.tasks.insert(job, PollTask { cancel, handle });
        true
    }

    /// Request cancellation of a job's poll task.
    ///
    /// Idempotent: unknown ids and already-terminal tasks are a no-op. An
    /// active task aborts its in-flight fetch (or suppresses the raced
    /// result), emits a final `Cancelled` update, and emits nothing further.
    pub fn cancel(&mut self, job: JobId) {
        if let Some(task) = self.tasks.remove(&job) {
            if !task.handle.is_finished() {
                tracing::debug!(%job, "cancelling poll task");
                task.cancel.cancel();
            }
        }
    }

    /// Whether a poll task for this job is still running.
    pub fn is_active(&self, job: JobId) -> bool {
        self.tasks
            .get(&job)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Cancel every active task.
    pub fn shutdown(&mut self) {
        for (job, task) in self.tasks.drain() {
            if !task.handle.is_finished() {
                tracing::debug!(%job, "cancelling poll task at shutdown");
                task.cancel.cancel();
            }
        }
    }
}

impl<C: ?Sized> Drop for ResourcePoller<C> {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.cancel.cancel();
        }
    }
}

/// Emit an update; a closed channel means the consumer is gone and the task
/// should just stop.
fn emit(tx: &mpsc::UnboundedSender<PollUpdate>, update: PollUpdate) -> bool {
    tx.send(update).is_ok()
}

fn next_interval(current: Duration, config: &PollerConfig) -> Duration {
    let scaled = current.as_secs_f64() * config.backoff_factor;
    Duration::from_secs_f64(scaled.min(config.max_interval.as_secs_f64()))
}

async fn poll_job<C>(
    client: Arc<C>,
    job: JobId,
    config: PollerConfig,
    tx: mpsc::UnboundedSender<PollUpdate>,
    cancel: CancellationToken,
) where
    C: StatusClient + ?Sized,
{
    let mut attempts: u32 = 0;
    let mut wait = config.interval;

    if !emit(&tx, PollUpdate::bare(job, PollStatus::Pending, 0)) {
        return;
    }

    loop {
        if cancel.is_cancelled() {
            emit(&tx, PollUpdate::bare(job, PollStatus::Cancelled, attempts));
            return;
        }

        attempts += 1;
        if !emit(&tx, PollUpdate::bare(job, PollStatus::Running, attempts)) {
            return;
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                emit(&tx, PollUpdate::bare(job, PollStatus::Cancelled, attempts));
                return;
            }
            response = client.fetch_job_status(job) => response,
        };

        // A cancel that raced the fetch resolution suppresses its result.
        if cancel.is_cancelled() {
            emit(&tx, PollUpdate::bare(job, PollStatus::Cancelled, attempts));
            return;
        }

        match response {
            Err(err) => {
                tracing::warn!(%job, %err, "status fetch failed");
                let mut update = PollUpdate::bare(job, PollStatus::Failed, attempts);
                update.error = Some(err.to_string());
                emit(&tx, update);
                return;
            }
            Ok(resp) => match resp.state {
                JobState::FinishedSuccessfully => {
                    tracing::debug!(%job, attempts, "job finished");
                    let mut update = PollUpdate::bare(job, PollStatus::Succeeded, attempts);
                    update.files = Some(resp.files.unwrap_or_default());
                    update.logs = resp.logs;
                    emit(&tx, update);
                    return;
                }
                JobState::FinishedWithError | JobState::Cancelled => {
                    tracing::debug!(%job, state = ?resp.state, "job ended remotely");
                    let mut update = PollUpdate::bare(job, PollStatus::Failed, attempts);
                    update.error = Some(format!("job reported {:?}", resp.state));
                    update.logs = resp.logs;
                    emit(&tx, update);
                    return;
                }
                // Still in progress: wait out the interval, then refetch.
                _ => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            emit(&tx, PollUpdate::bare(job, PollStatus::Cancelled, attempts));
                            return;
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                    wait = next_interval(wait, &config);
                }
            },
        }
    }
}
