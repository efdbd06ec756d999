//! `VerificationSession`: the owner of client state and of the single poll task.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{BulkUploadResult, EmailVerificationResult, VerificationJob};
use crate::core::state::VerificationState;
use crate::utils::export;
use crate::utils::input::validate_email;
use crate::verification::api::ApiClient;
use crate::verification::poller::{run_poll_loop, PollContext, PollSettings, PollState};
use crate::verification::reconcile::reconcile_single;

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<PollState>,
}

/// Drives one client's verification workflow.
///
/// Holds the shared [`VerificationState`] and at most one registered poll
/// task. Dropping the session cancels that task.
pub struct VerificationSession {
    api: ApiClient,
    config: Arc<Config>,
    state: Arc<Mutex<VerificationState>>,
    progress: watch::Sender<PollState>,
    poll: Option<PollHandle>,
}

impl VerificationSession {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        Ok(Self::with_client(config, api))
    }

    pub fn with_client(config: Arc<Config>, api: ApiClient) -> Self {
        let (progress, _) = watch::channel(PollState::Idle);
        Self {
            api,
            state: Arc::new(Mutex::new(VerificationState::from_config(&config))),
            config,
            progress,
            poll: None,
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> VerificationState {
        self.state.lock().clone()
    }

    pub fn results(&self) -> Vec<EmailVerificationResult> {
        self.state.lock().results().to_vec()
    }

    pub fn summary(&self) -> Option<BulkUploadResult> {
        self.state.lock().summary().copied()
    }

    pub fn current_job(&self) -> Option<VerificationJob> {
        self.state.lock().job().cloned()
    }

    /// Receiver for poll progress updates.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.progress.subscribe()
    }

    pub fn poll_state(&self) -> PollState {
        self.progress.borrow().clone()
    }

    /// True while a poll task is registered and has not finished.
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|p| !p.task.is_finished())
    }

    /// Creates a bulk job and returns immediately with its id.
    ///
    /// Empty or oversize batches are rejected without any request. A failed
    /// submission leaves the session inactive with no job recorded.
    pub async fn submit_bulk(&mut self, emails: Vec<String>) -> Result<VerificationJob> {
        if emails.is_empty() {
            tracing::warn!(target: "bulk_submit", "[Bulk Submit] Nothing to submit.");
            return Err(AppError::EmptyBatch);
        }
        if emails.len() > self.config.max_batch_size {
            return Err(AppError::BatchTooLarge {
                count: emails.len(),
                max: self.config.max_batch_size,
            });
        }
        if let Some(ref handle) = self.poll {
            if !handle.task.is_finished() {
                return Err(AppError::PollAlreadyActive(handle.job_id.clone()));
            }
        }
        self.poll = None;

        tracing::info!(target: "bulk_submit", "[Bulk Submit] Submitting {} email(s)", emails.len());
        match self.api.submit_bulk(&emails).await {
            Ok(job_id) => {
                let job = VerificationJob::new(job_id, emails.len());
                tracing::info!(target: "bulk_submit", "[Bulk Submit] Job {} created", job.id);
                self.state.lock().begin_job(job.clone());
                self.progress.send_replace(PollState::Idle);
                Ok(job)
            }
            Err(e) => {
                tracing::error!(target: "bulk_submit", "[Bulk Submit] Failed to create job: {}", e);
                self.state.lock().mark_submission_failed();
                Err(e)
            }
        }
    }

    /// Registers the poll task for the current job.
    ///
    /// Returns `Ok(false)` without doing anything when a task is already
    /// registered for a job that is still being polled.
    pub fn start_polling(&mut self) -> Result<bool> {
        if self.is_polling() {
            tracing::debug!(target: "poller", "Poll already registered; not starting another.");
            return Ok(false);
        }
        let job = {
            let state = self.state.lock();
            match state.job() {
                Some(job) if state.is_verifying() => job.clone(),
                _ => return Err(AppError::NoActiveJob),
            }
        };

        let cancel = CancellationToken::new();
        let ctx = PollContext {
            api: self.api.clone(),
            job: job.clone(),
            settings: PollSettings::from_config(&self.config),
            state: Arc::clone(&self.state),
            progress: self.progress.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(run_poll_loop(ctx));
        self.poll = Some(PollHandle {
            job_id: job.id,
            cancel,
            task,
        });
        Ok(true)
    }

    /// Waits for the registered poll task to finish and unregisters it.
    pub async fn wait(&mut self) -> Result<PollState> {
        let Some(handle) = self.poll.take() else {
            return Ok(self.poll_state());
        };
        handle
            .task
            .await
            .map_err(|e| AppError::Task(format!("Poll task for job {} failed: {}", handle.job_id, e)))
    }

    /// Submits, polls and waits in one call.
    pub async fn run_bulk(&mut self, emails: Vec<String>) -> Result<PollState> {
        self.submit_bulk(emails).await?;
        self.start_polling()?;
        self.wait().await
    }

    /// Stops the registered poll task, if any.
    pub fn cancel(&mut self) {
        if let Some(ref handle) = self.poll {
            tracing::info!(target: "poller", "[Poll {}] Cancel requested", handle.job_id);
            handle.cancel.cancel();
        }
    }

    /// Checks one address immediately. Malformed input never reaches the network.
    pub async fn verify_single(&self, email: &str) -> Result<EmailVerificationResult> {
        let email = validate_email(email).map_err(|e| {
            tracing::warn!(target: "single_verify", "{}", e);
            e
        })?;
        let label = format!("[Single Verify: {}]", email);

        match self.api.verify_email(&email).await {
            Ok(raw) => {
                let result = reconcile_single(raw);
                tracing::info!(target: "single_verify", "{} Status: {}", label, result.status);
                self.state.lock().apply_single(result.clone());
                Ok(result)
            }
            Err(e) => {
                tracing::error!(target: "single_verify", "{} Failed: {}", label, e);
                Err(e)
            }
        }
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let state = self.snapshot();
        export::write_csv(state.results(), writer)
    }

    pub fn export_json<W: Write>(&self, writer: W) -> Result<()> {
        let state = self.snapshot();
        export::write_json(state.results(), state.summary(), writer)
    }
}

impl Drop for VerificationSession {
    fn drop(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.cancel.cancel();
        }
    }
}
