//! Fixed-interval job status polling.
//!
//! A poll loop runs as its own tokio task and moves through
//! `Idle -> Polling -> Completed | Failed | Cancelled`. Progress is published on
//! a `watch` channel; the final state is also the task's return value.

use crate::core::config::Config;
use crate::core::error::AppError;
use crate::core::models::{JobStatus, VerificationJob};
use crate::core::state::VerificationState;
use crate::verification::api::{ApiClient, JobStatusResponse};
use crate::verification::reconcile::reconcile_completed;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { job_id: String, attempts: u32 },
    Completed { job_id: String, attempts: u32 },
    Failed { job_id: String, reason: String },
    Cancelled { job_id: String },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed { .. } | PollState::Failed { .. } | PollState::Cancelled { .. }
        )
    }
}

/// Limits governing one poll loop. Zero for a count means unlimited.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    pub timeout: Option<Duration>,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
            max_consecutive_errors: config.max_consecutive_poll_errors,
            timeout: config.poll_timeout,
        }
    }
}

/// Outcome of a single status request.
#[derive(Debug)]
pub(crate) enum PollTick {
    NotReady(JobStatus),
    Completed(JobStatusResponse),
    JobFailed,
    RequestFailed(AppError),
}

pub(crate) async fn poll_once(api: &ApiClient, job_id: &str) -> PollTick {
    match api.fetch_job_status(job_id).await {
        Ok(response) => match response.status.clone() {
            JobStatus::Completed => PollTick::Completed(response),
            JobStatus::Failed => PollTick::JobFailed,
            other => PollTick::NotReady(other),
        },
        Err(e) => PollTick::RequestFailed(e),
    }
}

pub(crate) struct PollContext {
    pub(crate) api: ApiClient,
    pub(crate) job: VerificationJob,
    pub(crate) settings: PollSettings,
    pub(crate) state: Arc<Mutex<VerificationState>>,
    pub(crate) progress: watch::Sender<PollState>,
    pub(crate) cancel: CancellationToken,
}

impl PollContext {
    fn finish(&self, final_state: PollState) -> PollState {
        match final_state {
            PollState::Completed { .. } => {}
            PollState::Failed { ref reason, .. } => {
                tracing::warn!(target: "poller", "[Poll {}] Giving up: {}", self.job.id, reason);
                self.state.lock().mark_job_failed();
            }
            _ => self.state.lock().mark_cancelled(),
        }
        self.progress.send_replace(final_state.clone());
        final_state
    }
}

/// Drives polling for one job until a terminal state is reached.
///
/// The results list and summary are only touched on the first tick that sees
/// `completed`; every other tick leaves them alone.
pub(crate) async fn run_poll_loop(ctx: PollContext) -> PollState {
    let job_id = ctx.job.id.clone();
    let label = format!("[Poll {}]", job_id);
    let settings = &ctx.settings;
    let started = Instant::now();
    let period = settings.interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u32 = 0;
    let mut consecutive_errors: u32 = 0;
    ctx.progress.send_replace(PollState::Polling {
        job_id: job_id.clone(),
        attempts,
    });
    tracing::info!(target: "poller", "{} Polling every {:?}", label, settings.interval);

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::info!(target: "poller", "{} Cancelled before next tick", label);
                return ctx.finish(PollState::Cancelled { job_id });
            }
            _ = ticker.tick() => {}
        }

        attempts += 1;
        let tick = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::info!(target: "poller", "{} Cancelled during request", label);
                return ctx.finish(PollState::Cancelled { job_id });
            }
            tick = poll_once(&ctx.api, &job_id) => tick,
        };

        match tick {
            PollTick::Completed(response) => {
                let (results, summary) = reconcile_completed(response, ctx.job.total);
                tracing::info!(target: "poller",
                    "{} Completed after {} attempt(s): {} result(s), {} valid / {} invalid",
                    label, attempts, results.len(), summary.valid, summary.invalid
                );
                ctx.state.lock().apply_bulk_completion(results, summary);
                return ctx.finish(PollState::Completed { job_id, attempts });
            }
            PollTick::JobFailed => {
                return ctx.finish(PollState::Failed {
                    job_id,
                    reason: "Backend reported the job as failed".to_string(),
                });
            }
            PollTick::NotReady(status) => {
                consecutive_errors = 0;
                tracing::debug!(target: "poller", "{} Attempt {}: status '{}'", label, attempts, status);
            }
            PollTick::RequestFailed(e) => {
                consecutive_errors += 1;
                tracing::warn!(target: "poller",
                    "{} Attempt {} failed ({} in a row): {}",
                    label, attempts, consecutive_errors, e
                );
            }
        }

        if settings.max_consecutive_errors > 0 && consecutive_errors >= settings.max_consecutive_errors {
            return ctx.finish(PollState::Failed {
                job_id,
                reason: format!("{} consecutive poll errors", consecutive_errors),
            });
        }
        if settings.max_attempts > 0 && attempts >= settings.max_attempts {
            return ctx.finish(PollState::Failed {
                job_id,
                reason: format!("Job not completed after {} attempts", attempts),
            });
        }
        if let Some(limit) = settings.timeout {
            if started.elapsed() >= limit {
                return ctx.finish(PollState::Failed {
                    job_id,
                    reason: format!("Job not completed within {:?}", limit),
                });
            }
        }

        ctx.progress.send_replace(PollState::Polling {
            job_id: job_id.clone(),
            attempts,
        });
    }
}
