//! # Bulk Verify Core Library
//!
//! Client-side workflow for a remote email verification service: submit a
//! batch, poll the resulting job on a fixed interval until it completes,
//! reconcile the returned records into owned state, check single addresses,
//! and export what has been accumulated.
//!
//! Used directly as a library or through the `bulk-verify` command-line tool.

mod core;
pub mod utils;
pub mod verification;

pub use crate::core::config::{
    Config, ConfigBuilder, ConfigFile, BULK_RESULTS_CAP, DEFAULT_POLL_INTERVAL, MAX_BATCH_SIZE,
    SINGLE_RESULTS_CAP,
};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    BulkUploadResult, EmailStatus, EmailVerificationResult, JobStatus, VerificationJob,
};
pub use crate::core::state::VerificationState;
pub use crate::verification::api::ApiClient;
pub use crate::verification::poller::{PollSettings, PollState};
pub use crate::verification::session::VerificationSession;

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

/// Builds a session with an authenticated HTTP client.
pub fn create_session(config: Arc<Config>) -> Result<VerificationSession> {
    VerificationSession::new(config)
}

/// Runs the whole bulk flow for `emails` and returns the final poll state
/// together with the resulting client state.
pub async fn verify_batch(
    config: Arc<Config>,
    emails: Vec<String>,
) -> Result<(PollState, VerificationState)> {
    let mut session = create_session(config)?;
    let final_state = session.run_bulk(emails).await?;
    Ok((final_state, session.snapshot()))
}

/// Checks several addresses through the single-email endpoint, at most
/// `max_concurrency` at a time.
///
/// Returns one entry per input, in completion order. A task that fails to
/// join is reported as `AppError::Task` for its address.
pub async fn verify_individually(
    session: Arc<VerificationSession>,
    emails: Vec<String>,
    max_concurrency: usize,
) -> Vec<(String, Result<EmailVerificationResult>)> {
    let total = emails.len();
    if total == 0 {
        return Vec::new();
    }
    let limit = max_concurrency.max(1);

    let mut tasks = FuturesUnordered::new();
    let mut outcomes = Vec::with_capacity(total);

    for email in emails {
        while tasks.len() >= limit {
            match tasks.next().await {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }

        let session_clone = Arc::clone(&session);
        let task_email = email.clone();
        let handle = tokio::spawn(async move {
            let result = session_clone.verify_single(&task_email).await;
            (task_email, result)
        });
        tasks.push(async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Verification task for {} failed to join: {}", email, e);
                    let err = AppError::Task(format!("Verification task failed: {}", e));
                    (email, Err(err))
                }
            }
        });
    }

    while let Some(outcome) = tasks.next().await {
        outcomes.push(outcome);
    }

    outcomes
}
