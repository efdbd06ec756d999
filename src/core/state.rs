//! Owned client-side state for the verification workflow.
//!
//! Every mutation goes through one of the `apply_*` / `mark_*` functions so the
//! truncation and replacement rules hold no matter which path produced the data.

use crate::core::config::Config;
use crate::core::models::{BulkUploadResult, EmailVerificationResult, JobStatus, VerificationJob};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationState {
    job: Option<VerificationJob>,
    is_verifying: bool,
    summary: Option<BulkUploadResult>,
    results: Vec<EmailVerificationResult>,
    #[serde(skip)]
    bulk_results_cap: usize,
    #[serde(skip)]
    single_results_cap: usize,
}

impl VerificationState {
    pub fn new(bulk_results_cap: usize, single_results_cap: usize) -> Self {
        Self {
            job: None,
            is_verifying: false,
            summary: None,
            results: Vec::new(),
            bulk_results_cap,
            single_results_cap,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.bulk_results_cap, config.single_results_cap)
    }

    pub fn job(&self) -> Option<&VerificationJob> {
        self.job.as_ref()
    }

    pub fn is_verifying(&self) -> bool {
        self.is_verifying
    }

    pub fn summary(&self) -> Option<&BulkUploadResult> {
        self.summary.as_ref()
    }

    /// Accumulated results, most recent first.
    pub fn results(&self) -> &[EmailVerificationResult] {
        &self.results
    }

    /// Records a freshly created job with a zeroed summary.
    pub(crate) fn begin_job(&mut self, job: VerificationJob) {
        self.summary = Some(BulkUploadResult::submitted(job.total));
        self.job = Some(job);
        self.is_verifying = true;
    }

    /// Submission failed: nothing is retained about the attempted job.
    pub(crate) fn mark_submission_failed(&mut self) {
        self.job = None;
        self.is_verifying = false;
    }

    /// Applies the payload of the first completed poll.
    ///
    /// New results are prepended in server order, the list is cut to the bulk
    /// cap, and the summary is replaced outright.
    pub(crate) fn apply_bulk_completion(
        &mut self,
        new_results: Vec<EmailVerificationResult>,
        summary: BulkUploadResult,
    ) {
        let mut merged = new_results;
        merged.append(&mut self.results);
        merged.truncate(self.bulk_results_cap);
        self.results = merged;
        self.summary = Some(summary);
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Completed;
        }
        self.is_verifying = false;
    }

    /// Polling gave up or the server reported failure. Results and summary stay as they were.
    pub(crate) fn mark_job_failed(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Failed;
        }
        self.is_verifying = false;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.is_verifying = false;
    }

    /// Inserts one result at the front and truncates the whole list to the single cap.
    pub(crate) fn apply_single(&mut self, result: EmailVerificationResult) {
        self.results.insert(0, result);
        self.results.truncate(self.single_results_cap);
    }
}
