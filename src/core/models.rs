//! Data structures shared across the verification workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Per-address verdict reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum EmailStatus {
    Valid,
    Invalid,
    #[default]
    Unknown,
    Disposable,
    CatchAll,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Valid => "valid",
            EmailStatus::Invalid => "invalid",
            EmailStatus::Unknown => "unknown",
            EmailStatus::Disposable => "disposable",
            EmailStatus::CatchAll => "catch-all",
        }
    }
}

impl From<String> for EmailStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<&str> for EmailStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "valid" => EmailStatus::Valid,
            "invalid" => EmailStatus::Invalid,
            "disposable" => EmailStatus::Disposable,
            "catch-all" | "catch_all" | "catchall" => EmailStatus::CatchAll,
            _ => EmailStatus::Unknown,
        }
    }
}

impl Serialize for EmailStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a server-side verification job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => JobStatus::Pending,
            "completed" => JobStatus::Completed,
            "failed" | "error" => JobStatus::Failed,
            // Anything else is treated as still running.
            _ => JobStatus::Processing,
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted bulk job, referenced by its opaque server id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationJob {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Number of addresses submitted with the job.
    pub total: usize,
}

impl VerificationJob {
    pub fn new(id: impl Into<String>, total: usize) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            total,
        }
    }
}

/// A verification verdict for one address, as held in client state.
///
/// Produced only from server payloads and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationResult {
    pub email: String,
    pub status: EmailStatus,
    pub reason: Option<String>,
    /// Lowercased substring after the last `@`; empty when there is none.
    pub domain: String,
    pub mx_records: Vec<String>,
    pub smtp_check: Option<bool>,
    pub is_disposable: bool,
    pub is_reachable: bool,
    pub is_bounce_risk: bool,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts for a bulk job. Replaced wholesale, never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUploadResult {
    pub total: usize,
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown: usize,
    pub disposable: usize,
    pub catch_all: usize,
}

impl BulkUploadResult {
    /// Summary for a freshly submitted job: everything zero except `total`.
    pub fn submitted(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn counted(&self) -> usize {
        self.valid + self.invalid + self.unknown + self.disposable + self.catch_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_status_parsing_is_lenient() {
        assert_eq!(EmailStatus::from("VALID"), EmailStatus::Valid);
        assert_eq!(EmailStatus::from(" invalid "), EmailStatus::Invalid);
        assert_eq!(EmailStatus::from("catch_all"), EmailStatus::CatchAll);
        assert_eq!(EmailStatus::from("Catch-All"), EmailStatus::CatchAll);
        assert_eq!(EmailStatus::from("greylisted"), EmailStatus::Unknown);
        assert_eq!(EmailStatus::from(""), EmailStatus::Unknown);
    }

    #[test]
    fn test_email_status_serializes_as_wire_string() {
        let json = serde_json::to_string(&EmailStatus::CatchAll).unwrap();
        assert_eq!(json, "\"catch-all\"");
        let parsed: EmailStatus = serde_json::from_str("\"disposable\"").unwrap();
        assert_eq!(parsed, EmailStatus::Disposable);
    }

    #[test]
    fn test_job_status_unknown_values_mean_processing() {
        assert_eq!(JobStatus::from("completed".to_string()), JobStatus::Completed);
        assert_eq!(JobStatus::from("Running".to_string()), JobStatus::Processing);
        assert_eq!(JobStatus::from("error".to_string()), JobStatus::Failed);
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_submitted_summary_is_zeroed() {
        let summary = BulkUploadResult::submitted(2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.counted(), 0);

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["catchAll"], 0);
    }
}
