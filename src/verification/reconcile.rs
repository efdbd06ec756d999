//! Maps server payloads into client-side records and summaries.

use crate::core::models::{BulkUploadResult, EmailStatus, EmailVerificationResult};
use crate::verification::api::{JobStatusResponse, RawBulkResult, RawSingleResult};
use chrono::{DateTime, Utc};

/// Substring after the last `@`, lowercased. Empty when the address has no `@`.
pub fn derive_domain(email: &str) -> String {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_lowercase())
        .unwrap_or_default()
}

fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn non_blank(reason: Option<String>) -> Option<String> {
    reason.filter(|r| !r.trim().is_empty())
}

/// Converts the per-email records of a completed job, preserving server order.
pub fn reconcile_results(raw: Vec<RawBulkResult>) -> Vec<EmailVerificationResult> {
    raw.into_iter()
        .map(|r| EmailVerificationResult {
            domain: derive_domain(&r.email),
            is_disposable: r.status == EmailStatus::Disposable,
            timestamp: parse_timestamp(r.created_at.as_deref()),
            email: r.email,
            status: r.status,
            reason: non_blank(r.details),
            mx_records: Vec::new(),
            smtp_check: None,
            is_reachable: r.is_reachable.unwrap_or(false),
            is_bounce_risk: r.is_bounce_risk.unwrap_or(false),
        })
        .collect()
}

/// Converts a single-email response.
pub fn reconcile_single(raw: RawSingleResult) -> EmailVerificationResult {
    EmailVerificationResult {
        domain: derive_domain(&raw.email),
        is_disposable: raw
            .is_disposable
            .unwrap_or(raw.status == EmailStatus::Disposable),
        timestamp: parse_timestamp(raw.created_at.as_deref()),
        email: raw.email,
        status: raw.status,
        reason: non_blank(raw.details),
        mx_records: raw.mx_records,
        smtp_check: raw.smtp_check,
        is_reachable: raw.is_reachable.unwrap_or(false),
        is_bounce_risk: raw.is_bounce_risk.unwrap_or(false),
    }
}

/// Builds the replacement summary for a completed job.
///
/// Counts come straight from the payload. `total` falls back to the number of
/// submitted addresses and `processed` to the larger of the summed counts and
/// the number of returned records.
pub fn summarize(
    response: &JobStatusResponse,
    submitted_total: usize,
    result_count: usize,
) -> BulkUploadResult {
    let mut summary = BulkUploadResult {
        total: response.total_emails.unwrap_or(submitted_total),
        processed: 0,
        valid: response.valid_count,
        invalid: response.invalid_count,
        unknown: response.unknown_count,
        disposable: response.disposable_count,
        catch_all: response.catch_all_count,
    };
    summary.processed = response
        .processed_count
        .unwrap_or_else(|| summary.counted().max(result_count));
    tracing::debug!(target: "reconcile", "Summary computed: {:?}", summary);
    summary
}

/// Splits a completed payload into records plus summary.
pub fn reconcile_completed(
    response: JobStatusResponse,
    submitted_total: usize,
) -> (Vec<EmailVerificationResult>, BulkUploadResult) {
    let raw = response.verification_results.clone().unwrap_or_default();
    let summary = summarize(&response, submitted_total, raw.len());
    let results = reconcile_results(raw);
    (results, summary)
}
