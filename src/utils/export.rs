//! CSV and JSON export of accumulated results.

use crate::core::error::Result;
use crate::core::models::{BulkUploadResult, EmailVerificationResult};
use serde::Serialize;
use std::io::Write;

pub const CSV_HEADER: [&str; 10] = [
    "Email",
    "Status",
    "Reason",
    "Domain",
    "MX Records",
    "SMTP Check",
    "Disposable",
    "Reachable",
    "Bounce Risk",
    "Timestamp",
];

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn csv_row(result: &EmailVerificationResult) -> [String; 10] {
    [
        result.email.clone(),
        result.status.to_string(),
        result.reason.clone().unwrap_or_default(),
        result.domain.clone(),
        result.mx_records.join("; "),
        result.smtp_check.map_or("N/A", yes_no).to_string(),
        yes_no(result.is_disposable).to_string(),
        yes_no(result.is_reachable).to_string(),
        yes_no(result.is_bounce_risk).to_string(),
        result.timestamp.to_rfc3339(),
    ]
}

fn write_line<W: Write>(writer: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")
}

/// Writes a header plus one row per result, in list order.
pub fn write_csv<W: Write>(results: &[EmailVerificationResult], mut writer: W) -> Result<()> {
    write_line(&mut writer, &CSV_HEADER)?;
    for result in results {
        let row = csv_row(result);
        let fields: Vec<&str> = row.iter().map(String::as_str).collect();
        write_line(&mut writer, &fields)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(results: &[EmailVerificationResult]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(results, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[derive(Serialize)]
struct JsonExport<'a> {
    summary: Option<&'a BulkUploadResult>,
    results: &'a [EmailVerificationResult],
}

/// Pretty-printed `{ summary, results }` document.
pub fn write_json<W: Write>(
    results: &[EmailVerificationResult],
    summary: Option<&BulkUploadResult>,
    writer: W,
) -> Result<()> {
    serde_json::to_writer_pretty(writer, &JsonExport { summary, results })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::EmailStatus;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample(email: &str, reason: Option<&str>) -> EmailVerificationResult {
        EmailVerificationResult {
            email: email.to_string(),
            status: EmailStatus::CatchAll,
            reason: reason.map(str::to_string),
            domain: "x.com".to_string(),
            mx_records: vec!["mx1.x.com".to_string(), "mx2.x.com".to_string()],
            smtp_check: None,
            is_disposable: false,
            is_reachable: true,
            is_bounce_risk: true,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_csv_header_and_row_order() {
        let csv = to_csv_string(&[sample("a@x.com", None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Email,Status,Reason,Domain,MX Records,SMTP Check,Disposable,Reachable,Bounce Risk,Timestamp"
        );
        assert_eq!(
            lines[1],
            "a@x.com,catch-all,,x.com,mx1.x.com; mx2.x.com,N/A,No,Yes,Yes,2024-05-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_csv_row_count_matches_results() {
        let results: Vec<_> = (0..7).map(|i| sample(&format!("u{}@x.com", i), None)).collect();
        let csv = to_csv_string(&results).unwrap();
        assert_eq!(csv.lines().count(), results.len() + 1);

        let empty = to_csv_string(&[]).unwrap();
        assert_eq!(empty.lines().count(), 1);
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        let csv = to_csv_string(&[sample("a@x.com", Some("said \"no\", then\nhung up"))]).unwrap();
        assert!(csv.contains("\"said \"\"no\"\", then\nhung up\""));
    }

    #[test]
    fn test_json_export_shape() {
        let summary = BulkUploadResult::submitted(1);
        let mut buffer = Vec::new();
        write_json(&[sample("a@x.com", None)], Some(&summary), &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["results"][0]["status"], "catch-all");
        assert_eq!(value["results"][0]["isBounceRisk"], true);
    }
}
