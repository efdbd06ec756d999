//! HTTP client for the verification backend.
//!
//! Wraps a shared reqwest `Client` carrying the bearer token and exposes one
//! method per endpoint. Wire payloads are decoded into the `Raw*` types here;
//! turning them into client-side records is the reconciler's job.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{EmailStatus, JobStatus};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Longest error body kept in `AppError::HttpStatus`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct BulkRequest<'a> {
    emails: &'a [String],
}

#[derive(Deserialize, Debug)]
struct BulkResponse {
    verification_id: String,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /api/v1/verify/results/{id}`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatusResponse {
    #[serde(rename = "status", alias = "Status", default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    #[serde(default)]
    pub verification_results: Option<Vec<RawBulkResult>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub invalid_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unknown_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disposable_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub catch_all_count: usize,
    #[serde(default)]
    pub total_emails: Option<usize>,
    #[serde(default)]
    pub processed_count: Option<usize>,
}

/// One per-email record inside a completed job payload.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct RawBulkResult {
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: EmailStatus,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub is_reachable: Option<bool>,
    #[serde(default)]
    pub is_bounce_risk: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `GET /api/v1/verify/email`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawSingleResult {
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: EmailStatus,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mx_records: Vec<String>,
    #[serde(default)]
    pub smtp_check: Option<bool>,
    #[serde(default)]
    pub is_reachable: Option<bool>,
    #[serde(default)]
    pub is_bounce_risk: Option<bool>,
    #[serde(default)]
    pub is_disposable: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Authenticated client for the verification endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds the HTTP client from configuration, attaching the bearer token
    /// to every request when one can be resolved.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "API base URL cannot carry a path: {}",
                config.api_base_url
            )));
        }

        let mut headers = HeaderMap::new();
        match config.resolve_token()? {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(
                    |e| AppError::Config(format!("API token is not a valid header value: {}", e)),
                )?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                tracing::warn!("No API token configured. Requests will be sent unauthenticated.");
            }
        }

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `POST /api/v1/verify/bulk`. Returns the job id.
    pub async fn submit_bulk(&self, emails: &[String]) -> Result<String> {
        let url = self.endpoint(&["api", "v1", "verify", "bulk"]);
        tracing::debug!(target: "bulk_submit", "[Bulk Submit] POST {} ({} emails)", url, emails.len());

        let response = self
            .http
            .post(url)
            .json(&BulkRequest { emails })
            .send()
            .await?;
        let body: BulkResponse = ensure_success(response).await?.json().await?;
        Ok(body.verification_id)
    }

    /// `GET /api/v1/verify/results/{id}`.
    pub async fn fetch_job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let url = self.endpoint(&["api", "v1", "verify", "results", job_id]);
        tracing::trace!(target: "poller", "[Poll {}] GET {}", job_id, url);

        let response = self.http.get(url).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// `GET /api/v1/verify/email?email=...`.
    pub async fn verify_email(&self, email: &str) -> Result<RawSingleResult> {
        let mut url = self.endpoint(&["api", "v1", "verify", "email"]);
        url.query_pairs_mut().append_pair("email", email);
        tracing::debug!(target: "single_verify", "[Single Verify: {}] GET {}", email, url);

        let response = self.http.get(url).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

/// Turns a non-2xx response into `AppError::HttpStatus`, keeping a bounded
/// slice of the body for diagnostics.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(AppError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = Config {
            api_base_url: base.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("https://verify.example.com");
        assert_eq!(
            api.endpoint(&["api", "v1", "verify", "bulk"]).as_str(),
            "https://verify.example.com/api/v1/verify/bulk"
        );

        let api = client("https://example.com/backend/");
        assert_eq!(
            api.endpoint(&["api", "v1", "verify", "results", "job 1/x"]).as_str(),
            "https://example.com/backend/api/v1/verify/results/job%201%2Fx"
        );
    }

    #[test]
    fn test_job_status_payload_decodes() {
        let payload = r#"{
            "status": "completed",
            "VerificationResults": [
                {"Email": "a@x.com", "Status": "valid", "Details": "ok",
                 "IsReachable": true, "IsBounceRisk": false,
                 "CreatedAt": "2024-05-01T10:00:00Z"}
            ],
            "ValidCount": 1,
            "CatchAllCount": 0
        }"#;
        let parsed: JobStatusResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.status, JobStatus::Completed);
        assert_eq!(parsed.valid_count, 1);
        assert_eq!(parsed.invalid_count, 0);
        let results = parsed.verification_results.unwrap();
        assert_eq!(results[0].status, EmailStatus::Valid);
        assert_eq!(results[0].is_reachable, Some(true));
    }

    #[test]
    fn test_processing_payload_without_results() {
        let parsed: JobStatusResponse =
            serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        assert_eq!(parsed.status, JobStatus::Processing);
        assert!(parsed.verification_results.is_none());
    }

    #[test]
    fn test_single_payload_decodes() {
        let payload = r#"{"email": "a@x.com", "status": "catch-all", "details": null,
            "mxRecords": ["mx1.x.com"], "smtpCheck": true,
            "isReachable": true, "isBounceRisk": true}"#;
        let parsed: RawSingleResult = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.status, EmailStatus::CatchAll);
        assert_eq!(parsed.mx_records, vec!["mx1.x.com".to_string()]);
        assert_eq!(parsed.is_disposable, None);
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let payload = r#"{
            "status": "completed",
            "VerificationResults": [
                {"Email": "a@x.com", "Status": null, "Details": null}
            ],
            "ValidCount": null,
            "InvalidCount": 2,
            "CatchAllCount": null
        }"#;
        let parsed: JobStatusResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.status, JobStatus::Completed);
        assert_eq!(parsed.valid_count, 0);
        assert_eq!(parsed.invalid_count, 2);
        assert_eq!(parsed.catch_all_count, 0);
        let results = parsed.verification_results.unwrap();
        assert_eq!(results[0].status, EmailStatus::Unknown);
        assert_eq!(results[0].details, None);

        let single: RawSingleResult = serde_json::from_str(
            r#"{"email": "a@x.com", "status": null, "mxRecords": null}"#,
        )
        .unwrap();
        assert_eq!(single.status, EmailStatus::Unknown);
        assert!(single.mx_records.is_empty());
    }
}
