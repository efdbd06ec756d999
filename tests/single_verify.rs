use std::sync::Arc;
use std::time::Duration;

use bulk_verify_core::{
    verify_individually, AppError, ConfigBuilder, EmailStatus, VerificationSession,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer, single_cap: usize) -> VerificationSession {
    let config = ConfigBuilder::new()
        .skip_default_files()
        .api_base_url(server.uri())
        .api_token("test-token")
        .request_timeout(Duration::from_secs(5))
        .single_results_cap(single_cap)
        .build()
        .expect("config builds");
    VerificationSession::new(Arc::new(config)).unwrap()
}

#[tokio::test]
async fn malformed_address_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server, 50);
    let err = session.verify_single("test@@bad").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidEmailFormat(ref e) if e == "test@@bad"));
    assert_eq!(err.to_string(), "Invalid email format: 'test@@bad'");
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn single_result_is_prepended_with_all_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .and(query_param("email", "jane+news@example.com"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "jane+news@example.com",
            "status": "disposable",
            "details": "throwaway provider",
            "mxRecords": ["mx1.example.com", "mx2.example.com"],
            "smtpCheck": true,
            "isReachable": true,
            "isBounceRisk": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, 50);
    let result = session
        .verify_single("  jane+news@example.com ")
        .await
        .unwrap();

    assert_eq!(result.status, EmailStatus::Disposable);
    assert!(result.is_disposable);
    assert_eq!(result.domain, "example.com");
    assert_eq!(result.reason.as_deref(), Some("throwaway provider"));
    assert_eq!(result.mx_records.len(), 2);
    assert_eq!(result.smtp_check, Some(true));
    assert_eq!(session.results(), vec![result]);
}

#[tokio::test]
async fn single_failure_leaves_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let session = session_for(&server, 50);
    let err = session.verify_single("a@x.com").await.unwrap_err();
    assert!(matches!(err, AppError::HttpStatus { status: 502, .. }));
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn single_path_keeps_its_own_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@x.com", "status": "valid"
        })))
        .mount(&server)
        .await;

    let session = Arc::new(session_for(&server, 2));
    let emails: Vec<String> = (0..5).map(|i| format!("user{}@x.com", i)).collect();
    let outcomes = verify_individually(session.clone(), emails, 2).await;

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(session.results().len(), 2);
}

#[tokio::test]
async fn csv_export_has_one_row_per_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@x.com", "status": "valid", "isReachable": true
        })))
        .mount(&server)
        .await;

    let session = session_for(&server, 50);
    for _ in 0..3 {
        session.verify_single("a@x.com").await.unwrap();
    }

    let mut buffer = Vec::new();
    session.export_csv(&mut buffer).unwrap();
    let csv = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Email,Status,Reason,Domain,MX Records"));
    assert!(lines[1].starts_with("a@x.com,valid,,x.com,,N/A,No,Yes,No,"));
}

#[tokio::test]
async fn sub_second_request_timeout_still_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@x.com", "status": "valid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConfigBuilder::new()
        .skip_default_files()
        .api_base_url(server.uri())
        .api_token("test-token")
        .request_timeout(Duration::from_millis(500))
        .build()
        .expect("config builds");
    assert_eq!(config.request_timeout, Duration::from_millis(500));

    let session = VerificationSession::new(Arc::new(config)).unwrap();
    let result = session.verify_single("a@x.com").await.unwrap();
    assert_eq!(result.status, EmailStatus::Valid);
}

#[tokio::test]
async fn every_input_gets_exactly_one_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .and(query_param("email", "down@x.com"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/verify/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@x.com", "status": "valid"
        })))
        .mount(&server)
        .await;

    let session = Arc::new(session_for(&server, 50));
    let emails = vec![
        "ok1@x.com".to_string(),
        "down@x.com".to_string(),
        "not-an-email".to_string(),
        "ok2@x.com".to_string(),
    ];
    let mut outcomes = verify_individually(session.clone(), emails, 2).await;
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let emails: Vec<&str> = outcomes.iter().map(|(e, _)| e.as_str()).collect();
    assert_eq!(emails, vec!["down@x.com", "not-an-email", "ok1@x.com", "ok2@x.com"]);
    assert!(matches!(outcomes[0].1, Err(AppError::HttpStatus { status: 503, .. })));
    assert!(matches!(outcomes[1].1, Err(AppError::InvalidEmailFormat(_))));
    assert!(outcomes[2].1.is_ok() && outcomes[3].1.is_ok());
    assert_eq!(session.results().len(), 2);
}
