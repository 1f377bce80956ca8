mod common;

use axum::http::{Method, StatusCode};
use common::{send, Mocks};
use serde_json::json;
use smc_core::{AppError, Collection, NewSite, Notification, SiteRecord};

fn submission(reason: &str) -> serde_json::Value {
    json!({
        "domain": "evil.example",
        "notes": "n",
        "path": "/",
        "reason": reason,
        "token": "validtoken",
    })
}

fn stored(domain: &str) -> SiteRecord {
    SiteRecord {
        id: "65a1".into(),
        domain: domain.into(),
        notes: "n".into(),
        path: "/".into(),
        reason: "Phishing website".into(),
    }
}

#[tokio::test]
async fn test_accepted_report_is_stored_with_label_and_announced() {
    let mut m = Mocks::new();
    m.captcha
        .expect_verify()
        .withf(|token| token.to_string() == "validtoken")
        .times(1)
        .returning(|_| Ok(true));
    m.repo
        .expect_find_by_domain()
        .withf(|c, d| *c == Collection::Reports && d.to_string() == "evil.example")
        .times(1)
        .returning(|_, _| Ok(vec![]));
    m.repo
        .expect_insert()
        .withf(|c, site| {
            *c == Collection::Reports
                && *site == NewSite::new("evil.example", "n", "/", "Phishing website").unwrap()
        })
        .times(1)
        .returning(|_, _| Ok(()));
    m.notifier
        .expect_notify()
        .withf(|n| {
            *n == Notification::ReportAdded {
                domain: "evil.example".into(),
                reason: "Phishing website".into(),
            }
        })
        .times(1)
        .returning(|_| Ok(()));

    let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission("phishing"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_rejected_captcha_stops_before_the_store() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().times(1).returning(|_| Ok(false));

    let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission("phishing"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid captcha");
}

#[tokio::test]
async fn test_captcha_oracle_error_counts_as_rejection() {
    let mut m = Mocks::new();
    m.captcha
        .expect_verify()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("connect timeout")));

    let (status, _) = send(m.app(), Method::POST, "/reports", None, Some(submission("phishing"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_captcha_runs_before_reason_validation() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().times(1).returning(|_| Ok(false));

    let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission("nonsense"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid captcha");
}

#[tokio::test]
async fn test_duplicate_domain_is_a_conflict_without_notification() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().returning(|_| Ok(true));
    m.repo
        .expect_find_by_domain()
        .times(1)
        .returning(|_, d| Ok(vec![stored(d)]));

    let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission("phishing"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Report already exists");
}

#[tokio::test]
async fn test_duplicate_check_runs_before_reason_validation() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().returning(|_| Ok(true));
    m.repo
        .expect_find_by_domain()
        .returning(|_, d| Ok(vec![stored(d)]));

    let (status, _) = send(m.app(), Method::POST, "/reports", None, Some(submission("nonsense"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_reason_is_rejected_before_insert() {
    for reason in ["ransomware", "Phishing website", ""] {
        let mut m = Mocks::new();
        m.captcha.expect_verify().returning(|_| Ok(true));
        m.repo.expect_find_by_domain().returning(|_, _| Ok(vec![]));

        let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission(reason))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{reason}");
        assert_eq!(body["detail"], "Invalid reason");
    }
}

#[tokio::test]
async fn test_race_lost_at_insert_is_a_conflict() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().returning(|_| Ok(true));
    m.repo.expect_find_by_domain().returning(|_, _| Ok(vec![]));
    m.repo
        .expect_insert()
        .times(1)
        .returning(|_, site| Err(AppError::DuplicateReport(site.domain)));

    let (status, _) = send(m.app(), Method::POST, "/reports", None, Some(submission("malware"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_the_request() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().returning(|_| Ok(true));
    m.repo.expect_find_by_domain().returning(|_, _| Ok(vec![]));
    m.repo.expect_insert().times(1).returning(|_, _| Ok(()));
    m.notifier
        .expect_notify()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("webhook responded with 500")));

    let (status, _) = send(m.app(), Method::POST, "/reports", None, Some(submission("puw"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_field_is_rejected_by_the_extractor() {
    let m = Mocks::new();
    let body = json!({ "domain": "evil.example", "notes": "n", "path": "/", "reason": "phishing" });

    let (status, _) = send(m.app(), Method::POST, "/reports", None, Some(body)).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_store_outage_is_a_server_error() {
    let mut m = Mocks::new();
    m.captcha.expect_verify().returning(|_| Ok(true));
    m.repo
        .expect_find_by_domain()
        .returning(|_, _| Err(AppError::Internal("database is locked".into())));

    let (status, body) = send(m.app(), Method::POST, "/reports", None, Some(submission("phishing"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal server error");
}
