#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use smc_api::{router, AppState};
use smc_core::{
    AppError, MockAuthProvider, MockCaptchaVerifier, MockNotifier, MockSiteRepo, Principal,
};
use std::sync::Arc;
use tower::ServiceExt;

pub const GOOD_TOKEN: &str = "good.jwt.token";

/// Mocks with no expectations panic when called.
pub struct Mocks {
    pub repo: MockSiteRepo,
    pub auth: MockAuthProvider,
    pub notifier: MockNotifier,
    pub captcha: MockCaptchaVerifier,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            repo: MockSiteRepo::new(),
            auth: MockAuthProvider::new(),
            notifier: MockNotifier::new(),
            captcha: MockCaptchaVerifier::new(),
        }
    }

    /// Accepts `GOOD_TOKEN` as the admin and rejects anything else.
    pub fn with_admin_token(mut self) -> Self {
        self.auth.expect_authenticate().returning(|token| {
            if token == GOOD_TOKEN {
                Ok(Principal {
                    subject: "admin".into(),
                    expires_at: Utc::now() + Duration::hours(24),
                })
            } else {
                Err(AppError::Unauthorized("Invalid or expired token".into()))
            }
        });
        self
    }

    pub fn app(self) -> Router {
        router(AppState {
            repo: Arc::new(self.repo),
            auth: Arc::new(self.auth),
            notifier: Arc::new(self.notifier),
            captcha: Arc::new(self.captcha),
        })
    }
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
