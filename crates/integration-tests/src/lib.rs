//! Shared fixtures for the black-box API tests.
//!
//! The router runs with the real SQLite store (in memory) and the real JWT
//! provider. Captcha and notifications are replaced by recording fakes.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use smc_api::{router, AppState};
use smc_auth_jwt::JwtAuthProvider;
use smc_core::{AuthProvider, CaptchaVerifier, Notification, Notifier};
use smc_db_sqlite::SqliteSiteRepo;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const MASTER_USER: &str = "admin";
pub const MASTER_PASSWORD: &str = "s3cret-master-pass";
pub const VALID_CAPTCHA: &str = "validtoken";

/// Records every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Accepts exactly [`VALID_CAPTCHA`] and counts how often it was asked.
#[derive(Default)]
pub struct FakeCaptcha {
    calls: Mutex<usize>,
}

impl FakeCaptcha {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, token: &str) -> anyhow::Result<bool> {
        *self.calls.lock().unwrap() += 1;
        Ok(token == VALID_CAPTCHA)
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<SqliteSiteRepo>,
    pub auth: Arc<JwtAuthProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub captcha: Arc<FakeCaptcha>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let repo = Arc::new(SqliteSiteRepo::new("sqlite::memory:").await.unwrap());
        let auth = Arc::new(JwtAuthProvider::new(
            &SecretString::from("integration-secret"),
            MASTER_USER,
            SecretString::from(MASTER_PASSWORD),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let captcha = Arc::new(FakeCaptcha::default());

        let router = router(AppState {
            repo: repo.clone(),
            auth: auth.clone(),
            notifier: notifier.clone(),
            captcha: captcha.clone(),
        });
        Self { router, repo, auth, notifier, captcha }
    }

    pub fn admin_token(&self) -> String {
        self.auth.login(MASTER_USER, MASTER_PASSWORD).unwrap()
    }

    pub async fn request(
        &self,
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

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 256).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.request(Method::GET, uri, None, None).await
    }
}
