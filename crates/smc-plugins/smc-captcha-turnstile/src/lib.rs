//! # smc-captcha-turnstile
//!
//! Cloudflare Turnstile implementation of `CaptchaVerifier`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use smc_core::traits::CaptchaVerifier;
use std::time::Duration;

pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: SecretString,
    endpoint: String,
}

impl TurnstileVerifier {
    pub fn new(secret: SecretString, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            secret,
            endpoint: TURNSTILE_VERIFY_URL.to_string(),
        })
    }

    /// Points the verifier at a different `siteverify` endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<bool> {
        let resp = self
            .client
            .post(&self.endpoint)
            .form(&[("secret", self.secret.expose_secret()), ("response", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, "captcha oracle returned an error status");
            return Ok(false);
        }

        let verdict = match resp.json::<SiteVerifyResponse>().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable captcha oracle response");
                return Ok(false);
            }
        };
        if !verdict.success {
            tracing::debug!(error_codes = ?verdict.error_codes, "captcha rejected");
        }
        Ok(verdict.success)
    }
}
