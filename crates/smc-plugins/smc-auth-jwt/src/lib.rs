//! # smc-auth-jwt
//!
//! HS256 JWT implementation of `AuthProvider`.
//! There is no user table: one master identity comes from configuration and
//! every token it is issued lives for 24 hours.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use smc_core::error::{AppError, Result};
use smc_core::models::Principal;
use smc_core::traits::AuthProvider;

/// Fixed lifetime of an issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    master_user: String,
    master_password: SecretString,
}

impl JwtAuthProvider {
    pub fn new(secret: &SecretString, master_user: impl Into<String>, master_password: SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is a hard cutoff.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            master_user: master_user.into(),
            master_password,
        }
    }

    /// Signs a token for `subject`, valid from `now` for [`TOKEN_TTL_HOURS`].
    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    fn credentials_match(&self, username: &str, password: &str) -> bool {
        // Both comparisons always run; no short-circuit on the username.
        let user_ok = username.as_bytes().ct_eq(self.master_user.as_bytes());
        let pass_ok = password
            .as_bytes()
            .ct_eq(self.master_password.expose_secret().as_bytes());
        (user_ok & pass_ok).into()
    }
}

impl AuthProvider for JwtAuthProvider {
    fn login(&self, username: &str, password: &str) -> Result<String> {
        if !self.credentials_match(username, password) {
            tracing::warn!(username, "rejected login attempt");
            return Err(AppError::InvalidCredentials);
        }
        tracing::info!(username, "issued access token");
        self.issue(username, Utc::now())
    }

    fn authenticate(&self, token: &str) -> Result<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;
        let expires_at = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| AppError::Unauthorized("exp out of range".into()))?;
        Ok(Principal {
            subject: data.claims.sub,
            expires_at,
        })
    }
}
