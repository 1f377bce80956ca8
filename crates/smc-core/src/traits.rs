//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Collection, NewSite, Notification, Principal, SiteRecord};

/// Document-store contract for the sites and reports collections.
///
/// Every lookup is an exact match on `domain`.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait SiteRepo: Send + Sync {
    async fn find_all(&self, collection: Collection) -> Result<Vec<SiteRecord>>;

    /// Zero or one match is expected, but callers get the filtered sequence.
    async fn find_by_domain(&self, collection: Collection, domain: &str) -> Result<Vec<SiteRecord>>;

    /// Appends a record. On `Reports`, a second record for the same domain
    /// fails with `AppError::DuplicateReport`.
    async fn insert(&self, collection: Collection, site: NewSite) -> Result<()>;

    /// Replaces the fields of the first record matching `domain`.
    /// No match is not an error.
    async fn update_by_domain(&self, collection: Collection, domain: &str, site: NewSite) -> Result<()>;

    /// Removes the first record matching `domain`. No match is not an error.
    async fn delete_by_domain(&self, collection: Collection, domain: &str) -> Result<()>;

    async fn count(&self, collection: Collection) -> Result<u64>;
}

/// Outbound chat notifications. Delivery is best-effort; callers log and
/// drop the error.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Third-party captcha oracle.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(true)` only when the oracle positively accepts the token.
    async fn verify(&self, token: &str) -> anyhow::Result<bool>;
}

/// Token issuance and validation for the single administrative identity.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Checks the master credentials and issues a signed bearer token.
    fn login(&self, username: &str, password: &str) -> Result<String>;

    /// Validates signature and expiry.
    fn authenticate(&self, token: &str) -> Result<Principal>;
}

/// Notifier that drops every message. Used when no webhook plugin is built in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}
