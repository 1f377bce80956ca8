//! # Domain Models
//!
//! These structs represent the records served by the StopMalwareContent API.
//! Flagged sites and citizen reports share one shape; reports additionally
//! carry a captcha token on the way in that never reaches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// The two document collections the API manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Administratively flagged sites (verdicts).
    Sites,
    /// Citizen-submitted reports awaiting review.
    Reports,
}

impl Collection {
    /// Name of the backing collection in the document store.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Sites => "sites_collection",
            Collection::Reports => "reports_collection",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed vocabulary of report reasons.
///
/// Clients submit the machine-readable code; the store only ever sees the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    IllegalRedistribution,
    Phishing,
    Malware,
    PotentiallyUnwanted,
    FalsePositive,
}

impl Reason {
    pub const ALL: [Reason; 5] = [
        Reason::IllegalRedistribution,
        Reason::Phishing,
        Reason::Malware,
        Reason::PotentiallyUnwanted,
        Reason::FalsePositive,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Reason::IllegalRedistribution => "illegal-redistribution",
            Reason::Phishing => "phishing",
            Reason::Malware => "malware",
            Reason::PotentiallyUnwanted => "puw",
            Reason::FalsePositive => "false-pos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reason::IllegalRedistribution => "Illegal redistribution",
            Reason::Phishing => "Phishing website",
            Reason::Malware => "Contains malware",
            Reason::PotentiallyUnwanted => "Potentially unwanted website",
            Reason::FalsePositive => "False positive",
        }
    }
}

impl FromStr for Reason {
    type Err = AppError;

    fn from_str(code: &str) -> Result<Self> {
        Reason::ALL
            .into_iter()
            .find(|r| r.code() == code)
            .ok_or_else(|| AppError::InvalidReason(code.to_string()))
    }
}

/// Input shape for a flagged site (and the persisted part of a report).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSite {
    pub domain: String,
    pub notes: String,
    pub path: String,
    /// Free text for verdicts; a `Reason` label for reports.
    pub reason: String,
}

impl NewSite {
    pub fn new(
        domain: impl Into<String>,
        notes: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<Self> {
        let site = Self {
            domain: domain.into(),
            notes: notes.into(),
            path: path.into(),
            reason: reason.into(),
        };
        site.validate()?;
        Ok(site)
    }

    /// Deserialized input bypasses `new`, so handlers call this explicitly.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(AppError::Validation("domain must not be empty".into()));
        }
        Ok(())
    }
}

/// Inbound body of `POST /reports`.
///
/// The reason stays a raw code here: it is only checked after the captcha and
/// duplicate checks have passed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSubmission {
    pub domain: String,
    pub notes: String,
    pub path: String,
    pub reason: String,
    /// One-time captcha proof. Stripped before persistence.
    pub token: String,
}

impl ReportSubmission {
    /// Resolves the reason code and drops the captcha token.
    pub fn into_report(self) -> Result<(NewSite, Reason)> {
        let reason: Reason = self.reason.parse()?;
        let site = NewSite::new(self.domain, self.notes, self.path, reason.label())?;
        Ok((site, reason))
    }
}

/// Output projection of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Store-assigned opaque identifier.
    pub id: String,
    pub domain: String,
    pub notes: String,
    pub path: String,
    pub reason: String,
}

/// Collection counts served by `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub sites: u64,
    pub reports: u64,
}

/// The identity proven by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Outbound chat messages, one per state change worth announcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SiteFlagged { domain: String, reason: String },
    SiteUnflagged { domain: String },
    ReportAdded { domain: String, reason: String },
}

/// Which webhook a notification is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Verdicts,
    Reports,
}

impl Notification {
    pub fn channel(&self) -> NotifyChannel {
        match self {
            Notification::SiteFlagged { .. } | Notification::SiteUnflagged { .. } => {
                NotifyChannel::Verdicts
            }
            Notification::ReportAdded { .. } => NotifyChannel::Reports,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Notification::SiteFlagged { domain, .. }
            | Notification::SiteUnflagged { domain }
            | Notification::ReportAdded { domain, .. } => domain,
        }
    }

    /// Renders the chat message body (Discord markdown, custom emoji).
    pub fn render(&self) -> String {
        match self {
            Notification::SiteFlagged { domain, reason } => format!(
                "<:smc_flag:1327674316233379840> **New website has been flagged**\n\nDomain: *{domain}*\nReason: *{reason}*"
            ),
            Notification::SiteUnflagged { domain } => format!(
                "<:smc_unflag:1327676379331825745> **Website has been unflagged**\n\nDomain: *{domain}*"
            ),
            Notification::ReportAdded { domain, reason } => format!(
                "<:smc_bell:1327674323007307858> **New website has been reported**\n\nDomain: *{domain}*\nReason: *{reason}*"
            ),
        }
    }
}
