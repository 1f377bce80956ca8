//! # smc-notify-discord
//!
//! Discord webhook implementation of `Notifier`.
//!
//! Verdict changes (flag / unflag) and new reports go to two separate
//! webhooks. A channel without a URL is disabled and silently skipped.

use async_trait::async_trait;
use serde_json::json;
use smc_core::models::{Notification, NotifyChannel};
use smc_core::traits::Notifier;
use std::time::Duration;

pub struct DiscordNotifier {
    client: reqwest::Client,
    verdicts_url: Option<String>,
    reports_url: Option<String>,
}

impl DiscordNotifier {
    /// Blank URLs count as unset.
    pub fn new(
        verdicts_url: Option<String>,
        reports_url: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let non_blank = |u: Option<String>| u.filter(|u| !u.trim().is_empty());
        Ok(Self {
            client,
            verdicts_url: non_blank(verdicts_url),
            reports_url: non_blank(reports_url),
        })
    }

    fn url_for(&self, channel: NotifyChannel) -> Option<&str> {
        match channel {
            NotifyChannel::Verdicts => self.verdicts_url.as_deref(),
            NotifyChannel::Reports => self.reports_url.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let Some(url) = self.url_for(notification.channel()) else {
            tracing::debug!(channel = ?notification.channel(), "webhook not configured, skipping");
            return Ok(());
        };

        let payload = json!({ "content": notification.render() });
        let resp = self.client.post(url).json(&payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("webhook responded with {status}");
        }
        tracing::debug!(domain = notification.domain(), %status, "notification delivered");
        Ok(())
    }
}
