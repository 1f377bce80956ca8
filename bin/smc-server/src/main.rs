//! # StopMalwareContent API Server
//!
//! The entry point that assembles the application based on compile-time features.

use anyhow::Context;
use smc_api::{router, AppState};
use smc_auth_jwt::JwtAuthProvider;
use smc_captcha_turnstile::TurnstileVerifier;
use smc_configs::{LogFormat, Settings};
use smc_core::traits::Notifier;
use smc_db_sqlite::SqliteSiteRepo;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(settings.log_format);

    // 1. Document store
    let repo = Arc::new(
        SqliteSiteRepo::new(&settings.db_connection_string)
            .await
            .context("failed to open the document store")?,
    );

    // 2. Auth
    let auth = JwtAuthProvider::new(
        &settings.jwt_secret_key,
        settings.master_user.clone(),
        settings.master_password.clone(),
    );

    // 3. Captcha oracle
    let captcha = TurnstileVerifier::new(settings.turnstile_secret_key.clone(), settings.http_timeout())?;

    // 4. Notifications
    let notifier = build_notifier(&settings)?;

    let state = AppState {
        repo: repo.clone(),
        auth: Arc::new(auth),
        notifier,
        captcha: Arc::new(captcha),
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    tracing::info!(addr = %settings.bind_addr, "StopMalwareContent API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    repo.close().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(feature = "notify-discord")]
fn build_notifier(settings: &Settings) -> anyhow::Result<Arc<dyn Notifier>> {
    let notifier = smc_notify_discord::DiscordNotifier::new(
        settings.verdicts_discord_webhook_url.clone(),
        settings.reports_discord_webhook_url.clone(),
        settings.http_timeout(),
    )?;
    Ok(Arc::new(notifier))
}

#[cfg(not(feature = "notify-discord"))]
fn build_notifier(_settings: &Settings) -> anyhow::Result<Arc<dyn Notifier>> {
    tracing::info!("built without notify-discord; notifications are dropped");
    Ok(Arc::new(smc_core::traits::NoopNotifier))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
