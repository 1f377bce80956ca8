//! # smc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smc_core::error::AppError;
use smc_core::models::{Collection, NewSite, Notification, Principal, ReportSubmission, SiteRecord, Stats};
use smc_core::traits::{AuthProvider, CaptchaVerifier, Notifier, SiteRepo};
use std::sync::Arc;

use crate::error::ApiResult;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn SiteRepo>,
    pub auth: Arc<dyn AuthProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub captcha: Arc<dyn CaptchaVerifier>,
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Liveness probe.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "If you are reading this, StopMalwareContent API is alive." }))
}

pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> ApiResult<Json<LoginResponse>> {
    let access_token = state.auth.login(&params.username, &params.password)?;
    Ok(Json(LoginResponse { access_token }))
}

pub async fn list_sites(State(state): State<AppState>) -> ApiResult<Json<Vec<SiteRecord>>> {
    Ok(Json(state.repo.find_all(Collection::Sites).await?))
}

pub async fn get_site(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<Vec<SiteRecord>>> {
    Ok(Json(state.repo.find_by_domain(Collection::Sites, &domain).await?))
}

/// Flags a site and announces it on the verdicts channel.
pub async fn create_site(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(site): Json<NewSite>,
) -> ApiResult<Json<()>> {
    site.validate()?;
    let notification = Notification::SiteFlagged {
        domain: site.domain.clone(),
        reason: site.reason.clone(),
    };
    state.repo.insert(Collection::Sites, site).await?;
    tracing::info!(actor = %principal.subject, domain = notification.domain(), "site flagged");

    notify(state.notifier.as_ref(), &notification).await;
    Ok(Json(()))
}

pub async fn update_site(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(domain): Path<String>,
    Json(site): Json<NewSite>,
) -> ApiResult<Json<()>> {
    site.validate()?;
    state.repo.update_by_domain(Collection::Sites, &domain, site).await?;
    tracing::info!(actor = %principal.subject, %domain, "site updated");
    Ok(Json(()))
}

/// Unflags a site and announces it on the verdicts channel.
pub async fn delete_site(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(domain): Path<String>,
) -> ApiResult<Json<()>> {
    state.repo.delete_by_domain(Collection::Sites, &domain).await?;
    tracing::info!(actor = %principal.subject, %domain, "site unflagged");

    notify(state.notifier.as_ref(), &Notification::SiteUnflagged { domain }).await;
    Ok(Json(()))
}

pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<SiteRecord>>> {
    Ok(Json(state.repo.find_all(Collection::Reports).await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<Vec<SiteRecord>>> {
    Ok(Json(state.repo.find_by_domain(Collection::Reports, &domain).await?))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(domain): Path<String>,
) -> ApiResult<Json<()>> {
    state.repo.delete_by_domain(Collection::Reports, &domain).await?;
    tracing::info!(actor = %principal.subject, %domain, "report dismissed");
    Ok(Json(()))
}

/// Public report intake.
///
/// Each step short-circuits, in this order: captcha, duplicate domain,
/// reason code, then insert and notify.
pub async fn create_report(
    State(state): State<AppState>,
    Json(submission): Json<ReportSubmission>,
) -> ApiResult<Json<()>> {
    let accepted = match state.captcha.verify(&submission.token).await {
        Ok(accepted) => accepted,
        Err(e) => {
            tracing::warn!(error = %e, "captcha verification failed");
            false
        }
    };
    if !accepted {
        return Err(AppError::InvalidCaptcha.into());
    }

    let existing = state.repo.find_by_domain(Collection::Reports, &submission.domain).await?;
    if !existing.is_empty() {
        return Err(AppError::DuplicateReport(submission.domain).into());
    }

    let (report, reason) = submission.into_report()?;
    let notification = Notification::ReportAdded {
        domain: report.domain.clone(),
        reason: reason.label().to_string(),
    };
    // A concurrent submission can still win the race; the store's unique
    // index turns that into DuplicateReport here.
    state.repo.insert(Collection::Reports, report).await?;
    tracing::info!(domain = notification.domain(), reason = reason.code(), "report received");

    notify(state.notifier.as_ref(), &notification).await;
    Ok(Json(()))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Stats>> {
    Ok(Json(Stats {
        sites: state.repo.count(Collection::Sites).await?,
        reports: state.repo.count(Collection::Reports).await?,
    }))
}

/// Delivery failures are logged and never reach the client.
async fn notify(notifier: &dyn Notifier, notification: &Notification) {
    if let Err(e) = notifier.notify(notification).await {
        tracing::warn!(
            error = %e,
            channel = ?notification.channel(),
            domain = notification.domain(),
            "notification not delivered"
        );
    }
}
