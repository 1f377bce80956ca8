//! # smc-api
//!
//! The web routing and orchestration layer for the StopMalwareContent API.
//!
//! | Route | Gate |
//! |---|---|
//! | `GET /`, `GET /login`, `GET /stats` | public |
//! | `GET /sites`, `GET /sites/{domain}` | public |
//! | `POST /sites`, `PUT /sites/{domain}`, `DELETE /sites/{domain}` | bearer token |
//! | `GET /reports`, `GET /reports/{domain}`, `POST /reports` | public |
//! | `DELETE /reports/{domain}` | bearer token |

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::routing::{delete, get, post, put};
use axum::Router;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;

/// Builds the full application router.
///
/// The token gate is attached per method, so public reads and gated writes
/// can share a path.
pub fn router(state: AppState) -> Router {
    let gate = axum::middleware::from_fn_with_state(state.clone(), middleware::require_token);

    Router::new()
        .route("/", get(handlers::root))
        .route("/login", get(handlers::login))
        .route("/stats", get(handlers::stats))
        .route(
            "/sites",
            get(handlers::list_sites).merge(post(handlers::create_site).route_layer(gate.clone())),
        )
        .route(
            "/sites/{domain}",
            get(handlers::get_site).merge(
                put(handlers::update_site)
                    .delete(handlers::delete_site)
                    .route_layer(gate.clone()),
            ),
        )
        .route("/reports", get(handlers::list_reports).post(handlers::create_report))
        .route(
            "/reports/{domain}",
            get(handlers::get_report).merge(delete(handlers::delete_report).route_layer(gate)),
        )
        .layer(middleware::cors_policy())
        .layer(middleware::trace_layer())
        .with_state(state)
}
