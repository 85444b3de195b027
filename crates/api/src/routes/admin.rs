//! Route definitions for the `/admin` resource.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the super-admin flag (checked in the handlers).
///
/// ```text
/// PUT    /users/{id}/super-admin  -> set_super_admin
/// POST   /users/{id}/deactivate   -> deactivate_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/super-admin", put(admin::set_super_admin))
        .route("/users/{id}/deactivate", post(admin::deactivate_user))
}
