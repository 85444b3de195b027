use axum::routing::put;
use axum::Router;

use crate::handlers::membership;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// PUT /default-membership/{membership_id} -> set_default_membership
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/default-membership/{membership_id}",
        put(membership::set_default_membership),
    )
}
