//! Routes for push subscriptions and notification preferences.
//!
//! Both accept either a Bearer token or the anonymous device headers.

use axum::routing::get;
use axum::Router;

use crate::handlers::{preferences, subscription};
use crate::state::AppState;

/// ```text
/// GET    /subscriptions  -> list_subscriptions
/// POST   /subscriptions  -> subscribe
/// DELETE /subscriptions  -> unsubscribe
/// GET    /preferences    -> get_preferences
/// PUT    /preferences    -> update_preferences
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions",
            get(subscription::list_subscriptions)
                .post(subscription::subscribe)
                .delete(subscription::unsubscribe),
        )
        .route(
            "/preferences",
            get(preferences::get_preferences).put(preferences::update_preferences),
        )
}
