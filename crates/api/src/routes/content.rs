//! Routes for content addressed by its own id rather than its masjid.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::{community_event, question};
use crate::state::AppState;

/// ```text
/// POST   /questions/{id}/answer    -> answer_question
/// DELETE /events/{id}              -> delete_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/questions/{id}/answer", post(question::answer_question))
        .route("/events/{id}", delete(community_event::delete_event))
}
