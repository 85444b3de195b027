//! Route definitions for the `/masjids` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{announcement, community_event, masjid, membership, prayer_time, question};
use crate::state::AppState;

/// Routes mounted at `/masjids`.
///
/// ```text
/// GET    /                                        -> list_masjids
/// POST   /                                        -> create_masjid
/// GET    /{id}                                    -> get_masjid
/// PUT    /{id}                                    -> update_masjid
/// POST   /{id}/deactivate                         -> deactivate_masjid
/// GET    /{id}/members                            -> list_members
/// POST   /{id}/members                            -> add_member
/// DELETE /{id}/members/{membership_id}            -> remove_member
/// PUT    /{id}/members/{membership_id}/role       -> change_role
/// PUT    /{id}/members/{membership_id}/capabilities -> update_capabilities
/// GET    /{id}/prayer-times                       -> list_prayer_times
/// POST   /{id}/prayer-times                       -> upsert_prayer_time
/// GET    /{id}/questions                          -> list_questions
/// POST   /{id}/questions                          -> create_question
/// GET    /{id}/announcements                      -> list_announcements
/// POST   /{id}/announcements                      -> create_announcement
/// GET    /{id}/events                             -> list_events
/// POST   /{id}/events                             -> create_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(masjid::list_masjids).post(masjid::create_masjid))
        .route("/{id}", get(masjid::get_masjid).put(masjid::update_masjid))
        .route("/{id}/deactivate", post(masjid::deactivate_masjid))
        .route(
            "/{id}/members",
            get(membership::list_members).post(membership::add_member),
        )
        .route("/{id}/members/{membership_id}", delete(membership::remove_member))
        .route(
            "/{id}/members/{membership_id}/role",
            put(membership::change_role),
        )
        .route(
            "/{id}/members/{membership_id}/capabilities",
            put(membership::update_capabilities),
        )
        .route(
            "/{id}/prayer-times",
            get(prayer_time::list_prayer_times).post(prayer_time::upsert_prayer_time),
        )
        .route(
            "/{id}/questions",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/{id}/announcements",
            get(announcement::list_announcements).post(announcement::create_announcement),
        )
        .route(
            "/{id}/events",
            get(community_event::list_events).post(community_event::create_event),
        )
}
