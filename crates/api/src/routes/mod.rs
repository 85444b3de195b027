pub mod admin;
pub mod content;
pub mod health;
pub mod masjid;
pub mod me;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /masjids                                         list, create
/// /masjids/{id}                                    get, update
/// /masjids/{id}/deactivate                         deactivate (POST)
/// /masjids/{id}/members                            list, add
/// /masjids/{id}/members/{membership_id}            remove (DELETE)
/// /masjids/{id}/members/{membership_id}/role       change role (PUT)
/// /masjids/{id}/members/{membership_id}/capabilities  update capabilities (PUT)
/// /masjids/{id}/prayer-times                       list by date, upsert
/// /masjids/{id}/questions                          list, ask
/// /masjids/{id}/announcements                      list, create
/// /masjids/{id}/events                             list, create
///
/// /questions/{id}/answer                           answer (POST)
/// /events/{id}                                     delete (DELETE)
///
/// /me/default-membership/{membership_id}           set default (PUT)
///
/// /subscriptions                                   list, subscribe, unsubscribe
/// /preferences                                     get, update
///
/// /admin/users/{id}/super-admin                    set flag (PUT, super-admin)
/// /admin/users/{id}/deactivate                     deactivate (POST, super-admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Masjids and everything scoped to one masjid.
        .nest("/masjids", masjid::router())
        // Content addressed by its own id.
        .merge(content::router())
        // The caller's own account.
        .nest("/me", me::router())
        // Push subscriptions and notification preferences.
        .merge(notification::router())
        // Platform administration.
        .nest("/admin", admin::router())
}
