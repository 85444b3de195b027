//! Handlers for `/preferences`: the caller's per-category notification toggles.
//!
//! Rows are created lazily with every category enabled.

use axum::extract::State;
use axum::Json;
use masjid_core::preferences::PreferenceSet;
use masjid_core::recipient::Recipient;
use masjid_db::models::settings::UpdateSettings;
use masjid_db::repositories::SettingsRepo;

use crate::error::AppResult;
use crate::handlers::subscription::caller;
use crate::middleware::auth::OptionalAuthUser;
use crate::middleware::device::DeviceHeaders;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
) -> AppResult<Json<DataResponse<PreferenceSet>>> {
    let prefs = match caller(&state, auth, &device, None).await? {
        Recipient::User(user_id) => SettingsRepo::get_or_create_user(&state.pool, user_id)
            .await?
            .preferences(),
        Recipient::Device(device_id) => SettingsRepo::get_or_create_device(&state.pool, &device_id)
            .await?
            .preferences(),
    };
    Ok(Json(DataResponse { data: prefs }))
}

/// PUT /api/v1/preferences
///
/// Only the categories present in the body are changed.
pub async fn update_preferences(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
    Json(input): Json<UpdateSettings>,
) -> AppResult<Json<DataResponse<PreferenceSet>>> {
    let prefs = match caller(&state, auth, &device, None).await? {
        Recipient::User(user_id) => SettingsRepo::update_user(&state.pool, user_id, &input)
            .await?
            .preferences(),
        Recipient::Device(device_id) => {
            SettingsRepo::update_device(&state.pool, &device_id, &input)
                .await?
                .preferences()
        }
    };
    Ok(Json(DataResponse { data: prefs }))
}
