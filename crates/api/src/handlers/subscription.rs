//! Handlers for `/subscriptions`.
//!
//! A subscription registers one delivery token for one recipient on one
//! masjid. The recipient is the authenticated user when a token is sent,
//! otherwise the device identified by the device headers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use masjid_core::error::CoreError;
use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use masjid_core::validation::validate_push_token;
use masjid_db::models::subscription::{SubscribeOutcome, Subscription, UnsubscribeOutcome};
use masjid_db::repositories::SubscriptionRepo;
use serde::Deserialize;

use crate::authz::{find_active_masjid, load_actor};
use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::device::{resolve_recipient, DeviceHeaders};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /subscriptions`.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub masjid_id: DbId,
    pub fcm_token: String,
    /// Raw device id; replaces the `X-Device-Id` header when present.
    pub device_id: Option<String>,
}

/// Request body for `DELETE /subscriptions`.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub masjid_id: DbId,
    pub device_id: Option<String>,
}

/// POST /api/v1/subscriptions
///
/// 201 for a new subscription, 200 when an existing one was reactivated or
/// had its token replaced, 409 when it is already active with this token.
pub async fn subscribe(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
    Json(input): Json<SubscribeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Subscription>>)> {
    let token = validate_push_token(&input.fcm_token)?;
    let recipient = caller(&state, auth, &device, input.device_id.as_deref()).await?;
    find_active_masjid(&state.pool, input.masjid_id).await?;

    let (status, subscription) =
        match SubscriptionRepo::subscribe(&state.pool, input.masjid_id, &recipient, &token).await? {
            SubscribeOutcome::Created(sub) => (StatusCode::CREATED, sub),
            SubscribeOutcome::Updated(sub) => (StatusCode::OK, sub),
            SubscribeOutcome::AlreadyActive => {
                return Err(
                    CoreError::Conflict("Already subscribed to this masjid".into()).into(),
                );
            }
        };

    tracing::info!(
        masjid_id = input.masjid_id,
        subscription_id = subscription.id,
        "Subscription registered"
    );
    Ok((status, Json(DataResponse { data: subscription })))
}

/// DELETE /api/v1/subscriptions
pub async fn unsubscribe(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
    Json(input): Json<UnsubscribeRequest>,
) -> AppResult<StatusCode> {
    let recipient = caller(&state, auth, &device, input.device_id.as_deref()).await?;

    match SubscriptionRepo::unsubscribe(&state.pool, input.masjid_id, &recipient).await? {
        UnsubscribeOutcome::Deactivated => Ok(StatusCode::NO_CONTENT),
        UnsubscribeOutcome::AlreadyInactive => {
            Err(CoreError::Conflict("Subscription is already inactive".into()).into())
        }
        UnsubscribeOutcome::NotFound => Err(CoreError::NotFound {
            entity: "Subscription for masjid",
            id: input.masjid_id,
        }
        .into()),
    }
}

/// GET /api/v1/subscriptions
///
/// Every subscription (active or not) held by the caller.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
) -> AppResult<Json<DataResponse<Vec<Subscription>>>> {
    let recipient = caller(&state, auth, &device, None).await?;
    let subscriptions = SubscriptionRepo::list_for_recipient(&state.pool, &recipient).await?;
    Ok(Json(DataResponse {
        data: subscriptions,
    }))
}

/// Resolve the recipient, rejecting deactivated users.
pub(crate) async fn caller(
    state: &AppState,
    auth: Option<AuthUser>,
    device: &DeviceHeaders,
    body_device_id: Option<&str>,
) -> AppResult<Recipient> {
    if let Some(auth) = auth {
        load_actor(&state.pool, auth).await?;
    }
    Ok(resolve_recipient(auth, device, body_device_id)?)
}
