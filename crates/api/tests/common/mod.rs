#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use masjid_api::auth::jwt::{generate_access_token, JwtConfig};
use masjid_api::config::ServerConfig;
use masjid_api::middleware::device::{APP_VERSION_HEADER, DEVICE_ID_HEADER, PLATFORM_HEADER};
use masjid_api::router::build_app_router;
use masjid_api::state::AppState;
use masjid_core::roles::Role;
use masjid_core::types::DbId;
use masjid_db::models::masjid::{CreateMasjid, Masjid};
use masjid_db::models::membership::{Membership, NewMembership};
use masjid_db::models::user::{CreateUser, User};
use masjid_db::repositories::{MasjidRepo, MembershipRepo, UserRepo};
use masjid_events::{EventBus, FanoutConfig};

const TEST_JWT_SECRET: &str = "test-secret-for-api-integration-tests";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
            issuer: None,
        },
        fanout: FanoutConfig::default(),
    }
}

/// Build the full application router using the given database pool.
///
/// No dispatcher is attached, so published events are dropped.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

/// Same as [`build_test_app`] but publishing to a caller-owned bus, so tests
/// can subscribe and inspect events or attach a dispatcher.
pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn create_super_admin(pool: &PgPool, email: &str) -> User {
    let user = create_user(pool, email).await;
    UserRepo::set_super_admin(pool, user.id, true)
        .await
        .unwrap()
        .unwrap()
}

/// Create a masjid whose first admin is `admin_id`.
pub async fn create_masjid(pool: &PgPool, admin_id: DbId, name: &str) -> (Masjid, Membership) {
    MasjidRepo::create_with_admin(
        pool,
        admin_id,
        &CreateMasjid {
            name: name.to_string(),
            address: None,
            city: None,
            country: None,
            latitude: None,
            longitude: None,
        },
    )
    .await
    .unwrap()
}

/// Add a membership with the role's default capabilities.
pub async fn add_member(pool: &PgPool, user_id: DbId, masjid_id: DbId, role: Role) -> Membership {
    MembershipRepo::add(
        pool,
        &NewMembership::with_role_defaults(user_id, masjid_id, role, None),
    )
    .await
    .unwrap()
}

/// Bearer token for `user_id`, signed with the test secret.
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Anonymous device identity sent as the three device headers.
#[derive(Debug, Clone, Copy)]
pub struct Device<'a> {
    pub raw_id: &'a str,
    pub platform: &'a str,
    pub app_version: &'a str,
}

pub const ANDROID_DEVICE: Device<'static> = Device {
    raw_id: "device-abc123",
    platform: "android",
    app_version: "2.0",
};

/// Send one request through the router.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    device: Option<Device<'_>>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(device) = device {
        builder = builder
            .header(DEVICE_ID_HEADER, device.raw_id)
            .header(PLATFORM_HEADER, device.platform)
            .header(APP_VERSION_HEADER, device.app_version);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), None, Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, None).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
