//! Anonymous device identity and recipient resolution.
//!
//! Anonymous clients identify themselves with three headers:
//!
//! | Header          | Example    |
//! |-----------------|------------|
//! | `X-Device-Id`   | `abc123`   |
//! | `X-Platform`    | `android`  |
//! | `X-App-Version` | `2.0`      |
//!
//! The raw id is never stored; [`derive_device_id`] turns the triple into
//! the identifier used by subscriptions, settings, and questions.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use masjid_core::device::resolve_device_id;
use masjid_core::error::CoreError;
use masjid_core::recipient::Recipient;

use crate::middleware::auth::AuthUser;

pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const PLATFORM_HEADER: &str = "x-platform";
pub const APP_VERSION_HEADER: &str = "x-app-version";

/// Raw device headers as sent by the client. Never rejects; validation
/// happens in [`DeviceHeaders::device_id`].
#[derive(Debug, Clone, Default)]
pub struct DeviceHeaders {
    pub raw_device_id: Option<String>,
    pub platform: Option<String>,
    pub app_version: Option<String>,
}

impl DeviceHeaders {
    /// Derive the device identifier.
    ///
    /// `override_raw` (for example a `device_id` in a request body) takes
    /// the place of the `X-Device-Id` header. Returns `Ok(None)` when no raw
    /// id is available at all.
    pub fn device_id(&self, override_raw: Option<&str>) -> Result<Option<String>, CoreError> {
        let Some(raw) = override_raw.or(self.raw_device_id.as_deref()) else {
            return Ok(None);
        };
        let platform = self.platform.as_deref().ok_or_else(|| {
            CoreError::Validation("X-Platform header is required with a device id".into())
        })?;
        let app_version = self.app_version.as_deref().ok_or_else(|| {
            CoreError::Validation("X-App-Version header is required with a device id".into())
        })?;
        resolve_device_id(raw, platform, app_version).map(Some)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for DeviceHeaders {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Ok(DeviceHeaders {
            raw_device_id: header(DEVICE_ID_HEADER),
            platform: header(PLATFORM_HEADER),
            app_version: header(APP_VERSION_HEADER),
        })
    }
}

/// Decide who the caller is for recipient-scoped operations.
///
/// An authenticated user always wins. Otherwise the device identity is
/// required; a request carrying neither is a validation failure.
pub fn resolve_recipient(
    auth: Option<AuthUser>,
    device: &DeviceHeaders,
    body_device_id: Option<&str>,
) -> Result<Recipient, CoreError> {
    if let Some(user) = auth {
        return Ok(Recipient::User(user.user_id));
    }
    match device.device_id(body_device_id)? {
        Some(device_id) => Ok(Recipient::Device(device_id)),
        None => Err(CoreError::Validation(
            "Either an access token or device identity headers are required".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use masjid_core::device::{derive_device_id, Platform};

    use super::*;

    fn headers(raw: Option<&str>, platform: Option<&str>, version: Option<&str>) -> DeviceHeaders {
        DeviceHeaders {
            raw_device_id: raw.map(str::to_string),
            platform: platform.map(str::to_string),
            app_version: version.map(str::to_string),
        }
    }

    #[test]
    fn user_takes_precedence_over_device() {
        let device = headers(Some("abc123"), Some("android"), Some("2.0"));
        let recipient = resolve_recipient(Some(AuthUser { user_id: 9 }), &device, None).unwrap();
        assert_eq!(recipient, Recipient::User(9));
    }

    #[test]
    fn device_headers_derive_the_identifier() {
        let device = headers(Some("abc123"), Some("android"), Some("2.0"));
        let recipient = resolve_recipient(None, &device, None).unwrap();
        assert_eq!(
            recipient,
            Recipient::Device(derive_device_id("abc123", Platform::Android, "2.0"))
        );
    }

    #[test]
    fn body_device_id_replaces_header() {
        let device = headers(Some("from-header"), Some("ios"), Some("1.0"));
        let recipient = resolve_recipient(None, &device, Some("from-body")).unwrap();
        assert_eq!(
            recipient,
            Recipient::Device(derive_device_id("from-body", Platform::Ios, "1.0"))
        );
    }

    #[test]
    fn missing_identity_is_a_validation_error() {
        assert_matches!(
            resolve_recipient(None, &DeviceHeaders::default(), None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn device_id_without_platform_is_rejected() {
        let device = headers(Some("abc123"), None, Some("2.0"));
        assert_matches!(
            resolve_recipient(None, &device, None),
            Err(CoreError::Validation(msg)) if msg.contains("X-Platform")
        );
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let device = headers(Some("abc123"), Some("symbian"), Some("2.0"));
        assert_matches!(
            resolve_recipient(None, &device, None),
            Err(CoreError::Validation(_))
        );
    }
}
