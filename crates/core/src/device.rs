//! Anonymous device identity.
//!
//! Clients send a raw device id, their platform, and their app version. The
//! identifier used everywhere else (subscriptions, preferences, questions) is
//! derived from those three values and never stored raw.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hashing::sha256_hex;

/// Length of a derived device identifier, in hex characters.
pub const DEVICE_ID_LEN: usize = 32;

/// Client platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "web" => Ok(Platform::Web),
            other => Err(CoreError::Validation(format!(
                "Invalid platform '{other}'. Must be one of: android, ios, web"
            ))),
        }
    }
}

/// Derive the externally visible device identifier.
///
/// `hex(sha256(raw_device_id + ":" + platform + ":" + app_version))`,
/// truncated to [`DEVICE_ID_LEN`] characters.
pub fn derive_device_id(raw_device_id: &str, platform: Platform, app_version: &str) -> String {
    let input = format!("{raw_device_id}:{}:{app_version}", platform.as_str());
    let mut digest = sha256_hex(input.as_bytes());
    digest.truncate(DEVICE_ID_LEN);
    digest
}

/// Validate raw identity inputs and derive the device identifier.
///
/// The raw id and version are hashed exactly as sent, so padded values are
/// refused rather than trimmed into a different identifier.
pub fn resolve_device_id(
    raw_device_id: &str,
    platform: &str,
    app_version: &str,
) -> Result<String, CoreError> {
    let raw = exact_field("Device id", raw_device_id)?;
    let platform: Platform = platform.parse()?;
    let version = exact_field("App version", app_version)?;
    Ok(derive_device_id(raw, platform, version))
}

fn exact_field<'a>(name: &str, value: &'a str) -> Result<&'a str, CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    if value.trim() != value {
        return Err(CoreError::Validation(format!(
            "{name} must not have leading or trailing whitespace"
        )));
    }
    Ok(value)
}
