//! Masjid (tenant) entity model and DTOs.

use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `masjids` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Masjid {
    pub id: DbId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a masjid.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasjid {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// DTO for updating a masjid. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMasjid {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
