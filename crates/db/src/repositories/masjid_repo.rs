//! Repository for the `masjids` table.

use masjid_core::roles::Role;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::masjid::{CreateMasjid, Masjid, UpdateMasjid};
use crate::models::membership::{Membership, NewMembership};
use crate::repositories::membership_repo::insert_membership;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, address, city, country, latitude, longitude, is_active, \
                        created_by, created_at, updated_at";

/// Provides CRUD operations for masjids.
pub struct MasjidRepo;

impl MasjidRepo {
    /// Create a masjid and make `creator_id` its first admin, atomically.
    pub async fn create_with_admin(
        pool: &PgPool,
        creator_id: DbId,
        input: &CreateMasjid,
    ) -> Result<(Masjid, Membership), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO masjids (name, address, city, country, latitude, longitude, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let masjid = sqlx::query_as::<_, Masjid>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.country)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(creator_id)
            .fetch_one(&mut *tx)
            .await?;

        let admin = NewMembership::with_role_defaults(
            creator_id,
            masjid.id,
            Role::Admin,
            Some(creator_id),
        );
        let membership = insert_membership(&mut tx, &admin).await?;

        tx.commit().await?;
        Ok((masjid, membership))
    }

    /// Find a masjid by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Masjid>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM masjids WHERE id = $1");
        sqlx::query_as::<_, Masjid>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active masjids ordered by name.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Masjid>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM masjids WHERE is_active = true ORDER BY name");
        sqlx::query_as::<_, Masjid>(&query).fetch_all(pool).await
    }

    /// Update a masjid. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMasjid,
    ) -> Result<Option<Masjid>, sqlx::Error> {
        let query = format!(
            "UPDATE masjids SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                country = COALESCE($5, country),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Masjid>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.country)
            .bind(input.latitude)
            .bind(input.longitude)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a masjid. Returns `true` if the row changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE masjids SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
