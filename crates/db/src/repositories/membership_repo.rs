//! Repository for the `masjid_members` table.
//!
//! Role changes and removals run inside a transaction that first locks the
//! masjid row, so concurrent demotions serialize and the admin count read
//! by one of them always reflects the other's commit.

use masjid_core::capabilities::Capabilities;
use masjid_core::error::CoreError;
use masjid_core::permissions::ensure_not_last_admin;
use masjid_core::roles::Role;
use masjid_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::membership::{Membership, MembershipChange, NewMembership};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, masjid_id, role, can_view_complaints, can_answer_complaints, \
                        can_view_questions, can_answer_questions, can_change_prayer_times, \
                        can_create_events, can_create_notifications, is_default, assigned_by, \
                        created_at, updated_at";

/// Provides membership queries and transactional mutations.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Insert a membership. The user's first membership becomes their default.
    ///
    /// A duplicate (user, masjid, role) fails with the
    /// `uq_masjid_members_user_masjid_role` unique violation.
    pub async fn add(pool: &PgPool, input: &NewMembership) -> Result<Membership, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        insert_membership(&mut conn, input).await
    }

    /// Find a membership by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Membership>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM masjid_members WHERE id = $1");
        sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All membership rows a user holds on one masjid (zero, one, or two).
    pub async fn list_for_user_in_masjid(
        pool: &PgPool,
        user_id: DbId,
        masjid_id: DbId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM masjid_members
             WHERE user_id = $1 AND masjid_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(user_id)
            .bind(masjid_id)
            .fetch_all(pool)
            .await
    }

    /// All memberships of a masjid.
    pub async fn list_for_masjid(
        pool: &PgPool,
        masjid_id: DbId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM masjid_members
             WHERE masjid_id = $1
             ORDER BY role, id"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(masjid_id)
            .fetch_all(pool)
            .await
    }

    /// All memberships of a user across masjids, default first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM masjid_members
             WHERE user_id = $1
             ORDER BY is_default DESC, id"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Number of admin rows on a masjid.
    pub async fn count_admins(pool: &PgPool, masjid_id: DbId) -> Result<i64, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        count_admins(&mut conn, masjid_id).await
    }

    /// Change the role of one membership row.
    ///
    /// Demoting an admin is refused when it is the masjid's last admin.
    /// Moving to a role the user already holds on this masjid is a conflict.
    /// Capability bits are left untouched.
    pub async fn change_role(
        pool: &PgPool,
        masjid_id: DbId,
        membership_id: DbId,
        new_role: Role,
    ) -> Result<MembershipChange, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock_masjid(&mut tx, masjid_id).await? {
            return Ok(MembershipChange::NotFound);
        }
        let Some(current) = find_in_masjid(&mut tx, masjid_id, membership_id).await? else {
            return Ok(MembershipChange::NotFound);
        };

        if current.role == new_role {
            return Ok(MembershipChange::Updated(current));
        }

        if holds_role(&mut tx, current.user_id, masjid_id, new_role).await? {
            return Ok(MembershipChange::Rejected(CoreError::Conflict(format!(
                "User already holds the {new_role} role on this masjid"
            ))));
        }

        if current.role == Role::Admin {
            let admins = count_admins(&mut tx, masjid_id).await?;
            if let Err(e) = ensure_not_last_admin(admins) {
                return Ok(MembershipChange::Rejected(e));
            }
        }

        let query = format!(
            "UPDATE masjid_members SET role = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Membership>(&query)
            .bind(membership_id)
            .bind(new_role.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(MembershipChange::Updated(updated))
    }

    /// Delete one membership row.
    ///
    /// Removing the masjid's last admin is refused. If the removed row was
    /// the user's default, their oldest remaining membership becomes default.
    pub async fn remove(
        pool: &PgPool,
        masjid_id: DbId,
        membership_id: DbId,
    ) -> Result<MembershipChange, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock_masjid(&mut tx, masjid_id).await? {
            return Ok(MembershipChange::NotFound);
        }
        let Some(current) = find_in_masjid(&mut tx, masjid_id, membership_id).await? else {
            return Ok(MembershipChange::NotFound);
        };

        if current.role == Role::Admin {
            let admins = count_admins(&mut tx, masjid_id).await?;
            if let Err(e) = ensure_not_last_admin(admins) {
                return Ok(MembershipChange::Rejected(e));
            }
        }

        sqlx::query("DELETE FROM masjid_members WHERE id = $1")
            .bind(membership_id)
            .execute(&mut *tx)
            .await?;

        if current.is_default {
            sqlx::query(
                "UPDATE masjid_members SET is_default = true, updated_at = NOW()
                 WHERE id = (
                     SELECT id FROM masjid_members WHERE user_id = $1 ORDER BY id LIMIT 1
                 )",
            )
            .bind(current.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(MembershipChange::Removed)
    }

    /// Replace the seven capability bits of one membership row.
    pub async fn update_capabilities(
        pool: &PgPool,
        masjid_id: DbId,
        membership_id: DbId,
        caps: &Capabilities,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let query = format!(
            "UPDATE masjid_members SET
                can_view_complaints = $3,
                can_answer_complaints = $4,
                can_view_questions = $5,
                can_answer_questions = $6,
                can_change_prayer_times = $7,
                can_create_events = $8,
                can_create_notifications = $9,
                updated_at = NOW()
             WHERE id = $1 AND masjid_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(membership_id)
            .bind(masjid_id)
            .bind(caps.can_view_complaints)
            .bind(caps.can_answer_complaints)
            .bind(caps.can_view_questions)
            .bind(caps.can_answer_questions)
            .bind(caps.can_change_prayer_times)
            .bind(caps.can_create_events)
            .bind(caps.can_create_notifications)
            .fetch_optional(pool)
            .await
    }

    /// Make `membership_id` the user's only default membership.
    ///
    /// Returns `None` if the membership does not belong to `user_id`.
    pub async fn set_default(
        pool: &PgPool,
        user_id: DbId,
        membership_id: DbId,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Lock all of the user's rows so concurrent reassignments serialize.
        let owned: Vec<DbId> = sqlx::query_scalar(
            "SELECT id FROM masjid_members WHERE user_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if !owned.contains(&membership_id) {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE masjid_members SET is_default = false, updated_at = NOW()
             WHERE user_id = $1 AND is_default = true",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE masjid_members SET is_default = true, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Membership>(&query)
            .bind(membership_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }
}

/// Insert a membership on an existing connection or transaction.
pub(crate) async fn insert_membership(
    conn: &mut PgConnection,
    input: &NewMembership,
) -> Result<Membership, sqlx::Error> {
    let caps = &input.capabilities;
    let query = format!(
        "INSERT INTO masjid_members
            (user_id, masjid_id, role, can_view_complaints, can_answer_complaints,
             can_view_questions, can_answer_questions, can_change_prayer_times,
             can_create_events, can_create_notifications, assigned_by, is_default)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
             NOT EXISTS (SELECT 1 FROM masjid_members WHERE user_id = $1 AND is_default))
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Membership>(&query)
        .bind(input.user_id)
        .bind(input.masjid_id)
        .bind(input.role.as_str())
        .bind(caps.can_view_complaints)
        .bind(caps.can_answer_complaints)
        .bind(caps.can_view_questions)
        .bind(caps.can_answer_questions)
        .bind(caps.can_change_prayer_times)
        .bind(caps.can_create_events)
        .bind(caps.can_create_notifications)
        .bind(input.assigned_by)
        .fetch_one(&mut *conn)
        .await
}

/// Lock the masjid row for the rest of the transaction.
async fn lock_masjid(conn: &mut PgConnection, masjid_id: DbId) -> Result<bool, sqlx::Error> {
    let locked: Option<DbId> = sqlx::query_scalar("SELECT id FROM masjids WHERE id = $1 FOR UPDATE")
        .bind(masjid_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(locked.is_some())
}

async fn find_in_masjid(
    conn: &mut PgConnection,
    masjid_id: DbId,
    membership_id: DbId,
) -> Result<Option<Membership>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM masjid_members
         WHERE id = $1 AND masjid_id = $2
         FOR UPDATE"
    );
    sqlx::query_as::<_, Membership>(&query)
        .bind(membership_id)
        .bind(masjid_id)
        .fetch_optional(&mut *conn)
        .await
}

async fn holds_role(
    conn: &mut PgConnection,
    user_id: DbId,
    masjid_id: DbId,
    role: Role,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM masjid_members WHERE user_id = $1 AND masjid_id = $2 AND role = $3
         )",
    )
    .bind(user_id)
    .bind(masjid_id)
    .bind(role.as_str())
    .fetch_one(&mut *conn)
    .await
}

async fn count_admins(conn: &mut PgConnection, masjid_id: DbId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM masjid_members WHERE masjid_id = $1 AND role = $2")
        .bind(masjid_id)
        .bind(Role::Admin.as_str())
        .fetch_one(&mut *conn)
        .await
}
