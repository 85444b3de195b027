//! Integration tests for masjid membership mutations.
//!
//! Covers the transactional guarantees the repository owns:
//! - creating a masjid seeds exactly one admin with full capabilities
//! - the last admin can be neither demoted nor removed, even by concurrent demotions
//! - a user holds each role at most once per masjid
//! - exactly one default membership per user, promoted on removal

use assert_matches::assert_matches;
use masjid_core::capabilities::Capabilities;
use masjid_core::error::CoreError;
use masjid_core::roles::Role;
use masjid_db::models::masjid::CreateMasjid;
use masjid_db::models::membership::{MembershipChange, NewMembership};
use masjid_db::models::user::{CreateUser, User};
use masjid_db::repositories::{MasjidRepo, MembershipRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: email.to_string(),
        },
    )
    .await
    .unwrap()
}

fn new_masjid(name: &str) -> CreateMasjid {
    CreateMasjid {
        name: name.to_string(),
        address: None,
        city: Some("Leeds".to_string()),
        country: None,
        latitude: None,
        longitude: None,
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_masjid_seeds_admin(pool: PgPool) {
    let creator = new_user(&pool, "creator@example.com").await;
    let (masjid, admin) = MasjidRepo::create_with_admin(&pool, creator.id, &new_masjid("Central"))
        .await
        .unwrap();

    assert_eq!(admin.masjid_id, masjid.id);
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.capabilities(), Capabilities::defaults_for(Role::Admin));
    assert!(admin.is_default, "first membership becomes the default");
    assert_eq!(MembershipRepo::count_admins(&pool, masjid.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_membership_is_not_default(pool: PgPool) {
    let user = new_user(&pool, "imam@example.com").await;
    let (first, _) = MasjidRepo::create_with_admin(&pool, user.id, &new_masjid("First"))
        .await
        .unwrap();
    let (second, _) = MasjidRepo::create_with_admin(&pool, user.id, &new_masjid("Second"))
        .await
        .unwrap();

    let memberships = MembershipRepo::list_for_user(&pool, user.id).await.unwrap();
    assert_eq!(memberships.len(), 2);
    assert_eq!(memberships.iter().filter(|m| m.is_default).count(), 1);
    assert_eq!(memberships[0].masjid_id, first.id);
    assert_eq!(memberships[1].masjid_id, second.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_role_is_a_unique_violation(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let imam = new_user(&pool, "imam@example.com").await;
    let (masjid, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
        .await
        .unwrap();

    let input = NewMembership::with_role_defaults(imam.id, masjid.id, Role::Imam, Some(admin.id));
    MembershipRepo::add(&pool, &input).await.unwrap();
    let err = MembershipRepo::add(&pool, &input).await.unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_masjid_members_user_masjid_role"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_same_user_can_hold_both_roles(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let (masjid, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
        .await
        .unwrap();

    let imam_row =
        NewMembership::with_role_defaults(admin.id, masjid.id, Role::Imam, Some(admin.id));
    MembershipRepo::add(&pool, &imam_row).await.unwrap();

    let rows = MembershipRepo::list_for_user_in_masjid(&pool, admin.id, masjid.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

// ---------------------------------------------------------------------------
// Last-admin protection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_last_admin_cannot_be_demoted(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let (masjid, membership) =
        MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
            .await
            .unwrap();

    let change = MembershipRepo::change_role(&pool, masjid.id, membership.id, Role::Imam)
        .await
        .unwrap();
    assert_matches!(change, MembershipChange::Rejected(CoreError::Forbidden(_)));

    let still = MembershipRepo::find_by_id(&pool, membership.id).await.unwrap().unwrap();
    assert_eq!(still.role, Role::Admin);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_last_admin_cannot_be_removed(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let (masjid, membership) =
        MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
            .await
            .unwrap();

    let change = MembershipRepo::remove(&pool, masjid.id, membership.id).await.unwrap();
    assert_matches!(change, MembershipChange::Rejected(CoreError::Forbidden(_)));
    assert_eq!(MembershipRepo::count_admins(&pool, masjid.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_demotions_leave_one_admin(pool: PgPool) {
    let first = new_user(&pool, "first@example.com").await;
    let second = new_user(&pool, "second@example.com").await;
    let (masjid, first_row) = MasjidRepo::create_with_admin(&pool, first.id, &new_masjid("Central"))
        .await
        .unwrap();
    let second_row = MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(second.id, masjid.id, Role::Admin, Some(first.id)),
    )
    .await
    .unwrap();

    let (a, b) = tokio::join!(
        MembershipRepo::change_role(&pool, masjid.id, first_row.id, Role::Imam),
        MembershipRepo::change_role(&pool, masjid.id, second_row.id, Role::Imam),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let updated = outcomes
        .iter()
        .filter(|c| matches!(c, MembershipChange::Updated(_)))
        .count();
    let refused = outcomes
        .iter()
        .filter(|c| matches!(c, MembershipChange::Rejected(CoreError::Forbidden(_))))
        .count();
    assert_eq!((updated, refused), (1, 1));
    assert_eq!(MembershipRepo::count_admins(&pool, masjid.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_can_be_demoted_when_another_exists(pool: PgPool) {
    let first = new_user(&pool, "first@example.com").await;
    let second = new_user(&pool, "second@example.com").await;
    let (masjid, first_row) = MasjidRepo::create_with_admin(&pool, first.id, &new_masjid("Central"))
        .await
        .unwrap();
    MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(second.id, masjid.id, Role::Admin, Some(first.id)),
    )
    .await
    .unwrap();

    let change = MembershipRepo::change_role(&pool, masjid.id, first_row.id, Role::Imam)
        .await
        .unwrap();
    let updated = assert_matches!(change, MembershipChange::Updated(m) => m);
    assert_eq!(updated.role, Role::Imam);
    // Demotion keeps the stored capability bits.
    assert_eq!(updated.capabilities(), first_row.capabilities());
    assert_eq!(MembershipRepo::count_admins(&pool, masjid.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_already_held_is_a_conflict(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let other = new_user(&pool, "other@example.com").await;
    let (masjid, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
        .await
        .unwrap();
    MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(other.id, masjid.id, Role::Admin, Some(admin.id)),
    )
    .await
    .unwrap();
    let imam_row = MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(other.id, masjid.id, Role::Imam, Some(admin.id)),
    )
    .await
    .unwrap();

    let change = MembershipRepo::change_role(&pool, masjid.id, imam_row.id, Role::Admin)
        .await
        .unwrap();
    assert_matches!(change, MembershipChange::Rejected(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_membership_of_other_masjid_is_not_found(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let (first, row) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("First"))
        .await
        .unwrap();
    let (second, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Second"))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let change = MembershipRepo::remove(&pool, second.id, row.id).await.unwrap();
    assert_matches!(change, MembershipChange::NotFound);
}

// ---------------------------------------------------------------------------
// Default membership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_default_moves_the_flag(pool: PgPool) {
    let user = new_user(&pool, "user@example.com").await;
    let (_, first) = MasjidRepo::create_with_admin(&pool, user.id, &new_masjid("First"))
        .await
        .unwrap();
    let (_, second) = MasjidRepo::create_with_admin(&pool, user.id, &new_masjid("Second"))
        .await
        .unwrap();

    let updated = MembershipRepo::set_default(&pool, user.id, second.id)
        .await
        .unwrap()
        .expect("membership belongs to user");
    assert!(updated.is_default);

    let first = MembershipRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert!(!first.is_default);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_default_rejects_foreign_membership(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let stranger = new_user(&pool, "stranger@example.com").await;
    let (_, row) = MasjidRepo::create_with_admin(&pool, owner.id, &new_masjid("Central"))
        .await
        .unwrap();

    let result = MembershipRepo::set_default(&pool, stranger.id, row.id).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_removing_default_promotes_oldest_remaining(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let imam = new_user(&pool, "imam@example.com").await;
    let (first, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("First"))
        .await
        .unwrap();
    let (second, _) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Second"))
        .await
        .unwrap();

    let default_row = MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(imam.id, first.id, Role::Imam, Some(admin.id)),
    )
    .await
    .unwrap();
    let other_row = MembershipRepo::add(
        &pool,
        &NewMembership::with_role_defaults(imam.id, second.id, Role::Imam, Some(admin.id)),
    )
    .await
    .unwrap();
    assert!(default_row.is_default);
    assert!(!other_row.is_default);

    let change = MembershipRepo::remove(&pool, first.id, default_row.id).await.unwrap();
    assert_matches!(change, MembershipChange::Removed);

    let promoted = MembershipRepo::find_by_id(&pool, other_row.id).await.unwrap().unwrap();
    assert!(promoted.is_default);
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_capabilities_replaces_all_bits(pool: PgPool) {
    let admin = new_user(&pool, "admin@example.com").await;
    let (masjid, row) = MasjidRepo::create_with_admin(&pool, admin.id, &new_masjid("Central"))
        .await
        .unwrap();

    let none = Capabilities::uniform(false);
    let updated = MembershipRepo::update_capabilities(&pool, masjid.id, row.id, &none)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.capabilities(), none);
    assert_eq!(updated.role, Role::Admin);
}
