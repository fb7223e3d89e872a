//! Write-path tests that need a live Postgres. Ignored by default; run
//! them with DATABASE_URL pointing at a disposable database:
//!
//! `DATABASE_URL=postgres://... cargo test -p db -- --ignored`

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use common::error::ErrorKind;
use db::{
    dtos::{subscription::SubscriptionUpsert, user::NewUser},
    models::{price::Currency, tier::TierId},
};

async fn test_pool() -> Arc<PgPool> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
    db::setup(&url, false).await.expect("database setup")
}

async fn seed_user(pool: &PgPool) -> (Uuid, String) {
    let id = Uuid::new_v4();
    let customer_id = format!("cus_{}", id.simple());

    db::user::insert(
        pool,
        &NewUser {
            id,
            email: format!("{}@example.com", id.simple()),
            name: "Test User".to_string(),
            customer_id: customer_id.clone(),
        },
    )
    .await
    .expect("insert user");

    (id, customer_id)
}

fn remote_state(customer_id: &str, subscription_id: &str) -> SubscriptionUpsert {
    let start = Utc::now();

    SubscriptionUpsert {
        id: subscription_id.to_string(),
        customer_id: customer_id.to_string(),
        tier_id: TierId::Tier1,
        price_id: "price_tier_1_month".to_string(),
        item_id: format!("si_{}", Uuid::new_v4().simple()),
        status: "active".to_string(),
        current_period_start: start,
        current_period_end: start + Duration::days(30),
        cancel_at_period_end: false,
        currency: Currency::Usd,
    }
}

#[tokio::test]
#[ignore]
async fn duplicate_updates_converge_on_the_same_row() {
    let pool = test_pool().await;
    let (user_id, customer_id) = seed_user(&pool).await;

    let sub_id = format!("sub_{}", Uuid::new_v4().simple());
    let initial = remote_state(&customer_id, &sub_id);
    db::subscription::create_with_tier(&pool, &initial)
        .await
        .expect("create subscription");

    // Reconciling against unchanged remote state must not change anything
    // observable.
    db::subscription::update_with_tier(&pool, &initial)
        .await
        .expect("reconcile subscription");
    let row = db::subscription::get_for_user(&*pool, user_id)
        .await
        .expect("fetch subscription")
        .expect("subscription row");
    assert_eq!(row.id, sub_id);
    assert_eq!(row.tier_id, "tier_1");
    assert!(!row.cancel_at_period_end);

    let mut renewed = remote_state(&customer_id, &sub_id);
    renewed.cancel_at_period_end = true;
    renewed.currency = Currency::Eur;

    for _ in 0..2 {
        db::subscription::update_with_tier(&pool, &renewed)
            .await
            .expect("update subscription");

        let row = db::subscription::get_for_user(&*pool, user_id)
            .await
            .expect("fetch subscription")
            .expect("subscription row");

        assert_eq!(row.id, sub_id);
        assert_eq!(row.tier_id, "tier_1");
        assert!(row.cancel_at_period_end);
    }

    let user = db::user::get_by_id(&*pool, user_id)
        .await
        .expect("fetch user")
        .expect("user row");
    assert_eq!(user.tier_id, "tier_1");
    assert_eq!(user.currency.as_deref(), Some("eur"));

    db::user::delete(&*pool, user_id).await.expect("cleanup");
}

#[tokio::test]
#[ignore]
async fn delete_resets_the_tier_and_drops_the_row() {
    let pool = test_pool().await;
    let (user_id, customer_id) = seed_user(&pool).await;

    let sub_id = format!("sub_{}", Uuid::new_v4().simple());
    db::subscription::create_with_tier(&pool, &remote_state(&customer_id, &sub_id))
        .await
        .expect("create subscription");

    db::subscription::delete_and_reset_tier(&pool, &sub_id)
        .await
        .expect("delete subscription");

    let user = db::user::get_by_id(&*pool, user_id)
        .await
        .expect("fetch user")
        .expect("user row");
    assert_eq!(user.tier_id, "free");

    let row = db::subscription::get_for_user(&*pool, user_id)
        .await
        .expect("fetch subscription");
    assert!(row.is_none());

    db::user::delete(&*pool, user_id).await.expect("cleanup");
}

#[tokio::test]
#[ignore]
async fn updates_for_unknown_customers_fail_as_not_found() {
    let pool = test_pool().await;

    let state = remote_state("cus_does_not_exist", "sub_ghost");
    let err = db::subscription::update_with_tier(&pool, &state)
        .await
        .expect_err("update should fail");

    assert!(matches!(err.kind, ErrorKind::NotFound));
}
