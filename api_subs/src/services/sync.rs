use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use stripe::{Client, Subscription, SubscriptionId, SubscriptionItem};

use common::error::{AppError, Res};
use db::{
    dtos::{subscription::SubscriptionUpsert, tier::TierUpdate},
    models::{price::Currency, tier::TierId},
};

const TAG: &str = "subscription";

/// Pulls the provider's current view of a subscription and validates it
/// into the locally writable shape. Event payloads are only trusted for
/// ids; the money state always comes from this fetch, so replayed or
/// out-of-order deliveries converge on the same row.
pub async fn fetch_subscription(
    client: &Client,
    subscription_id: &str,
) -> Res<SubscriptionUpsert> {
    let id = subscription_id.parse::<SubscriptionId>().map_err(|err| {
        AppError::validation(format!("Invalid subscription id: {subscription_id}"), TAG)
            .with_cause(err)
    })?;

    let subscription = Subscription::retrieve(client, &id, &[])
        .await
        .map_err(|err| {
            AppError::upstream("Unable to retrieve subscription", TAG)
                .with_cause(err)
                .with_metadata(json!({ "id": subscription_id }))
        })?;

    map_subscription(subscription)
}

/// Writes the first local row for a checkout that just completed. The
/// row and the owner's tier move together in one transaction.
pub async fn create_subscription(pool: &PgPool, data: &SubscriptionUpsert) -> Res<()> {
    db::subscription::create_with_tier(pool, data)
        .await
        .map_err(|err| {
            AppError::internal("Unable to create subscription", TAG)
                .with_cause(err)
                .with_metadata(json!({
                    "customerId": data.customer_id,
                    "tierId": data.tier_id,
                    "id": data.id,
                    "priceId": data.price_id,
                    "itemId": data.item_id,
                }))
        })
}

pub async fn update_subscription(pool: &PgPool, data: &SubscriptionUpsert) -> Res<()> {
    db::subscription::update_with_tier(pool, data)
        .await
        .map_err(|err| {
            AppError::internal("Unable to update subscription", TAG)
                .with_cause(err)
                .with_metadata(json!({
                    "customerId": data.customer_id,
                    "tierId": data.tier_id,
                    "status": data.status,
                    "priceId": data.price_id,
                    "itemId": data.item_id,
                    "currency": data.currency,
                }))
        })
}

/// The provider already dropped the subscription, so there is nothing to
/// re-fetch; the local row goes away and the user falls back to the free
/// tier, atomically.
pub async fn delete_subscription(pool: &PgPool, id: &str, customer_id: &str) -> Res<()> {
    db::subscription::delete_and_reset_tier(pool, id)
        .await
        .map_err(|err| {
            AppError::internal("Unable to cancel subscription", TAG)
                .with_cause(err)
                .with_metadata(json!({ "id": id, "customerId": customer_id }))
        })
}

pub async fn update_tier(pool: &PgPool, data: &TierUpdate) -> Res<()> {
    db::tier::update_metadata(pool, data).await.map_err(|err| {
        AppError::internal("Unable to update tier", "tier")
            .with_cause(err)
            .with_metadata(json!({
                "tierId": data.id,
                "name": data.name,
                "active": data.active,
                "description": data.description,
            }))
    })
}

fn map_subscription(subscription: Subscription) -> Res<SubscriptionUpsert> {
    let id = subscription.id.to_string();
    let customer_id = subscription.customer.id().to_string();
    // The SDK only deserializes statuses it knows, so the string is safe
    // to store as-is.
    let status = subscription.status.to_string();
    let currency: Currency = subscription.currency.to_string().parse()?;

    let item = single_item(subscription.items.data)?;
    let (item_id, price_id, tier_id) = item_parts(item)?;

    let (current_period_start, current_period_end) = period_bounds(
        subscription.current_period_start,
        subscription.current_period_end,
    )?;

    Ok(SubscriptionUpsert {
        id,
        customer_id,
        tier_id,
        price_id,
        item_id,
        status,
        current_period_start,
        current_period_end,
        cancel_at_period_end: subscription.cancel_at_period_end,
        currency,
    })
}

/// The catalog sells one price per subscription. Anything else means the
/// provider contract drifted, and storing a truncated view would be
/// worse than failing.
fn single_item<T>(mut items: Vec<T>) -> Res<T> {
    if items.len() != 1 {
        return Err(
            AppError::validation("Subscription must have exactly one item", TAG)
                .with_metadata(json!({ "itemCount": items.len() })),
        );
    }
    Ok(items.remove(0))
}

fn item_parts(item: SubscriptionItem) -> Res<(String, String, TierId)> {
    let item_id = item.id.to_string();

    let price = item.price.ok_or_else(|| {
        AppError::validation("Stripe subscription fetch result is malformed", TAG)
            .with_metadata(json!({ "reason": "item has no price" }))
    })?;

    let product = price.product.as_ref().ok_or_else(|| {
        AppError::validation("Stripe subscription fetch result is malformed", TAG)
            .with_metadata(json!({ "reason": "price has no product" }))
    })?;

    // Product ids on the provider side are the local tier ids.
    let tier_id = product.id().as_str().parse()?;

    Ok((item_id, price.id.to_string(), tier_id))
}

fn period_bounds(start: i64, end: i64) -> Res<(DateTime<Utc>, DateTime<Utc>)> {
    let bound = |seconds: i64| {
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
            AppError::validation("Subscription period bounds are invalid", TAG)
                .with_metadata(json!({ "start": start, "end": end }))
        })
    };
    Ok((bound(start)?, bound(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::ErrorKind;

    #[test]
    fn a_single_item_is_unwrapped() {
        assert_eq!(single_item(vec!["only"]).unwrap(), "only");
    }

    #[test]
    fn multi_item_subscriptions_fail_loudly() {
        let err = single_item(vec![1, 2]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.metadata.unwrap()["itemCount"], 2);

        assert!(single_item(Vec::<i32>::new()).is_err());
    }

    #[test]
    fn period_bounds_map_epoch_seconds() {
        let (start, end) = period_bounds(1_700_000_000, 1_702_592_000).unwrap();
        assert!(start < end);
        assert_eq!(start.timestamp(), 1_700_000_000);
    }

    #[test]
    fn out_of_range_period_bounds_are_rejected() {
        assert!(period_bounds(i64::MAX, 1_700_000_000).is_err());
    }

    #[actix_web::test]
    async fn malformed_subscription_ids_fail_before_any_provider_call() {
        let client = Client::new("sk_test_not_used");
        let err = fetch_subscription(&client, "price_123").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
