use std::sync::Arc;

use actix_session::Session;
use actix_web::{HttpRequest, Responder, get, post, web};
use serde_json::json;
use sqlx::PgPool;

use api_auth::{
    services::{identity::IdentityClient, user as user_service},
    session::{self, RequireAuthOptions},
};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
};
use db::models::price::Currency;

use crate::{
    dtos::sub::{
        CheckoutRequest, CheckoutResponse, CheckoutStatus, PlansQuery, SubscriptionOverview,
        group_pricing_rows,
    },
    services,
};

const TAG: &str = "subscription";

/// Lists the pricing catalog: every active tier with its prices in one
/// currency, grouped per tier and cheapest first.
///
/// # Input
/// - `currency`: Optional query parameter (`usd` or `eur`); falls back
///   to the configured default
///
/// # Output
/// - Success: Returns a JSON array of pricing plans
/// - Error: Returns 400 Bad Request for an unsupported currency
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subs/plans?currency=eur');
///
/// if (response.ok) {
///   const { data } = await response.json();
///   console.log('Available plans:', data);
///   // Example response:
///   // [
///   //   {
///   //     id: "tier_1",
///   //     name: "Basic",
///   //     description: "For starters",
///   //     featuresList: ["4 notes"],
///   //     maxNumberOfNotes: 4,
///   //     prices: [
///   //       { id: "price_tier_1_month", interval: "month", currency: "eur", amount: 1990 },
///   //       { id: "price_tier_1_year", interval: "year", currency: "eur", amount: 19900 }
///   //     ]
///   //   },
///   //   // More plans...
///   // ]
/// }
/// ```
#[get("/plans")]
async fn get_plans(
    query: web::Query<PlansQuery>,
    pool: web::Data<Arc<PgPool>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let currency = display_currency(query.currency.as_deref(), &config.default_currency)?;
    let pg_pool: &PgPool = &**pool;

    let rows = db::price::pricing_rows(pg_pool, currency.as_str()).await?;

    Success::ok(group_pricing_rows(rows))
}

/// Returns everything the subscription page needs: the caller's current
/// subscription (if any), their tier, and the catalog priced in their
/// billing currency.
///
/// # Input
/// - Session cookie (redirects to /login when absent or expired)
///
/// # Output
/// - Success: Returns `{ subscription, userTier, pricingPlan }`;
///   `subscription` is null for free-tier users
/// - Error: 302 redirect to /login without a valid session
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subs/subscription', {
///   redirect: 'manual' // the API signals auth failures as redirects
/// });
///
/// if (response.ok) {
///   const { data } = await response.json();
///   console.log('Current tier:', data.userTier.name);
///   console.log('Renews at:', data.subscription?.currentPeriodEnd);
/// }
/// ```
#[get("/subscription")]
async fn get_subscription(
    req: HttpRequest,
    session: Session,
    pool: web::Data<Arc<PgPool>>,
    identity: web::Data<IdentityClient>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let auth =
        session::require_auth_session(&req, &session, &identity, RequireAuthOptions::default())
            .await?;
    let pg_pool: &PgPool = &**pool;

    let subscription = db::subscription::get_summary_for_user(pg_pool, auth.user_id).await?;
    let user_tier = user_service::get_user_tier(pg_pool, auth.user_id).await?;
    let billing_info = user_service::get_billing_info(pg_pool, auth.user_id).await?;

    // Once a customer has paid in a currency the provider pins them to
    // it, so the page has to quote prices in that same currency.
    let currency = display_currency(billing_info.currency.as_deref(), &config.default_currency)?;
    let rows = db::price::pricing_rows(pg_pool, currency.as_str()).await?;

    Success::ok(SubscriptionOverview {
        subscription,
        user_tier,
        pricing_plan: group_pricing_rows(rows),
    })
}

/// Reports whether the subscription bought in the latest checkout has
/// landed locally yet.
///
/// # Input
/// - Session cookie (redirects to /login when absent or expired)
///
/// # Output
/// - Success: Returns `{ pending }`; poll while `pending` is true
///
/// # Frontend Example
/// ```javascript
/// // Poll after the provider redirects back to /checkout
/// const response = await fetch('/api/subs/checkout/status', {
///   redirect: 'manual'
/// });
///
/// if (response.ok) {
///   const { data } = await response.json();
///   if (!data.pending) {
///     // The webhook has been processed; the new tier is active
///   }
/// }
/// ```
#[get("/checkout/status")]
async fn get_checkout_status(
    req: HttpRequest,
    session: Session,
    pool: web::Data<Arc<PgPool>>,
    identity: web::Data<IdentityClient>,
) -> Res<impl Responder> {
    let auth =
        session::require_auth_session(&req, &session, &identity, RequireAuthOptions::default())
            .await?;
    let pg_pool: &PgPool = &**pool;

    let subscription = db::subscription::get_for_user(pg_pool, auth.user_id).await?;

    Success::ok(CheckoutStatus {
        pending: subscription.is_none(),
    })
}

/// Starts a provider checkout for one of the catalog prices and returns
/// the hosted payment page to send the user to.
///
/// # Input
/// - Session cookie (redirects to /login when absent or expired)
/// - JSON body:
///   - `priceId`: One of the price ids from the plans endpoint
///
/// # Output
/// - Success: Returns `{ url }` of the hosted checkout page
/// - Error: 400 for an unknown price or when the caller is already on
///   that price, 500 when the provider call fails
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subs/checkout', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ priceId: 'price_tier_1_month' }),
///   redirect: 'manual'
/// });
///
/// if (response.ok) {
///   const { data } = await response.json();
///   window.location.href = data.url; // Hand over to the provider
/// }
/// ```
#[post("/checkout")]
async fn post_checkout(
    req: HttpRequest,
    session: Session,
    body: web::Json<CheckoutRequest>,
    pool: web::Data<Arc<PgPool>>,
    stripe_client: web::Data<stripe::Client>,
    identity: web::Data<IdentityClient>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let auth =
        session::require_auth_session(&req, &session, &identity, RequireAuthOptions::default())
            .await?;
    let pg_pool: &PgPool = &**pool;

    let price_id = body.price_id.trim();
    if price_id.is_empty() {
        return Err(AppError::validation("Subscribe payload is invalid", TAG));
    }

    if db::price::get(pg_pool, price_id).await?.is_none() {
        return Err(AppError::validation("Unknown price", TAG)
            .with_metadata(json!({ "priceId": price_id })));
    }

    let billing_info = user_service::get_billing_info(pg_pool, auth.user_id).await?;
    let subscription = db::subscription::get_for_user(pg_pool, auth.user_id).await?;

    if subscription
        .as_ref()
        .is_some_and(|subscription| subscription.price_id == price_id)
    {
        return Err(
            AppError::validation("You are already subscribed to this tier", TAG)
                .with_metadata(json!({ "priceId": price_id })),
        );
    }

    let url = services::checkout::create_checkout_session(
        &stripe_client,
        &config.server_url,
        &billing_info.customer_id,
        price_id,
    )
    .await?;

    Success::created(CheckoutResponse { url })
}

/// Opens the provider's billing portal for the caller.
///
/// # Input
/// - Session cookie (redirects to /login when absent or expired)
///
/// # Output
/// - Success: Returns `{ url }` of the hosted portal session
/// - Error: 500 when the provider call fails
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subs/portal', {
///   method: 'POST',
///   redirect: 'manual'
/// });
///
/// if (response.ok) {
///   const { data } = await response.json();
///   window.location.href = data.url;
/// }
/// ```
#[post("/portal")]
async fn post_portal(
    req: HttpRequest,
    session: Session,
    pool: web::Data<Arc<PgPool>>,
    stripe_client: web::Data<stripe::Client>,
    identity: web::Data<IdentityClient>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let auth =
        session::require_auth_session(&req, &session, &identity, RequireAuthOptions::default())
            .await?;
    let pg_pool: &PgPool = &**pool;

    let billing_info = user_service::get_billing_info(pg_pool, auth.user_id).await?;

    let url = services::checkout::create_billing_portal_session(
        &stripe_client,
        &config.server_url,
        &billing_info.customer_id,
    )
    .await?;

    Success::ok(CheckoutResponse { url })
}

fn display_currency(requested: Option<&str>, fallback: &str) -> Res<Currency> {
    match requested {
        Some(code) => code.parse(),
        None => fallback.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_currency_prefers_the_request() {
        assert_eq!(
            display_currency(Some("eur"), "usd").unwrap(),
            Currency::Eur
        );
        assert_eq!(display_currency(None, "usd").unwrap(), Currency::Usd);
    }

    #[test]
    fn unsupported_display_currencies_are_rejected() {
        assert!(display_currency(Some("gbp"), "usd").is_err());
    }
}
