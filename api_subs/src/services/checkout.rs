use serde_json::json;
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client, CreateBillingPortalSession,
    CreateCheckoutSession,
};

use common::{
    error::{AppError, Res},
    stripe::parse_customer_id,
};

const TAG: &str = "checkout";

/// Opens a provider checkout for one price. The provider redirects back
/// to `/checkout` on success, where the client polls until the webhook
/// has landed the subscription locally.
pub async fn create_checkout_session(
    client: &Client,
    server_url: &str,
    customer_id: &str,
    price_id: &str,
) -> Res<String> {
    let customer = parse_customer_id(customer_id)?;
    let success_url = format!("{server_url}/checkout");
    let cancel_url = format!("{server_url}/subscription");

    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(success_url.as_str()),
        cancel_url: Some(cancel_url.as_str()),
        customer: Some(customer),
        ..Default::default()
    };

    let session = CheckoutSession::create(client, params).await.map_err(|err| {
        AppError::upstream("Unable to create checkout session", TAG)
            .with_cause(err)
            .with_metadata(json!({ "customerId": customer_id, "priceId": price_id }))
    })?;

    session.url.ok_or_else(|| {
        AppError::upstream("Checkout session url is null", TAG)
            .with_metadata(json!({ "customerId": customer_id, "priceId": price_id }))
    })
}

/// Opens the provider's self-serve portal for upgrades, cancellations
/// and payment details. State changes made there come back through the
/// webhook like any other.
pub async fn create_billing_portal_session(
    client: &Client,
    server_url: &str,
    customer_id: &str,
) -> Res<String> {
    let customer = parse_customer_id(customer_id)?;
    let return_url = format!("{server_url}/subscription");

    let mut params = CreateBillingPortalSession::new(customer);
    params.return_url = Some(return_url.as_str());

    let session = BillingPortalSession::create(client, params)
        .await
        .map_err(|err| {
            AppError::upstream("Unable to create billing portal session", TAG)
                .with_cause(err)
                .with_metadata(json!({ "customerId": customer_id }))
        })?;

    Ok(session.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::ErrorKind;

    #[actix_web::test]
    async fn garbage_customer_ids_fail_before_any_provider_call() {
        let client = Client::new("sk_test_not_used");
        let err = create_checkout_session(&client, "http://localhost:3000", "user_1", "price_1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
