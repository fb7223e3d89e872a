use stripe::{Client, CreateCustomer, Customer, CustomerId};

use crate::error::{AppError, Res};

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

pub async fn create_customer(client: &Client, email: &str, name: &str) -> Res<Customer> {
    let params = CreateCustomer {
        email: Some(email),
        name: Some(name),
        ..Default::default()
    };

    Customer::create(client, params)
        .await
        .map_err(AppError::from)
}

pub async fn delete_customer(client: &Client, customer_id: &str) -> Res<()> {
    let id = parse_customer_id(customer_id)?;

    Customer::delete(client, &id)
        .await
        .map(|_| ())
        .map_err(AppError::from)
}

pub fn parse_customer_id(customer_id: &str) -> Res<CustomerId> {
    customer_id.parse::<CustomerId>().map_err(|err| {
        AppError::validation("Invalid billing customer id", "stripe").with_cause(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_ids_must_carry_the_provider_prefix() {
        assert!(parse_customer_id("cus_123abc").is_ok());
        assert!(parse_customer_id("not-a-customer").is_err());
    }
}
