use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local user row. `id` comes from the identity provider and
/// `customer_id` from the billing provider, both set at sign-up.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub customer_id: String,
    pub currency: Option<String>,
    pub tier_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BillingInfo {
    pub customer_id: String,
    pub currency: Option<String>,
}
