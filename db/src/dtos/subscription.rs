use chrono::{DateTime, Utc};

use crate::models::{price::Currency, tier::TierId};

/// Validated snapshot of a provider subscription, ready to be written
/// locally. Produced by the sync service after shape checks, consumed by
/// the transactional writes in [`crate::subscription`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpsert {
    pub id: String,
    pub customer_id: String,
    pub tier_id: TierId,
    pub price_id: String,
    pub item_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub currency: Currency,
}
