use serde::{Deserialize, Serialize};

use db::models::{price::PricingRow, subscription::SubscriptionSummary, tier::Tier};

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStatus {
    /// True while the subscription created by the checkout has not yet
    /// arrived through the webhook. Clients poll until it flips.
    pub pending: bool,
}

/// One tier with its prices in the requested currency, grouped from the
/// flat pricing rows the database hands back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub features_list: Vec<String>,
    pub max_number_of_notes: Option<i32>,
    pub prices: Vec<PlanPrice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPrice {
    pub id: String,
    pub interval: String,
    pub currency: String,
    pub amount: i64,
}

/// Everything the subscription page renders in one payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOverview {
    pub subscription: Option<SubscriptionSummary>,
    pub user_tier: Tier,
    pub pricing_plan: Vec<PricingPlan>,
}

/// Groups flat tier/price rows into one plan per tier, keeping the
/// incoming row order (cheapest first) for both plans and their prices.
pub fn group_pricing_rows(rows: Vec<PricingRow>) -> Vec<PricingPlan> {
    let mut plans: Vec<PricingPlan> = Vec::new();

    for row in rows {
        let price = PlanPrice {
            id: row.price_id,
            interval: row.interval,
            currency: row.currency,
            amount: row.amount,
        };

        match plans.iter_mut().find(|plan| plan.id == row.tier_id) {
            Some(plan) => plan.prices.push(price),
            None => plans.push(PricingPlan {
                id: row.tier_id,
                name: row.tier_name,
                description: row.tier_description,
                features_list: row.features_list,
                max_number_of_notes: row.max_number_of_notes,
                prices: vec![price],
            }),
        }
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tier_id: &str, price_id: &str, interval: &str, amount: i64) -> PricingRow {
        PricingRow {
            tier_id: tier_id.to_string(),
            tier_name: tier_id.to_uppercase(),
            tier_description: None,
            features_list: vec!["feature".to_string()],
            max_number_of_notes: Some(2),
            price_id: price_id.to_string(),
            interval: interval.to_string(),
            currency: "usd".to_string(),
            amount,
        }
    }

    #[test]
    fn rows_group_into_one_plan_per_tier() {
        let plans = group_pricing_rows(vec![
            row("free", "price_free_month", "month", 0),
            row("free", "price_free_year", "year", 0),
            row("tier_1", "price_tier_1_month", "month", 990),
            row("tier_1", "price_tier_1_year", "year", 9900),
        ]);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, "free");
        assert_eq!(plans[0].prices.len(), 2);
        assert_eq!(plans[1].id, "tier_1");
        assert_eq!(plans[1].prices[1].amount, 9900);
    }

    #[test]
    fn plans_keep_the_cheapest_first_ordering() {
        let plans = group_pricing_rows(vec![
            row("free", "price_free_month", "month", 0),
            row("tier_1", "price_tier_1_month", "month", 990),
            row("tier_2", "price_tier_2_month", "month", 1990),
        ]);

        let ids: Vec<&str> = plans.iter().map(|plan| plan.id.as_str()).collect();
        assert_eq!(ids, ["free", "tier_1", "tier_2"]);
    }
}
