use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use common::error::AppError;

/// The three product tiers. The codes double as the billing provider's
/// product ids, which is what lets webhook payloads be mapped back onto
/// local tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierId {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "tier_1")]
    Tier1,
    #[serde(rename = "tier_2")]
    Tier2,
}

impl TierId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierId::Free => "free",
            TierId::Tier1 => "tier_1",
            TierId::Tier2 => "tier_2",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(TierId::Free),
            "tier_1" => Ok(TierId::Tier1),
            "tier_2" => Ok(TierId::Tier2),
            other => Err(AppError::validation(
                format!("Unknown tier id: {other}"),
                "tier",
            )),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub features_list: Vec<String>,
}

/// Per-tier usage threshold. `max_number_of_notes` is NULL for the
/// unlimited tier.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimit {
    pub id: String,
    pub max_number_of_notes: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ids_round_trip_through_their_codes() {
        for tier in [TierId::Free, TierId::Tier1, TierId::Tier2] {
            assert_eq!(tier.as_str().parse::<TierId>().unwrap(), tier);
        }
    }

    #[test]
    fn unknown_product_ids_are_rejected() {
        assert!("tier_3".parse::<TierId>().is_err());
        assert!("prod_123".parse::<TierId>().is_err());
    }

    #[test]
    fn tier_ids_serialize_as_their_codes() {
        assert_eq!(
            serde_json::to_value(TierId::Tier1).unwrap(),
            serde_json::json!("tier_1")
        );
    }
}
