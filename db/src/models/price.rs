use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use common::error::AppError;

/// Currencies the catalog is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "usd")]
    Usd,
    #[serde(rename = "eur")]
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usd" => Ok(Currency::Usd),
            "eur" => Ok(Currency::Eur),
            other => Err(AppError::validation(
                format!("Unsupported currency: {other}"),
                "price",
            )),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Price {
    pub id: String,
    pub tier_id: String,
    pub interval: String,
}

/// One row of the pricing page query: a tier joined with one of its
/// prices in the requested currency.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PricingRow {
    pub tier_id: String,
    pub tier_name: String,
    pub tier_description: Option<String>,
    pub features_list: Vec<String>,
    pub max_number_of_notes: Option<i32>,
    pub price_id: String,
    pub interval: String,
    pub currency: String,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currencies_round_trip_through_their_codes() {
        for currency in [Currency::Usd, Currency::Eur] {
            assert_eq!(currency.as_str().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn unsupported_currencies_are_rejected() {
        assert!("gbp".parse::<Currency>().is_err());
        assert!("USD".parse::<Currency>().is_err());
    }
}
