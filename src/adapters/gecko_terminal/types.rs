//! GeckoTerminal pool response types
//!
//! Only the attributes the scraper reads are modelled; the rest of the
//! JSON:API document is ignored.

use serde::{Deserialize, Deserializer};

use crate::domain::TokenPool;

/// `GET /{network}/pools/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct PoolResponse {
    pub data: PoolData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolData {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub attributes: PoolAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolAttributes {
    #[serde(default)]
    pub address: String,
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub price_in_usd: f64,
    /// e.g. `"12.5%"` or `"-3.1%"`
    #[serde(default)]
    pub price_percent_change: Option<String>,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub reserve_in_usd: Option<f64>,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub fully_diluted_valuation: Option<f64>,
}

impl PoolResponse {
    pub fn into_token_pool(self) -> TokenPool {
        let attributes = self.data.attributes;
        TokenPool {
            pool_name: attributes.name,
            price: attributes.price_in_usd,
            price_change_24h: convert_percentage(attributes.price_percent_change.as_deref()),
        }
    }
}

/// Parse a percent string such as `"-3.25%"`. Missing or unparseable input is 0.
pub fn convert_percentage(raw: Option<&str>) -> f64 {
    raw.map(|s| s.trim().trim_end_matches('%').trim())
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number: {}", s))),
        }
    }
}

/// GeckoTerminal sends most decimals as strings
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_convert_percentage() {
        assert_relative_eq!(convert_percentage(Some("12.5%")), 12.5);
        assert_relative_eq!(convert_percentage(Some("-3.25%")), -3.25);
        assert_relative_eq!(convert_percentage(Some("7")), 7.0);
        assert_relative_eq!(convert_percentage(Some("")), 0.0);
        assert_relative_eq!(convert_percentage(Some("n/a")), 0.0);
        assert_relative_eq!(convert_percentage(None), 0.0);
    }

    #[test]
    fn test_pool_response_to_token_pool() {
        let body = json!({
            "data": {
                "id": "solana_ADpoE7CoikKvvNwG3TFtkXHX3NvwiWtGZ7Zz8rMm2cvd",
                "type": "pool",
                "attributes": {
                    "address": "ADpoE7CoikKvvNwG3TFtkXHX3NvwiWtGZ7Zz8rMm2cvd",
                    "name": "POPCAT / SOL",
                    "price_in_usd": "0.000123",
                    "price_percent_change": "-4.2%",
                    "reserve_in_usd": 15234.5,
                    "fully_diluted_valuation": null
                },
                "relationships": {}
            },
            "included": []
        });

        let response: PoolResponse = serde_json::from_value(body).unwrap();
        assert_relative_eq!(response.data.attributes.reserve_in_usd.unwrap(), 15234.5);
        assert_eq!(response.data.attributes.fully_diluted_valuation, None);

        let pool = response.into_token_pool();
        assert_eq!(pool.pool_name, "POPCAT / SOL");
        assert_relative_eq!(pool.price, 0.000123);
        assert_relative_eq!(pool.price_change_24h, -4.2);
    }

    #[test]
    fn test_numeric_price() {
        let body = json!({
            "data": {
                "id": "p",
                "attributes": { "name": "X / SOL", "price_in_usd": 1.5 }
            }
        });
        let pool = serde_json::from_value::<PoolResponse>(body).unwrap().into_token_pool();
        assert_relative_eq!(pool.price, 1.5);
        assert_relative_eq!(pool.price_change_24h, 0.0);
    }

    #[test]
    fn test_bad_price_rejected() {
        let body = json!({
            "data": { "id": "p", "attributes": { "name": "X", "price_in_usd": "abc" } }
        });
        assert!(serde_json::from_value::<PoolResponse>(body).is_err());
    }
}
