use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, Result};

/// Parameters needed to register a security, as read from a listings file.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Listing {
    pub symbol: String,
    pub last_dividend: f64,
    pub par_value: f64,
    #[serde(default)]
    pub fixed_dividend: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl Listing {
    pub fn new(symbol: impl Into<String>, last_dividend: f64, par_value: f64) -> Self {
        Self {
            symbol: symbol.into(),
            last_dividend,
            par_value,
            fixed_dividend: 0.0,
            price: None,
        }
    }

    pub fn preferred(
        symbol: impl Into<String>,
        last_dividend: f64,
        par_value: f64,
        fixed_dividend: f64,
    ) -> Self {
        Self {
            fixed_dividend,
            ..Self::new(symbol, last_dividend, par_value)
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// The five Global Beverage Corporation Exchange securities.
    pub fn gbce_sample() -> Vec<Listing> {
        vec![
            Listing::new("TEA", 0.0, 100.0),
            Listing::new("POP", 8.0, 100.0),
            Listing::new("ALE", 23.0, 60.0),
            Listing::preferred("GIN", 8.0, 100.0, 2.0 / 100.0),
            Listing::new("JOE", 13.0, 250.0),
        ]
    }
}

/// Parses a JSON array of listings.
pub fn load_listings(json: &str) -> Result<Vec<Listing>> {
    serde_json::from_str(json).map_err(|err| ExchangeError::InvalidListing {
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{load_listings, Listing};
    use crate::error::ExchangeError;

    #[test]
    fn test_that_optional_fields_default() {
        let json = r#"[
            {"symbol": "TEA", "last_dividend": 0.0, "par_value": 100.0},
            {"symbol": "GIN", "last_dividend": 8.0, "par_value": 100.0, "fixed_dividend": 0.02, "price": 10.0}
        ]"#;
        let listings = load_listings(json).unwrap();
        assert_eq!(listings[0], Listing::new("TEA", 0.0, 100.0));
        assert_eq!(
            listings[1],
            Listing::preferred("GIN", 8.0, 100.0, 0.02).with_price(10.0)
        );
    }

    #[test]
    fn test_that_malformed_listings_are_rejected() {
        let res = load_listings(r#"[{"symbol": "TEA"}]"#);
        assert!(matches!(res, Err(ExchangeError::InvalidListing { .. })));
    }

    #[test]
    fn test_that_sample_has_one_preferred_security() {
        let sample = Listing::gbce_sample();
        assert_eq!(sample.len(), 5);
        let preferred: Vec<&Listing> = sample.iter().filter(|l| l.fixed_dividend > 0.0).collect();
        assert_eq!(preferred.len(), 1);
        assert_eq!(preferred[0].symbol, "GIN");
    }
}
