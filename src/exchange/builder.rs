use time::Duration;

use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::DEFAULT_WINDOW;
use crate::listing::Listing;

use super::Exchange;

/// Used to build [Exchange].
///
/// Defaults to the system clock, the fifteen minute retention window and no listings.
pub struct ExchangeBuilder {
    clock: Option<Clock>,
    window: Option<Duration>,
    listings: Vec<Listing>,
}

impl ExchangeBuilder {
    pub fn build(&mut self) -> Result<Exchange> {
        let clock = self.clock.clone().unwrap_or_default();
        let window = self.window.unwrap_or(DEFAULT_WINDOW);
        let mut exchange = Exchange::from_parts(clock, window);

        for listing in &self.listings {
            exchange.add_security(
                listing.symbol.clone(),
                listing.last_dividend,
                listing.par_value,
                listing.fixed_dividend,
            )?;
            if let Some(price) = listing.price {
                exchange.set_price(&listing.symbol, price)?;
            }
        }
        Ok(exchange)
    }

    pub fn with_clock(&mut self, clock: Clock) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_window(&mut self, window: Duration) -> &mut Self {
        self.window = Some(window);
        self
    }

    pub fn with_listings(&mut self, listings: Vec<Listing>) -> &mut Self {
        self.listings.extend(listings);
        self
    }

    pub fn new() -> Self {
        Self {
            clock: None,
            window: None,
            listings: Vec::new(),
        }
    }
}

impl Default for ExchangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::ExchangeBuilder;
    use crate::clock::Clock;
    use crate::error::ExchangeError;
    use crate::listing::Listing;

    #[test]
    fn test_that_listings_are_registered_with_prices() {
        let exchange = ExchangeBuilder::new()
            .with_clock(Clock::manual(0))
            .with_window(Duration::seconds(5))
            .with_listings(vec![
                Listing::new("TEA", 0.0, 100.0).with_price(12.0),
                Listing::new("POP", 8.0, 100.0),
            ])
            .build()
            .unwrap();

        assert_eq!(exchange.len(), 2);
        assert_eq!(exchange.get_price("TEA").unwrap(), 12.0);
        assert_eq!(exchange.get_price("POP").unwrap(), 0.0);
        assert_eq!(exchange.get("POP").unwrap().window(), Duration::seconds(5));
    }

    #[test]
    fn test_that_duplicate_listing_fails_build() {
        let res = ExchangeBuilder::new()
            .with_listings(vec![
                Listing::new("TEA", 0.0, 100.0),
                Listing::new("TEA", 1.0, 100.0),
            ])
            .build();
        assert_eq!(
            res.unwrap_err(),
            ExchangeError::AlreadyExists {
                symbol: "TEA".to_string()
            }
        );
    }

    #[test]
    fn test_that_invalid_listing_fails_build() {
        let res = ExchangeBuilder::new()
            .with_listings(vec![Listing::new("TEA", -1.0, 100.0)])
            .build();
        assert_eq!(res.unwrap_err(), ExchangeError::NegativeValue);
    }
}
