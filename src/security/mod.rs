//! A listed security and the per-security figures derived from it.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::clock::Clock;
use crate::error::{ExchangeError, Result};
use crate::ledger::{TradeLedger, TradeSide};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum SecurityKind {
    Common,
    Preferred,
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityKind::Common => write!(f, "Common"),
            SecurityKind::Preferred => write!(f, "Preferred"),
        }
    }
}

fn non_negative(value: f64) -> Result<f64> {
    if value < 0.0 {
        return Err(ExchangeError::NegativeValue);
    }
    Ok(value)
}

/// Point-in-time view of a [Security], used for dumps.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SecuritySnapshot {
    pub symbol: String,
    pub kind: SecurityKind,
    pub last_dividend: f64,
    pub par_value: f64,
    pub fixed_dividend: f64,
    pub price: f64,
    pub dividend_yield: f64,
    pub pe_ratio: f64,
    pub trade_count: usize,
    pub stock_price: f64,
}

//Common and preferred securities only differ in the dividend yield formula so there is one type
//and the branch is on `fixed_dividend > 0`.
#[derive(Clone, Debug)]
pub struct Security {
    symbol: String,
    ledger: TradeLedger,
    price: f64,
    last_dividend: f64,
    fixed_dividend: f64,
    par_value: f64,
    //Index contribution cache, see `has_changed`
    previous_exponent: f64,
    previous_price: f64,
    price_pow: f64,
}

impl Security {
    /// Creates a security stamping trades with the system clock.
    pub fn new(
        symbol: impl Into<String>,
        last_dividend: f64,
        par_value: f64,
        fixed_dividend: f64,
    ) -> Result<Self> {
        Self::with_ledger(
            symbol,
            last_dividend,
            par_value,
            fixed_dividend,
            TradeLedger::new(Clock::system()),
        )
    }

    pub fn with_ledger(
        symbol: impl Into<String>,
        last_dividend: f64,
        par_value: f64,
        fixed_dividend: f64,
        ledger: TradeLedger,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(ExchangeError::EmptyIdentifier);
        }
        if last_dividend < 0.0 || par_value < 0.0 || fixed_dividend < 0.0 {
            return Err(ExchangeError::NegativeValue);
        }

        Ok(Self {
            symbol,
            ledger,
            price: 0.0,
            last_dividend,
            fixed_dividend,
            par_value,
            previous_exponent: 0.0,
            previous_price: 0.0,
            price_pow: 0.0,
        })
    }

    /// Common security with no par value or dividend, mostly useful in tests.
    pub fn common(symbol: impl Into<String>) -> Result<Self> {
        Self::new(symbol, 0.0, 0.0, 0.0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_common(&self) -> bool {
        self.fixed_dividend <= 0.0
    }

    pub fn is_preferred(&self) -> bool {
        self.fixed_dividend > 0.0
    }

    pub fn kind(&self) -> SecurityKind {
        if self.is_preferred() {
            SecurityKind::Preferred
        } else {
            SecurityKind::Common
        }
    }

    pub fn set_price(&mut self, price: f64) -> Result<()> {
        self.price = non_negative(price)?;
        Ok(())
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_last_dividend(&mut self, dividend: f64) -> Result<()> {
        self.last_dividend = non_negative(dividend)?;
        Ok(())
    }

    pub fn last_dividend(&self) -> f64 {
        self.last_dividend
    }

    pub fn set_fixed_dividend(&mut self, dividend: f64) -> Result<()> {
        self.fixed_dividend = non_negative(dividend)?;
        Ok(())
    }

    pub fn fixed_dividend(&self) -> f64 {
        self.fixed_dividend
    }

    /// Sets the fixed dividend from a percentage, 2.0 is stored as 0.02.
    pub fn set_fixed_dividend_percentage(&mut self, pct: f64) -> Result<()> {
        self.fixed_dividend = non_negative(pct)? / 100.0;
        Ok(())
    }

    pub fn fixed_dividend_percentage(&self) -> f64 {
        self.fixed_dividend * 100.0
    }

    pub fn par_value(&self) -> f64 {
        self.par_value
    }

    /// Records a trade. `price` is validated but the ledger is always written with the stored
    /// price of the security so that the stored price stays the only source of trade prices.
    pub fn add_trade_at_price(&mut self, quantity: u64, side: TradeSide, price: f64) -> Result<()> {
        non_negative(price)?;
        self.ledger.add_trade(quantity, side, self.price);
        Ok(())
    }

    /// Records a trade at the stored price.
    pub fn add_trade(&mut self, quantity: u64, side: TradeSide) -> Result<()> {
        let price = non_negative(self.price)?;
        self.add_trade_at_price(quantity, side, price)
    }

    pub fn stock_price(&self) -> f64 {
        self.ledger.windowed_price()
    }

    pub fn stock_price_and_clear(&mut self) -> f64 {
        self.ledger.windowed_price_then_evict()
    }

    pub fn evict_stale_trades(&mut self) {
        self.ledger.evict_stale();
    }

    pub fn clear_trades(&mut self) {
        self.ledger.clear();
    }

    pub fn set_window(&mut self, window: Duration) {
        self.ledger.set_window(window);
    }

    pub fn window(&self) -> Duration {
        self.ledger.window()
    }

    pub fn trade_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Negative ticker prices are rejected. A zero ticker price is left to float division and
    /// produces infinity or NaN.
    pub fn dividend_yield_at(&self, ticker_price: f64) -> Result<f64> {
        if ticker_price < 0.0 {
            return Err(ExchangeError::InvalidDenominator);
        }

        if self.is_common() {
            Ok(self.last_dividend / ticker_price)
        } else {
            Ok((self.fixed_dividend * self.par_value) / ticker_price)
        }
    }

    pub fn dividend_yield(&self) -> Result<f64> {
        self.dividend_yield_at(self.price)
    }

    /// Infinite when the last dividend is zero.
    pub fn pe_ratio_at(&self, ticker_price: f64) -> Result<f64> {
        //Setters already reject negative dividends
        if self.last_dividend < 0.0 {
            return Err(ExchangeError::InvalidDenominator);
        }
        Ok(ticker_price / self.last_dividend)
    }

    pub fn pe_ratio(&self) -> Result<f64> {
        self.pe_ratio_at(self.price)
    }

    /// Refreshes the cached `price^exponent` if either input moved since the last call.
    ///
    /// Returns true when the cache was recomputed. This mutates the cache, it is not a pure query.
    pub fn has_changed(&mut self, exponent: f64) -> bool {
        let changed = exponent != self.previous_exponent || self.price != self.previous_price;

        if changed {
            self.previous_exponent = exponent;
            self.previous_price = self.price;
            self.price_pow = self.price.powf(exponent);
            debug!(
                "SECURITY: {:?} contribution recomputed as {:?}",
                self.symbol, self.price_pow
            );
        }
        changed
    }

    /// Last value computed by [Security::has_changed]. Stale until that has been called with the
    /// current exponent.
    pub fn cached_contribution(&self) -> f64 {
        self.price_pow
    }

    pub fn snapshot(&self) -> SecuritySnapshot {
        SecuritySnapshot {
            symbol: self.symbol.clone(),
            kind: self.kind(),
            last_dividend: self.last_dividend,
            par_value: self.par_value,
            fixed_dividend: self.fixed_dividend,
            price: self.price,
            //Stored price is never negative so neither of these can fail
            dividend_yield: self.dividend_yield().unwrap_or(f64::NAN),
            pe_ratio: self.pe_ratio().unwrap_or(f64::NAN),
            trade_count: self.trade_count(),
            stock_price: self.stock_price(),
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        writeln!(
            f,
            "{}: {}, last_dividend = {}, par_value = {}, fixed_dividend = {}, price = {}, dividend yield = {}, P/E ratio = {}, number of trades = {}, stock price = {}",
            snapshot.symbol,
            snapshot.kind,
            snapshot.last_dividend,
            snapshot.par_value,
            snapshot.fixed_dividend,
            snapshot.price,
            snapshot.dividend_yield,
            snapshot.pe_ratio,
            snapshot.trade_count,
            snapshot.stock_price
        )
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::{Security, SecurityKind};
    use crate::clock::Clock;
    use crate::error::ExchangeError;
    use crate::ledger::{TradeLedger, TradeSide};

    fn manual(symbol: &str, last_dividend: f64, par_value: f64, fixed: f64) -> (Clock, Security) {
        let clock = Clock::manual(1_000_000);
        let security = Security::with_ledger(
            symbol,
            last_dividend,
            par_value,
            fixed,
            TradeLedger::new(clock.clone()),
        )
        .unwrap();
        (clock, security)
    }

    #[test]
    fn test_that_common_dividend_yield_uses_last_dividend() {
        let mut common = Security::new("ALE", 23.0, 60.0, 0.0).unwrap();
        assert!(common.is_common());
        assert!(!common.is_preferred());

        common.set_price(10.0).unwrap();
        let dividend_yield = common.dividend_yield().unwrap();
        assert!(dividend_yield >= 2.29);
        assert!(dividend_yield <= 2.31);
    }

    #[test]
    fn test_that_preferred_dividend_yield_uses_fixed_dividend_and_par() {
        let mut preferred = Security::new("GIN", 8.0, 100.0, 2.0 / 100.0).unwrap();
        assert!(preferred.is_preferred());
        assert_eq!(preferred.kind(), SecurityKind::Preferred);

        preferred.set_price(10.0).unwrap();
        let dividend_yield = preferred.dividend_yield().unwrap();
        assert!(dividend_yield >= 0.19999);
        assert!(dividend_yield <= 0.20001);
    }

    #[test]
    fn test_that_pe_ratio_divides_price_by_dividend() {
        let mut security = Security::new("JOE", 13.0, 250.0, 0.0).unwrap();
        security.set_price(10.0).unwrap();
        let ratio = security.pe_ratio().unwrap();
        assert!(ratio >= 0.769230);
        assert!(ratio <= 0.769232);
    }

    #[test]
    fn test_that_pe_ratio_with_zero_dividend_is_infinite() {
        let mut security = Security::new("TEA", 0.0, 100.0, 0.0).unwrap();
        security.set_price(10.0).unwrap();
        let ratio = security.pe_ratio().unwrap();
        assert!(ratio.is_infinite());
        assert!(ratio.is_sign_positive());
    }

    #[test]
    fn test_that_zero_ticker_price_is_not_rejected() {
        let security = Security::new("ALE", 23.0, 60.0, 0.0).unwrap();
        assert!(security.dividend_yield_at(0.0).unwrap().is_infinite());

        let empty = Security::common("TEA").unwrap();
        assert!(empty.dividend_yield_at(0.0).unwrap().is_nan());
    }

    #[test]
    fn test_that_negative_ticker_price_is_invalid_denominator() {
        let security = Security::new("ALE", 23.0, 60.0, 0.0).unwrap();
        assert_eq!(
            security.dividend_yield_at(-1.0),
            Err(ExchangeError::InvalidDenominator)
        );
    }

    #[test]
    fn test_that_construction_validates_inputs() {
        assert_eq!(
            Security::new("", 1.0, 1.0, 0.0).unwrap_err(),
            ExchangeError::EmptyIdentifier
        );
        assert_eq!(
            Security::new("ABC", -1.0, 1.0, 0.0).unwrap_err(),
            ExchangeError::NegativeValue
        );
        assert_eq!(
            Security::new("ABC", 1.0, -1.0, 0.0).unwrap_err(),
            ExchangeError::NegativeValue
        );
        assert_eq!(
            Security::new("ABC", 1.0, 1.0, -0.5).unwrap_err(),
            ExchangeError::NegativeValue
        );
    }

    #[test]
    fn test_that_setters_reject_negative_values() {
        let mut security = Security::common("ABC").unwrap();
        assert_eq!(security.set_price(-0.1), Err(ExchangeError::NegativeValue));
        assert_eq!(
            security.set_last_dividend(-0.1),
            Err(ExchangeError::NegativeValue)
        );
        assert_eq!(
            security.set_fixed_dividend(-0.1),
            Err(ExchangeError::NegativeValue)
        );
        assert_eq!(
            security.set_fixed_dividend_percentage(-0.1),
            Err(ExchangeError::NegativeValue)
        );
        //Failed setters leave state untouched
        assert_eq!(security.price(), 0.0);
        assert!(security.is_common());
    }

    #[test]
    fn test_that_fixed_dividend_percentage_is_stored_as_fraction() {
        let mut security = Security::common("GIN").unwrap();
        security.set_fixed_dividend_percentage(2.0).unwrap();
        assert!((security.fixed_dividend() - 0.02).abs() < 1e-12);
        assert!((security.fixed_dividend_percentage() - 2.0).abs() < 1e-12);
        assert!(security.is_preferred());
    }

    #[test]
    fn test_that_trade_is_recorded_at_stored_price() {
        let (_clock, mut security) = manual("ABC", 1.0, 1.0, 0.0);
        security.set_price(42.0).unwrap();
        security.add_trade_at_price(10, TradeSide::Buy, 99.0).unwrap();
        assert_eq!(security.stock_price(), 42.0);

        let trade = security.ledger().trades().next().unwrap();
        assert_eq!(trade.price, 42.0);
    }

    #[test]
    fn test_that_trade_with_negative_price_is_rejected() {
        let (_clock, mut security) = manual("ABC", 1.0, 1.0, 0.0);
        assert_eq!(
            security.add_trade_at_price(10, TradeSide::Buy, -1.0),
            Err(ExchangeError::NegativeValue)
        );
        assert_eq!(security.trade_count(), 0);
    }

    #[test]
    fn test_that_window_operations_reach_the_ledger() {
        let (clock, mut security) = manual("ABC", 1.0, 1.0, 0.0);
        security.set_window(Duration::seconds(5));
        security.set_price(10.0).unwrap();
        security.add_trade(10, TradeSide::Buy).unwrap();
        clock.advance(Duration::seconds(3));
        security.set_price(20.0).unwrap();
        security.add_trade(30, TradeSide::Sell).unwrap();
        assert_eq!(security.stock_price(), 17.5);

        clock.advance(Duration::seconds(2));
        assert_eq!(security.stock_price_and_clear(), 20.0);
        assert_eq!(security.trade_count(), 1);

        security.clear_trades();
        assert_eq!(security.trade_count(), 0);
        assert_eq!(security.stock_price(), 0.0);
    }

    #[test]
    fn test_that_has_changed_fires_once_per_input_pair() {
        let mut security = Security::common("ABC").unwrap();
        security.set_price(16.0).unwrap();

        assert!(security.has_changed(0.5));
        assert!((security.cached_contribution() - 4.0).abs() < 1e-12);
        assert!(!security.has_changed(0.5));

        assert!(security.has_changed(0.25));
        assert!((security.cached_contribution() - 2.0).abs() < 1e-12);
        assert!(!security.has_changed(0.25));

        security.set_price(81.0).unwrap();
        assert!(security.has_changed(0.25));
        assert!((security.cached_contribution() - 3.0).abs() < 1e-12);
        assert!(!security.has_changed(0.25));
    }

    #[test]
    fn test_that_display_lists_derived_figures() {
        let mut security = Security::new("ALE", 23.0, 60.0, 0.0).unwrap();
        security.set_price(10.0).unwrap();
        let dump = security.to_string();
        assert!(dump.starts_with("ALE: Common"));
        assert!(dump.contains("dividend yield = 2.3"));
        assert!(dump.contains("number of trades = 0"));
    }
}
