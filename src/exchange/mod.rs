//! The exchange: every listed security keyed by symbol, plus the all-share index.

mod builder;

pub use builder::ExchangeBuilder;

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info, warn};
use time::Duration;

use crate::clock::Clock;
use crate::error::{ExchangeError, Result};
use crate::ledger::{TradeLedger, TradeSide, DEFAULT_WINDOW};
use crate::security::{Security, SecuritySnapshot};

fn not_found(symbol: &str) -> ExchangeError {
    warn!("EXCHANGE: Security {:?} not found", symbol);
    ExchangeError::NotFound {
        symbol: symbol.to_string(),
    }
}

/// Owns every [Security] listed on the exchange, iterated in symbol order.
///
/// Every operation addressed by symbol either reaches an existing security or fails with
/// [ExchangeError::NotFound]. Securities can't be removed once listed and listing a symbol twice
/// fails with [ExchangeError::AlreadyExists], so trade history is never overwritten.
///
/// [Exchange] contains no synchronization. The index cache and the per-security caches are plain
/// fields mutated by [Exchange::share_index], and the clock can hold an [std::rc::Rc], so an
/// exchange stays on the thread that created it.
#[derive(Debug)]
pub struct Exchange {
    securities: BTreeMap<String, Security>,
    clock: Clock,
    window: Duration,
    cached_index: f64,
    recomputations: u64,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    pub fn new() -> Self {
        Self::from_parts(Clock::system(), DEFAULT_WINDOW)
    }

    pub(crate) fn from_parts(clock: Clock, window: Duration) -> Self {
        Self {
            securities: BTreeMap::new(),
            clock,
            window,
            cached_index: 0.0,
            recomputations: 0,
        }
    }

    fn security(&self, symbol: &str) -> Result<&Security> {
        self.securities.get(symbol).ok_or_else(|| not_found(symbol))
    }

    fn security_mut(&mut self, symbol: &str) -> Result<&mut Security> {
        self.securities
            .get_mut(symbol)
            .ok_or_else(|| not_found(symbol))
    }

    /// Lists a new security. Its ledger shares the exchange clock and starts with the exchange
    /// retention window.
    pub fn add_security(
        &mut self,
        symbol: impl Into<String>,
        last_dividend: f64,
        par_value: f64,
        fixed_dividend: f64,
    ) -> Result<()> {
        let symbol = symbol.into();
        if self.securities.contains_key(&symbol) {
            return Err(ExchangeError::AlreadyExists { symbol });
        }

        let ledger = TradeLedger::with_window(self.clock.clone(), self.window);
        let security = Security::with_ledger(
            symbol.clone(),
            last_dividend,
            par_value,
            fixed_dividend,
            ledger,
        )?;
        info!("EXCHANGE: Listed {:?} as {}", symbol, security.kind());
        self.securities.insert(symbol, security);
        Ok(())
    }

    pub fn set_price(&mut self, symbol: &str, price: f64) -> Result<()> {
        self.security_mut(symbol)?.set_price(price)?;
        debug!("EXCHANGE: Price of {:?} set to {:?}", symbol, price);
        Ok(())
    }

    pub fn get_price(&self, symbol: &str) -> Result<f64> {
        Ok(self.security(symbol)?.price())
    }

    /// Records a trade at the stored price of the security.
    pub fn add_trade(&mut self, symbol: &str, quantity: u64, side: TradeSide) -> Result<()> {
        self.security_mut(symbol)?.add_trade(quantity, side)
    }

    /// `price` is validated, the trade is still recorded at the stored price.
    pub fn add_trade_at_price(
        &mut self,
        symbol: &str,
        quantity: u64,
        side: TradeSide,
        price: f64,
    ) -> Result<()> {
        self.security_mut(symbol)?
            .add_trade_at_price(quantity, side, price)
    }

    pub fn stock_price(&self, symbol: &str) -> Result<f64> {
        Ok(self.security(symbol)?.stock_price())
    }

    pub fn stock_price_and_clear(&mut self, symbol: &str) -> Result<f64> {
        Ok(self.security_mut(symbol)?.stock_price_and_clear())
    }

    pub fn dividend_yield(&self, symbol: &str) -> Result<f64> {
        self.security(symbol)?.dividend_yield()
    }

    pub fn pe_ratio(&self, symbol: &str) -> Result<f64> {
        self.security(symbol)?.pe_ratio()
    }

    pub fn clear_trades(&mut self, symbol: &str) -> Result<()> {
        self.security_mut(symbol)?.clear_trades();
        Ok(())
    }

    pub fn set_window(&mut self, symbol: &str, window: Duration) -> Result<()> {
        self.security_mut(symbol)?.set_window(window);
        Ok(())
    }

    /// Applies `window` to every listed security and to securities listed afterwards.
    pub fn set_window_all(&mut self, window: Duration) {
        self.window = window;
        for security in self.securities.values_mut() {
            security.set_window(window);
        }
    }

    pub fn evict_stale_trades(&mut self) {
        let before: usize = self.securities.values().map(Security::trade_count).sum();
        for security in self.securities.values_mut() {
            security.evict_stale_trades();
        }
        let after: usize = self.securities.values().map(Security::trade_count).sum();
        info!(
            "EXCHANGE: Evicted {:?} stale trades, {:?} remain",
            before - after,
            after
        );
    }

    /// Geometric mean of the current price of every listed security.
    ///
    /// Each security caches `price^(1/n)` and the product is only refolded when at least one of
    /// those caches moved, otherwise the previous value is returned. Fails with
    /// [ExchangeError::EmptyExchange] if nothing is listed.
    pub fn share_index(&mut self) -> Result<f64> {
        if self.securities.is_empty() {
            return Err(ExchangeError::EmptyExchange);
        }
        let exponent = 1.0 / self.securities.len() as f64;

        //Every security has to see the exponent so no short-circuit here
        let mut changed = false;
        for security in self.securities.values_mut() {
            changed |= security.has_changed(exponent);
        }

        if changed {
            self.cached_index = self
                .securities
                .values()
                .fold(1.0, |product, security| {
                    product * security.cached_contribution()
                });
            self.recomputations += 1;
            debug!("EXCHANGE: Share index recomputed as {:?}", self.cached_index);
        }
        Ok(self.cached_index)
    }

    /// Number of times [Exchange::share_index] has refolded the product.
    pub fn index_recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn get(&self, symbol: &str) -> Result<&Security> {
        self.security(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Result<&mut Security> {
        self.security_mut(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.securities.contains_key(symbol)
    }

    pub fn securities(&self) -> impl Iterator<Item = &Security> {
        self.securities.values()
    }

    pub fn snapshot(&self) -> Vec<SecuritySnapshot> {
        self.securities.values().map(Security::snapshot).collect()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for security in self.securities.values() {
            write!(f, "{security}")?;
        }
        Ok(())
    }
}
