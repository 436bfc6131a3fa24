//! Time-ordered trade records for a single security.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use log::debug;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::clock::{Clock, DateTime};

/// Retention used when nothing else is configured.
pub const DEFAULT_WINDOW: Duration = Duration::minutes(15);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl From<bool> for TradeSide {
    //Legacy indicator: false is a buy, true is a sell
    fn from(is_sell: bool) -> Self {
        if is_sell {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    pub date: DateTime,
    pub quantity: u64,
    pub side: TradeSide,
    pub price: f64,
}

impl TradeRecord {
    fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quantity = {}, side = {}, price = {}",
            self.quantity, self.side, self.price
        )
    }
}

/// Trades for one security ordered by timestamp.
///
/// Records sharing a timestamp are kept in insertion order. A record counts towards
/// [TradeLedger::windowed_price] while its age is strictly less than the window and is removed by
/// [TradeLedger::evict_stale] once its age reaches the window. Records are never modified after
/// they are inserted.
///
/// Inputs are not validated here, the owning security does that before calling in.
#[derive(Clone, Debug)]
pub struct TradeLedger {
    inner: BTreeMap<DateTime, Vec<TradeRecord>>,
    window: Duration,
    clock: Clock,
    len: usize,
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(Clock::system())
    }
}

impl TradeLedger {
    pub fn new(clock: Clock) -> Self {
        Self::with_window(clock, DEFAULT_WINDOW)
    }

    pub fn with_window(clock: Clock, window: Duration) -> Self {
        Self {
            inner: BTreeMap::new(),
            window,
            clock,
            len: 0,
        }
    }

    pub fn add_trade(&mut self, quantity: u64, side: TradeSide, price: f64) {
        let date = self.clock.now();
        self.inner.entry(date).or_default().push(TradeRecord {
            date,
            quantity,
            side,
            price,
        });
        self.len += 1;
    }

    //Every key strictly after the cutoff is younger than the window. Returns None when the cutoff
    //underflows, in which case nothing can be stale.
    fn cutoff(&self) -> Option<DateTime> {
        self.clock.now().checked_sub(self.window)
    }

    fn live(&self) -> impl Iterator<Item = &TradeRecord> {
        let lower = match self.cutoff() {
            Some(cutoff) => Bound::Excluded(cutoff),
            None => Bound::Unbounded,
        };
        self.inner
            .range((lower, Bound::Unbounded))
            .flat_map(|(_date, records)| records.iter())
    }

    /// Volume-weighted average price of the trades inside the window.
    ///
    /// Returns 0.0 when the ledger is empty, when the traded quantity inside the window is zero,
    /// or when the traded notional is not positive.
    pub fn windowed_price(&self) -> f64 {
        if self.inner.is_empty() {
            return 0.0;
        }

        let mut notional = 0.0;
        let mut quantity = 0.0;
        for record in self.live() {
            notional += record.notional();
            quantity += record.quantity as f64;
        }

        if quantity <= 0.0 {
            return 0.0;
        }
        if notional <= 0.0 {
            return 0.0;
        }
        notional / quantity
    }

    /// Drops every record whose age has reached the window.
    pub fn evict_stale(&mut self) {
        if self.inner.is_empty() {
            return;
        }
        let Some(cutoff) = self.cutoff() else {
            return;
        };

        let live = match cutoff.checked_add(1) {
            Some(first_live) => self.inner.split_off(&DateTime::from(first_live)),
            None => BTreeMap::new(),
        };
        let stale = std::mem::replace(&mut self.inner, live);
        let removed: usize = stale.values().map(Vec::len).sum();
        self.len -= removed;
        if removed > 0 {
            debug!("LEDGER: Evicted {:?} stale trades, {:?} remain", removed, self.len);
        }
    }

    pub fn windowed_price_then_evict(&mut self) -> f64 {
        let price = self.windowed_price();
        self.evict_stale();
        price
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All records, stale or not, oldest first.
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.inner.values().flat_map(|records| records.iter())
    }
}

impl fmt::Display for TradeLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.trades() {
            writeln!(f, "{} {}", record.date, record)?;
        }
        Ok(())
    }
}
