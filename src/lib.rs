//! # What is gbce?
//!
//! gbce models the Global Beverage Corporation Exchange: a small stock exchange that keeps the
//! recent trades and the current price of each listed security, and derives the dividend yield,
//! P/E ratio, volume-weighted stock price and the all-share index from them.
//!
//! # Implementation
//!
//! - A [TradeLedger](crate::ledger::TradeLedger) holds the trades of one security ordered by
//! timestamp. The stock price is the volume-weighted average over a trailing window, fifteen
//! minutes unless configured otherwise, and trades older than the window can be evicted at any
//! time.
//! - A [Security](crate::security::Security) owns one ledger plus its dividend parameters. Common
//! and preferred securities share a type: a positive fixed dividend makes a security preferred.
//! - The [Exchange](crate::exchange::Exchange) owns every security keyed by symbol. Lookups for
//! unknown symbols fail with [NotFound](crate::error::ExchangeError::NotFound). The all-share
//! index is the geometric mean of all prices, cached per security and on the exchange so that
//! repeated calls with unchanged prices don't redo the exponentiation.
//!
//! Timestamps come from an injected [Clock](crate::clock::Clock). Tests drive a manual clock
//! instead of sleeping.
//!
//! Nothing here is synchronized and the exchange is meant to be driven from a single thread. A
//! manual clock is reference-counted with [Rc](std::rc::Rc) which keeps the exchange `!Send`.
//!
//! ```
//! use gbce::exchange::ExchangeBuilder;
//! use gbce::ledger::TradeSide;
//! use gbce::listing::Listing;
//!
//! let mut exchange = ExchangeBuilder::new()
//!     .with_listings(Listing::gbce_sample())
//!     .build()
//!     .unwrap();
//! exchange.set_price("ALE", 10.0).unwrap();
//! exchange.add_trade("ALE", 100, TradeSide::Buy).unwrap();
//! assert_eq!(exchange.stock_price("ALE").unwrap(), 10.0);
//! ```
pub mod clock;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod listing;
pub mod security;
