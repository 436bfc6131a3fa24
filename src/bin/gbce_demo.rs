use std::env;
use std::fs;
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::Result;
use gbce::exchange::ExchangeBuilder;
use gbce::ledger::TradeSide;
use gbce::listing::{load_listings, Listing};
use rand::thread_rng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let listings = match args.get(1) {
        Some(path) => load_listings(&fs::read_to_string(path)?)?,
        None => Listing::gbce_sample(),
    };

    let mut exchange = ExchangeBuilder::new()
        .with_window(Duration::seconds(5))
        .with_listings(listings)
        .build()?;

    let price_dist = Uniform::new(0.0, 200.0);
    let quantity_dist = Uniform::new_inclusive(0_u64, 1000);
    let sell_dist = Bernoulli::new(0.25)?;
    let mut rng = thread_rng();

    let symbols: Vec<String> = exchange
        .securities()
        .map(|security| security.symbol().to_string())
        .collect();

    for symbol in &symbols {
        exchange.set_price(symbol, price_dist.sample(&mut rng))?;
    }
    println!();

    for symbol in &symbols {
        exchange.set_price(symbol, price_dist.sample(&mut rng))?;
        let index = exchange.share_index()?;
        println!("{} GBCE All Share Index = {}", exchange.clock().now(), index);

        for _ in 0..10 {
            let side = TradeSide::from(sell_dist.sample(&mut rng));
            exchange.add_trade(symbol, quantity_dist.sample(&mut rng), side)?;
        }
        //Only the trades from the last five seconds count towards the stock price
        thread::sleep(StdDuration::from_millis(500));
    }

    println!();
    exchange.evict_stale_trades();
    println!("{exchange}");
    println!("{}", serde_json::to_string_pretty(&exchange.snapshot())?);
    Ok(())
}
