//! Market registry and metadata.
//!
//! A `Market` pairs a `stock`/`money` asset with trading parameters and owns
//! its `OrderBook`. Grounded on the teacher's `Orderbook::symbol` plus the
//! `FeeConfig`/market-parameter fields spread across
//! `services/matching/types.rs`, consolidated per SPEC_FULL.md #3's `Market`
//! data model (min_amount, min_total, init/last/closing price, include_fee,
//! delisting_ts).

pub mod book;
pub mod depth;
pub mod engine;
pub mod types;

use crate::decimal::Dec;
use crate::error::EngineError;
use book::OrderBook;
use depth::DepthCache;
use std::collections::BTreeMap;

#[derive(Debug, Clone, serde::Serialize)]
pub struct MarketConfig {
    pub symbol: String,
    pub name: String,
    pub stock: String,
    pub money: String,
    pub stock_prec: u32,
    pub money_prec: u32,
    pub fee_prec: u32,
    pub min_amount: Dec,
    pub min_total: Dec,
    pub init_price: Dec,
    pub include_fee: bool,
    pub delisting_ts: u32,
}

pub struct Market {
    pub config: MarketConfig,
    pub last_price: Dec,
    pub closing_price: Dec,
    pub book: OrderBook,
    pub depth_cache: DepthCache,
}

impl Market {
    pub fn new(config: MarketConfig) -> Self {
        let init_price = config.init_price;
        Self {
            config,
            last_price: init_price,
            closing_price: Dec::ZERO,
            book: OrderBook::new(),
            depth_cache: DepthCache::new(),
        }
    }

    pub fn detail(&self) -> MarketDetail {
        MarketDetail {
            config: self.config.clone(),
            last_price: self.last_price,
            closing_price: self.closing_price,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MarketDetail {
    #[serde(flatten)]
    pub config: MarketConfig,
    pub last_price: Dec,
    pub closing_price: Dec,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MarketSummary {
    pub name: String,
    pub ask_count: u64,
    pub ask_amount: Dec,
    pub bid_count: u64,
    pub bid_amount: Dec,
}

#[derive(Default)]
pub struct MarketRegistry {
    markets: BTreeMap<String, Market>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: MarketConfig) -> Result<(), EngineError> {
        if self.markets.contains_key(&config.symbol) {
            return Err(EngineError::Invalid(format!("market already exists: {}", config.symbol)));
        }
        self.markets.insert(config.symbol.clone(), Market::new(config));
        Ok(())
    }

    pub fn get(&self, symbol: &str) -> Option<&Market> {
        self.markets.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut Market> {
        self.markets.get_mut(symbol)
    }

    pub fn require(&self, symbol: &str) -> Result<&Market, EngineError> {
        self.get(symbol).ok_or_else(|| EngineError::Invalid(format!("unknown market: {symbol}")))
    }

    pub fn require_mut(&mut self, symbol: &str) -> Result<&mut Market, EngineError> {
        self.get_mut(symbol).ok_or_else(|| EngineError::Invalid(format!("unknown market: {symbol}")))
    }

    pub fn list(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(symbol: &str) -> MarketConfig {
        MarketConfig {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            stock: "BTC".into(),
            money: "USD".into(),
            stock_prec: 8,
            money_prec: 2,
            fee_prec: 4,
            min_amount: Dec::ZERO,
            min_total: Dec::ZERO,
            init_price: Dec::from_decimal(rust_decimal::Decimal::new(10000, 0)),
            include_fee: false,
            delisting_ts: 0,
        }
    }

    #[test]
    fn register_then_detail_reflects_config() {
        let mut reg = MarketRegistry::new();
        reg.register(cfg("BTCUSD")).unwrap();
        let detail = reg.require("BTCUSD").unwrap().detail();
        assert_eq!(detail.config.symbol, "BTCUSD");
        assert_eq!(detail.last_price, detail.config.init_price);
    }

    #[test]
    fn register_rejects_duplicate() {
        let mut reg = MarketRegistry::new();
        reg.register(cfg("BTCUSD")).unwrap();
        assert!(reg.register(cfg("BTCUSD")).is_err());
    }
}
