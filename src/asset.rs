//! Asset registry: the catalog of tradable assets.
//!
//! Grounded on the balance-ledger's own notion of an asset symbol
//! (`models/balance.rs`'s `token: String` field) generalized into a proper
//! registry with storage/display precision and tick size, per SPEC_FULL.md
//! #4.2.

use crate::decimal::Dec;
use crate::error::{EngineError, EngineResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Asset {
    pub id: u32,
    pub symbol: String,
    pub name: String,
    pub prec_save: u32,
    pub prec_show: u32,
    pub tick_size: Dec,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<String, Asset>,
    next_id: u32,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self { assets: BTreeMap::new(), next_id: 0 }
    }

    pub fn register(
        &mut self,
        symbol: &str,
        name: &str,
        prec_save: u32,
        prec_show: u32,
        tick_size_str: &str,
    ) -> EngineResult<()> {
        if self.assets.contains_key(symbol) {
            return Err(EngineError::Invalid(format!("asset already exists: {symbol}")));
        }
        if prec_show > prec_save {
            return Err(EngineError::Invalid("prec_show must be <= prec_save".into()));
        }
        let tick_size = Dec::parse(tick_size_str, prec_save)
            .map_err(|e| EngineError::Invalid(e.to_string()))?;
        if !tick_size.is_positive() {
            return Err(EngineError::Invalid("tick_size must be > 0".into()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.assets.insert(
            symbol.to_string(),
            Asset {
                id,
                symbol: symbol.to_string(),
                name: name.to_string(),
                prec_save,
                prec_show,
                tick_size,
            },
        );
        Ok(())
    }

    pub fn exist(&self, symbol: &str) -> bool {
        self.assets.contains_key(symbol)
    }

    /// The asset's stable integer id, or `-1` if it isn't registered.
    pub fn id(&self, symbol: &str) -> i64 {
        self.assets.get(symbol).map(|a| a.id as i64).unwrap_or(-1)
    }

    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.assets.get(symbol)
    }

    pub fn prec(&self, symbol: &str) -> Option<u32> {
        self.assets.get(symbol).map(|a| a.prec_save)
    }

    pub fn prec_show(&self, symbol: &str) -> Option<u32> {
        self.assets.get(symbol).map(|a| a.prec_show)
    }

    pub fn tick_size(&self, symbol: &str) -> Option<Dec> {
        self.assets.get(symbol).map(|a| a.tick_size)
    }

    pub fn list(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicate_symbol() {
        let mut reg = AssetRegistry::new();
        reg.register("BTC", "Bitcoin", 8, 8, "0.00000001").unwrap();
        let err = reg.register("BTC", "Bitcoin", 8, 8, "0.00000001").unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn register_rejects_non_positive_tick() {
        let mut reg = AssetRegistry::new();
        assert!(reg.register("BTC", "Bitcoin", 8, 8, "0").is_err());
    }

    #[test]
    fn register_then_list_contains_new_asset() {
        let mut reg = AssetRegistry::new();
        reg.register("USD", "US Dollar", 2, 2, "0.01").unwrap();
        let found = reg.list().find(|a| a.symbol == "USD").unwrap();
        assert_eq!(found.prec_save, 2);
    }

    #[test]
    fn id_assigns_stable_increasing_ids_and_reports_missing_as_negative_one() {
        let mut reg = AssetRegistry::new();
        reg.register("BTC", "Bitcoin", 8, 8, "0.00000001").unwrap();
        reg.register("USD", "US Dollar", 2, 2, "0.01").unwrap();
        assert_eq!(reg.id("BTC"), 0);
        assert_eq!(reg.id("USD"), 1);
        assert_eq!(reg.id("ETH"), -1);
    }
}
