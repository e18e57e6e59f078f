//! The single struct owning all core mutable state, per SPEC_FULL.md #9's
//! "Global mutable state" note: assets, markets, balances, cache, the
//! shutdown flag, and the order-id counter all live here and are passed
//! explicitly rather than reached for as ambient singletons.

use crate::asset::AssetRegistry;
use crate::balance::BalanceLedger;
use crate::config::EngineSettings;
use crate::market::types::OrderId;
use crate::market::MarketRegistry;
use crate::sinks::ExternalSinks;

pub struct EngineContext<S: ExternalSinks> {
    pub assets: AssetRegistry,
    pub markets: MarketRegistry,
    pub balances: BalanceLedger,
    pub settings: EngineSettings,
    pub sinks: S,
    next_order_id: OrderId,
    /// Set on shutdown signal; gates mutation so a final snapshot can be
    /// written before exit (SPEC_FULL.md #5).
    pub signal_block: bool,
}

impl<S: ExternalSinks> EngineContext<S> {
    pub fn new(settings: EngineSettings, sinks: S) -> Self {
        Self {
            assets: AssetRegistry::new(),
            markets: MarketRegistry::new(),
            balances: BalanceLedger::new(),
            settings,
            sinks,
            next_order_id: 1,
            signal_block: false,
        }
    }

    /// Every mutating command is gated on this before touching state, per
    /// SPEC_FULL.md #4.7.
    pub fn is_service_available(&self) -> bool {
        !(self.sinks.is_operlog_block()
            || self.sinks.is_history_block()
            || self.sinks.is_message_block()
            || self.signal_block)
    }

    pub fn next_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// Resume monotonic id allocation after a host replays operlog/history
    /// on startup. See SPEC_FULL.md #9's Open Question on id monotonicity
    /// across restarts.
    pub fn restore_next_order_id(&mut self, last_seen_id: OrderId) {
        self.next_order_id = self.next_order_id.max(last_seen_id + 1);
    }
}
