//! Demo binary: wires up an [`EngineContext`], registers a toy market, and
//! runs the cache-purge timer. Socket framing and the actual RPC transport
//! are out of scope (SPEC_FULL.md #1) — this just proves the engine and
//! dispatcher boot end to end the way the teacher's `main.rs` boots its
//! service (tracing init, then `dotenvy`, then config, then the core).

use clob_matching_core::config::EngineSettings;
use clob_matching_core::context::EngineContext;
use clob_matching_core::decimal::Dec;
use clob_matching_core::dispatch::commands::CommandTable;
use clob_matching_core::market::MarketConfig;
use clob_matching_core::sinks::NullSinks;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clob_matching_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let settings = EngineSettings::from_env();

    tracing::info!("starting matching core v{}", env!("CARGO_PKG_VERSION"));

    let mut ctx = EngineContext::new(settings, NullSinks);
    ctx.assets.register("BTC", "Bitcoin", 8, 8, "0.00000001")?;
    ctx.assets.register("USD", "US Dollar", 2, 2, "0.01")?;
    ctx.markets.register(MarketConfig {
        symbol: "BTCUSD".into(),
        name: "BTC/USD".into(),
        stock: "BTC".into(),
        money: "USD".into(),
        stock_prec: 8,
        money_prec: 2,
        fee_prec: 4,
        min_amount: Dec::parse("0.001", 8)?,
        min_total: Dec::parse("10", 2)?,
        init_price: Dec::parse("10000", 2)?,
        include_fee: false,
        delisting_ts: 0,
    })?;
    tracing::info!("market BTCUSD registered");

    let _table = CommandTable::default();

    // Mirrors the source's repeating `nw_timer` that drives `on_cache_timer`;
    // here it is an explicit tokio interval rather than a background thread,
    // since the core itself has no timers of its own (SPEC_FULL.md #5).
    let mut purge_timer = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        purge_timer.tick().await;
        let now = ctx.now_ts() as f64 / 1000.0;
        if let Some(market) = ctx.markets.get_mut("BTCUSD") {
            market.depth_cache.purge_if_due(now);
            tracing::debug!(now, "depth cache purge cycle");
        }
    }
}
