//! End-to-end scenarios driven entirely through the dispatcher, the way a
//! real caller would exercise the engine: encode positional params, decode
//! the reply envelope, assert on `result`/`error`.

use clob_matching_core::config::EngineSettings;
use clob_matching_core::context::EngineContext;
use clob_matching_core::dispatch::commands::CommandTable;
use clob_matching_core::dispatch::{dispatch, DispatchOutcome, Request};
use clob_matching_core::market::MarketConfig;
use clob_matching_core::sinks::RecordingSinks;
use serde_json::{json, Value};

fn setup() -> (EngineContext<RecordingSinks>, CommandTable) {
    let mut ctx = EngineContext::new(EngineSettings::default(), RecordingSinks::default());
    ctx.assets.register("BTC", "Bitcoin", 8, 8, "0.00000001").unwrap();
    ctx.assets.register("USD", "US Dollar", 2, 2, "0.01").unwrap();
    ctx.markets
        .register(MarketConfig {
            symbol: "BTCUSD".into(),
            name: "BTC/USD".into(),
            stock: "BTC".into(),
            money: "USD".into(),
            stock_prec: 8,
            money_prec: 2,
            fee_prec: 4,
            min_amount: clob_matching_core::Dec::parse("0.001", 8).unwrap(),
            min_total: clob_matching_core::Dec::parse("10", 2).unwrap(),
            init_price: clob_matching_core::Dec::parse("10000", 2).unwrap(),
            include_fee: false,
            delisting_ts: 0,
        })
        .unwrap();
    (ctx, CommandTable::default())
}

fn send(ctx: &mut EngineContext<RecordingSinks>, table: &CommandTable, command: u32, req_id: u64, body: Value) -> clob_matching_core::dispatch::Reply {
    let req = Request { command, req_id, sequence: 0, body: serde_json::to_vec(&body).unwrap() };
    match dispatch(ctx, table, &req) {
        DispatchOutcome::Reply(r) => r,
        DispatchOutcome::CloseConnection { hex_dump } => panic!("unexpected connection close: {hex_dump}"),
    }
}

#[test]
fn asset_and_market_registration_then_resting_limit_order() {
    let (mut ctx, table) = setup();

    let balance_update = send(&mut ctx, &table, 102, 1, json!([1, "USD", "deposit", 1, "50000.00", {}]));
    assert!(balance_update.error.is_none());

    let put = send(&mut ctx, &table, 201, 2, json!([1, "BTCUSD", "bid", "1", "10000.00", "0.001", "0.001", "web"]));
    assert!(put.error.is_none());
    let order = put.result.unwrap();
    assert_eq!(order["left"], "1.00000000");

    let balance = send(&mut ctx, &table, 101, 3, json!([1, "USD"]));
    assert_eq!(balance.result.unwrap()["USD"]["freeze"], "10000.00");
}

#[test]
fn full_cross_applies_fees_to_both_sides() {
    let (mut ctx, table) = setup();
    send(&mut ctx, &table, 102, 1, json!([1, "USD", "deposit", 1, "50000.00", {}]));
    send(&mut ctx, &table, 102, 2, json!([2, "BTC", "deposit", 1, "2", {}]));

    send(&mut ctx, &table, 201, 3, json!([1, "BTCUSD", "bid", "1", "10000.00", "0.001", "0.001", ""]));
    let taker = send(&mut ctx, &table, 201, 4, json!([2, "BTCUSD", "ask", "1", "10000.00", "0.002", "0.001", ""]));
    assert!(taker.error.is_none());
    let order = taker.result.unwrap();
    assert_eq!(order["left"], "0.00000000");

    let maker_balance = send(&mut ctx, &table, 101, 5, json!([1, "BTC"]));
    assert_eq!(maker_balance.result.unwrap()["BTC"]["available"], "0.99900000");

    let taker_balance = send(&mut ctx, &table, 101, 6, json!([2, "USD"]));
    assert_eq!(taker_balance.result.unwrap()["USD"]["available"], "9980.00");
}

#[test]
fn fok_rejected_when_book_cannot_cover_full_amount() {
    let (mut ctx, table) = setup();
    send(&mut ctx, &table, 102, 1, json!([2, "BTC", "deposit", 1, "3", {}]));
    send(&mut ctx, &table, 201, 2, json!([2, "BTCUSD", "ask", "3", "10000.00", "0.001", "0.001", ""]));

    send(&mut ctx, &table, 102, 3, json!([1, "USD", "deposit", 1, "100000.00", {}]));
    let fok = send(&mut ctx, &table, 204, 4, json!([1, "BTCUSD", "bid", "5", "10000.00", "0.001", ""]));
    assert_eq!(fok.error.unwrap().code, 5015);

    let balance = send(&mut ctx, &table, 101, 5, json!([1, "USD"]));
    assert_eq!(balance.result.unwrap()["USD"]["available"], "100000.00");
}

#[test]
fn market_order_against_empty_book_is_rejected() {
    let (mut ctx, table) = setup();
    send(&mut ctx, &table, 102, 1, json!([1, "USD", "deposit", 1, "100000.00", {}]));
    let market_order = send(&mut ctx, &table, 202, 2, json!([1, "BTCUSD", "bid", "1", "0.001", ""]));
    assert_eq!(market_order.error.unwrap().code, 5015);
}

#[test]
fn repeated_balance_update_is_idempotent() {
    let (mut ctx, table) = setup();
    let first = send(&mut ctx, &table, 102, 1, json!([1, "USD", "deposit", 7, "100.00", {}]));
    assert!(first.error.is_none());
    let second = send(&mut ctx, &table, 102, 2, json!([1, "USD", "deposit", 7, "100.00", {}]));
    assert_eq!(second.error.unwrap().code, 5010);

    let balance = send(&mut ctx, &table, 101, 3, json!([1, "USD"]));
    assert_eq!(balance.result.unwrap()["USD"]["available"], "100.00");
}

#[test]
fn depth_groups_levels_and_caches_identical_reply() {
    let (mut ctx, table) = setup();
    send(&mut ctx, &table, 102, 1, json!([2, "BTC", "deposit", 1, "3", {}]));
    send(&mut ctx, &table, 201, 2, json!([2, "BTCUSD", "ask", "1", "10001.00", "0.001", "0.001", ""]));
    send(&mut ctx, &table, 201, 3, json!([2, "BTCUSD", "ask", "1", "10001.00", "0.001", "0.001", ""]));

    let first = send(&mut ctx, &table, 208, 4, json!(["BTCUSD", 10, "0"]));
    let depth = first.result.unwrap();
    assert_eq!(depth["asks"][0][1], "2.00000000");

    let second = send(&mut ctx, &table, 208, 5, json!(["BTCUSD", 10, "0"]));
    assert_eq!(depth, second.result.unwrap(), "cached reply must be byte-identical within the TTL window");
}
