//! Request decoding and command routing.
//!
//! Grounded on `original_source/matchengine/me_server.c`'s `svr_on_recv_pkg`:
//! decode the body as a JSON array of positional parameters, look up the
//! handler by numeric command code, gate mutating commands on service
//! availability, and build a reply envelope carrying the original `req_id`.
//! Socket framing and the actual connection close belong to a transport this
//! crate does not implement (SPEC_FULL.md #6); [`DispatchOutcome::CloseConnection`]
//! is how a decode failure is surfaced to whatever owns the socket.

pub mod commands;

use crate::context::EngineContext;
use crate::decimal::Dec;
use crate::error::{EngineError, EngineResult};
use crate::market::engine::{self, PlaceOrderRequest};
use crate::market::types::{OrderKind, Side};
use crate::market::{depth, MarketConfig};
use crate::sinks::ExternalSinks;
use commands::{Command, CommandTable};
use serde_json::{json, Value};

pub struct Request {
    pub command: u32,
    pub req_id: u64,
    pub sequence: u32,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReplyError {
    pub code: u32,
    pub message: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Reply {
    pub error: Option<ReplyError>,
    pub result: Option<Value>,
    pub id: u64,
}

impl Reply {
    fn ok(id: u64, result: Value) -> Reply {
        Reply { error: None, result: Some(result), id }
    }

    fn err(id: u64, error: EngineError) -> Reply {
        Reply {
            error: Some(ReplyError { code: error.wire_code(), message: error.to_string() }),
            result: None,
            id,
        }
    }
}

pub enum DispatchOutcome {
    Reply(Reply),
    CloseConnection { hex_dump: String },
}

pub fn dispatch<S: ExternalSinks>(ctx: &mut EngineContext<S>, table: &CommandTable, req: &Request) -> DispatchOutcome {
    let body: Value = match serde_json::from_slice(&req.body) {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(command = req.command, req_id = req.req_id, "decode failure, closing connection");
            return DispatchOutcome::CloseConnection { hex_dump: hex_dump(&req.body) };
        }
    };
    let params = match body.as_array() {
        Some(a) => a.as_slice(),
        None => {
            tracing::warn!(command = req.command, req_id = req.req_id, "body is not a JSON array");
            return DispatchOutcome::CloseConnection { hex_dump: hex_dump(&req.body) };
        }
    };

    let command = match table.get(req.command) {
        Some(c) => c,
        None => return DispatchOutcome::Reply(Reply::err(req.req_id, EngineError::Invalid("unknown command".into()))),
    };

    if command.is_mutating() && !ctx.is_service_available() {
        return DispatchOutcome::Reply(Reply::err(req.req_id, EngineError::ServiceUnavailable));
    }

    match route(ctx, command, params) {
        Ok(result) => DispatchOutcome::Reply(Reply::ok(req.req_id, result)),
        Err(e) => DispatchOutcome::Reply(Reply::err(req.req_id, e)),
    }
}

fn hex_dump(body: &[u8]) -> String {
    body.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

struct Params<'a>(&'a [Value]);

impl<'a> Params<'a> {
    fn get(&self, i: usize) -> EngineResult<&'a Value> {
        self.0.get(i).ok_or_else(|| EngineError::Invalid(format!("missing param {i}")))
    }

    fn str(&self, i: usize) -> EngineResult<&'a str> {
        self.get(i)?.as_str().ok_or_else(|| EngineError::Invalid(format!("param {i} must be a string")))
    }

    fn u64(&self, i: usize) -> EngineResult<u64> {
        self.get(i)?.as_u64().ok_or_else(|| EngineError::Invalid(format!("param {i} must be a non-negative integer")))
    }

    fn u32(&self, i: usize) -> EngineResult<u32> {
        Ok(self.u64(i)? as u32)
    }

    fn usize(&self, i: usize) -> EngineResult<usize> {
        Ok(self.u64(i)? as usize)
    }

    fn dec(&self, i: usize, prec: u32) -> EngineResult<Dec> {
        Dec::parse(self.str(i)?, prec).map_err(|e| EngineError::Invalid(e.to_string()))
    }

    fn side(&self, i: usize) -> EngineResult<Side> {
        match self.str(i)? {
            "ask" | "sell" => Ok(Side::Ask),
            "bid" | "buy" => Ok(Side::Bid),
            other => Err(EngineError::Invalid(format!("unknown side: {other}"))),
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn route<S: ExternalSinks>(ctx: &mut EngineContext<S>, command: Command, params: &[Value]) -> EngineResult<Value> {
    let p = Params(params);
    match command {
        Command::BalanceQuery => handle_balance_query(ctx, &p),
        Command::BalanceUpdate => handle_balance_update(ctx, &p),
        Command::AssetList => handle_asset_list(ctx),
        Command::AssetSummary => handle_asset_summary(ctx, &p),
        Command::AssetRegister => handle_asset_register(ctx, &p),
        Command::OrderPutLimit => handle_order_put(ctx, &p, OrderKind::Limit),
        Command::OrderPutMarket => handle_order_put(ctx, &p, OrderKind::Market),
        Command::OrderPutAon => handle_order_put(ctx, &p, OrderKind::Aon),
        Command::OrderPutFok => handle_order_put(ctx, &p, OrderKind::Fok),
        Command::OrderQuery => handle_order_query(ctx, &p),
        Command::OrderCancel => handle_order_cancel(ctx, &p),
        Command::OrderBook => handle_order_book(ctx, &p),
        Command::OrderBookDepth => handle_order_book_depth(ctx, &p),
        Command::OrderDetail => handle_order_detail(ctx, &p),
        Command::MarketList => handle_market_list(ctx),
        Command::MarketSummary => handle_market_summary(ctx, &p),
        Command::MarketRegister => handle_market_register(ctx, &p),
        Command::MarketDetail => handle_market_detail(ctx, &p),
    }
}

fn handle_balance_query<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let user_id = p.u64(0)?;
    let mut out = serde_json::Map::new();
    let assets: Vec<&str> = if p.len() > 1 {
        (1..p.len()).map(|i| p.str(i)).collect::<EngineResult<Vec<_>>>()?
    } else {
        ctx.assets.list().map(|a| a.symbol.as_str()).collect()
    };
    for asset in assets {
        let available = ctx.balances.available(user_id, asset);
        let freeze = ctx.balances.freeze_balance(user_id, asset);
        out.insert(
            asset.to_string(),
            json!({ "available": available.to_string(), "freeze": freeze.to_string(), "total": (available + freeze).to_string() }),
        );
    }
    Ok(Value::Object(out))
}

fn handle_balance_update<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let user_id = p.u64(0)?;
    let asset = p.str(1)?.to_string();
    let business = p.str(2)?.to_string();
    let business_id = p.u64(3)?;
    let prec = ctx.assets.prec(&asset).ok_or_else(|| EngineError::Invalid(format!("unknown asset: {asset}")))?;
    let change = p.dec(4, prec)?;
    let detail = p.get(5).cloned().unwrap_or(Value::Null);

    let outcome = ctx.balances.update(true, user_id, &asset, &business, business_id, change);
    match outcome {
        crate::balance::UpdateOutcome::Applied => {
            ctx.sinks.append_operlog(
                "update_balance",
                &json!({ "user_id": user_id, "asset": asset, "business": business, "business_id": business_id, "change": change.to_string() }),
            );
            let history = json!({ "user_id": user_id, "asset": asset, "change": change.to_string(), "detail": detail });
            ctx.sinks.append_history("balance_update", &history);
            ctx.sinks.push_message("balance_update", &history);
            Ok(json!({ "status": "success" }))
        }
        crate::balance::UpdateOutcome::Repeat => Err(EngineError::RepeatUpdate),
        crate::balance::UpdateOutcome::Insufficient => Err(EngineError::InsufficientBalance),
    }
}

fn handle_asset_list<S: ExternalSinks>(ctx: &EngineContext<S>) -> EngineResult<Value> {
    let list: Vec<Value> = ctx.assets.list().map(|a| json!({ "name": a.symbol, "prec": a.prec_save })).collect();
    Ok(Value::Array(list))
}

fn handle_asset_summary<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let symbols: Vec<String> = if !p.is_empty() {
        (0..p.len()).map(|i| p.str(i).map(str::to_string)).collect::<EngineResult<Vec<_>>>()?
    } else {
        ctx.assets.list().map(|a| a.symbol.clone()).collect()
    };
    let mut out = Vec::new();
    for symbol in symbols {
        let (available_count, available, freeze_count, freeze) = ctx.balances.asset_summary(&symbol);
        out.push(json!({
            "name": symbol,
            "available_count": available_count,
            "available_balance": available.to_string(),
            "freeze_count": freeze_count,
            "freeze_balance": freeze.to_string(),
            "total_count": available_count + freeze_count,
            "total_balance": (available + freeze).to_string(),
        }));
    }
    Ok(Value::Array(out))
}

fn handle_asset_register<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let symbol = p.str(0)?;
    let name = p.str(1)?;
    let tick_size_str = p.str(2)?;
    let prec = precision_of(tick_size_str);
    ctx.assets.register(symbol, name, prec, prec, tick_size_str)?;
    ctx.sinks.append_operlog("asset_register", &json!({ "symbol": symbol, "name": name, "tick_size": tick_size_str }));
    Ok(json!({ "status": "success" }))
}

/// Count of digits after the decimal point in a plain decimal string, used
/// to derive storage precision for assets registered with only a tick size
/// (ASSET_REGISTER's param list carries no separate precision field).
fn precision_of(s: &str) -> u32 {
    s.split('.').nth(1).map(|frac| frac.len() as u32).unwrap_or(0)
}

fn order_snapshot(order: &crate::market::types::Order) -> Value {
    serde_json::to_value(order).expect("Order serializes")
}

fn handle_order_put<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params, kind: OrderKind) -> EngineResult<Value> {
    let user_id = p.u64(0)?;
    let market = p.str(1)?.to_string();
    let side = p.side(2)?;
    let (stock_prec, money_prec, fee_prec) = {
        let m = ctx.markets.require(&market)?;
        (m.config.stock_prec, m.config.money_prec, m.config.fee_prec)
    };
    let amount = p.dec(3, stock_prec)?;

    let (price, taker_fee, maker_fee, source) = match kind {
        OrderKind::Market => (Dec::ZERO, p.dec(4, fee_prec)?, Dec::ZERO, p.str(5)?.to_string()),
        OrderKind::Fok => (p.dec(4, money_prec)?, p.dec(5, fee_prec)?, Dec::ZERO, p.str(6)?.to_string()),
        OrderKind::Limit | OrderKind::Aon => {
            (p.dec(4, money_prec)?, p.dec(5, fee_prec)?, p.dec(6, fee_prec)?, p.str(7)?.to_string())
        }
    };

    let order = engine::place_order(
        ctx,
        PlaceOrderRequest { market, user_id, side, kind, amount, price, taker_fee, maker_fee, source },
    )?;
    Ok(order_snapshot(&order))
}

fn handle_order_query<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let user_id = p.u64(0)?;
    let market = p.str(1)?;
    let offset = p.usize(2)?;
    let limit = p.usize(3)?.min(ctx.settings.order_list_max_len);

    let book = &ctx.markets.require(market)?.book;
    let mut orders = book.list_by_user(user_id);
    orders.sort_by_key(|o| o.id);
    let total = orders.len();
    let page: Vec<Value> = orders.into_iter().skip(offset).take(limit).map(order_snapshot).collect();
    Ok(json!({ "limit": limit, "offset": offset, "total": total, "records": page }))
}

fn handle_order_cancel<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let user_id = p.u64(0)?;
    let market = p.str(1)?.to_string();
    let order_id = p.u64(2)?;
    let order = engine::cancel_order(ctx, &market, user_id, order_id)?;
    Ok(order_snapshot(&order))
}

fn handle_order_book<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let market = p.str(0)?;
    let side = p.side(1)?;
    let offset = p.usize(2)?;
    let limit = p.usize(3)?.min(ctx.settings.order_book_max_len);

    let book = &ctx.markets.require(market)?.book;
    let ids = book.ids_in_order(side);
    let total = ids.len();
    let page: Vec<Value> = ids
        .into_iter()
        .skip(offset)
        .take(limit)
        .filter_map(|id| book.get_by_id(id))
        .map(order_snapshot)
        .collect();
    Ok(json!({ "offset": offset, "limit": limit, "total": total, "orders": page }))
}

fn handle_order_book_depth<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let market_symbol = p.str(0)?.to_string();
    let limit = p.usize(1)?;
    let interval_str = if p.len() > 2 { p.str(2)? } else { "0" };

    let money_prec = ctx.markets.require(&market_symbol)?.config.money_prec;
    let interval = Dec::parse(interval_str, money_prec).map_err(|e| EngineError::Invalid(e.to_string()))?;

    let fingerprint: depth::Fingerprint = (208, format!("{market_symbol}:{limit}:{interval_str}").into_bytes());
    let now = ctx.now_ts() as f64 / 1000.0;
    let cache_timeout = ctx.settings.cache_timeout;

    let market = ctx.markets.require_mut(&market_symbol)?;
    market.depth_cache.purge_if_due(now);
    if let Some(cached) = market.depth_cache.get(&fingerprint, now, cache_timeout) {
        return Ok(cached);
    }
    let result = if interval.is_zero() {
        depth::get_depth(&market.book, limit)
    } else {
        depth::get_depth_merge(&market.book, limit, interval)
    };
    let value = serde_json::to_value(&result).expect("DepthResult serializes");
    market.depth_cache.put(fingerprint, now, value.clone());
    Ok(value)
}

fn handle_order_detail<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let market = p.str(0)?;
    let order_id = p.u64(1)?;
    let book = &ctx.markets.require(market)?.book;
    Ok(book.get_by_id(order_id).map(order_snapshot).unwrap_or(Value::Null))
}

fn handle_market_list<S: ExternalSinks>(ctx: &EngineContext<S>) -> EngineResult<Value> {
    let list: Vec<Value> = ctx.markets.list().map(|m| serde_json::to_value(m.detail()).expect("MarketDetail serializes")).collect();
    Ok(Value::Array(list))
}

fn handle_market_summary<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let symbols: Vec<String> = if !p.is_empty() {
        (0..p.len()).map(|i| p.str(i).map(str::to_string)).collect::<EngineResult<Vec<_>>>()?
    } else {
        ctx.markets.list().map(|m| m.config.symbol.clone()).collect()
    };
    let mut out = Vec::new();
    for symbol in symbols {
        let market = ctx.markets.require(&symbol)?;
        let status = market.book.status();
        let summary = crate::market::MarketSummary {
            name: symbol,
            ask_count: status.ask_count,
            ask_amount: status.ask_amount,
            bid_count: status.bid_count,
            bid_amount: status.bid_amount,
        };
        out.push(serde_json::to_value(summary).expect("MarketSummary serializes"));
    }
    Ok(Value::Array(out))
}

fn handle_market_register<S: ExternalSinks>(ctx: &mut EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let symbol = p.str(0)?.to_string();
    let name = p.str(1)?.to_string();
    let stock = p.str(2)?.to_string();
    let money = p.str(3)?.to_string();

    let stock_prec = ctx.assets.prec(&stock).ok_or_else(|| EngineError::Invalid(format!("unknown asset: {stock}")))?;
    let money_prec = ctx.assets.prec(&money).ok_or_else(|| EngineError::Invalid(format!("unknown asset: {money}")))?;
    let init_price = p.dec(4, money_prec)?;
    let delisting_ts = p.u32(5)?;

    ctx.markets.register(MarketConfig {
        symbol: symbol.clone(),
        name,
        stock,
        money,
        stock_prec,
        money_prec,
        // Not carried on the wire for MARKET_REGISTER; a host wanting finer
        // control registers the market directly against `MarketConfig`
        // instead of through the dispatcher.
        fee_prec: 4,
        min_amount: Dec::ZERO,
        min_total: Dec::ZERO,
        init_price,
        include_fee: false,
        delisting_ts,
    })?;
    ctx.sinks.append_operlog("market_register", &json!({ "symbol": symbol }));
    Ok(json!({ "status": "success" }))
}

fn handle_market_detail<S: ExternalSinks>(ctx: &EngineContext<S>, p: &Params) -> EngineResult<Value> {
    let market = p.str(0)?;
    let detail = ctx.markets.require(market)?.detail();
    Ok(serde_json::to_value(detail).expect("MarketDetail serializes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::sinks::RecordingSinks;
    use serde_json::json;

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
                min_amount: Dec::ZERO,
                min_total: Dec::ZERO,
                init_price: Dec::parse("10000", 2).unwrap(),
                include_fee: false,
                delisting_ts: 0,
            })
            .unwrap();
        (ctx, CommandTable::default())
    }

    fn req(command: u32, req_id: u64, body: Value) -> Request {
        Request { command, req_id, sequence: 0, body: serde_json::to_vec(&body).unwrap() }
    }

    #[test]
    fn balance_update_then_query_round_trips() {
        let (mut ctx, table) = setup();
        let update = req(102, 1, json!([1, "USD", "deposit", 1, "100.00", {}]));
        match dispatch(&mut ctx, &table, &update) {
            DispatchOutcome::Reply(r) => assert!(r.error.is_none()),
            _ => panic!("expected reply"),
        }

        let query = req(101, 2, json!([1, "USD"]));
        match dispatch(&mut ctx, &table, &query) {
            DispatchOutcome::Reply(r) => {
                let result = r.result.unwrap();
                assert_eq!(result["USD"]["available"], "100.00");
            }
            _ => panic!("expected reply"),
        }
    }

    #[test]
    fn repeat_balance_update_is_reported() {
        let (mut ctx, table) = setup();
        let update = req(102, 1, json!([1, "USD", "deposit", 7, "50.00", {}]));
        dispatch(&mut ctx, &table, &update);
        match dispatch(&mut ctx, &table, &update) {
            DispatchOutcome::Reply(r) => assert_eq!(r.error.unwrap().code, 5010),
            _ => panic!("expected reply"),
        }
    }

    #[test]
    fn malformed_body_closes_connection() {
        let (mut ctx, table) = setup();
        let bad = Request { command: 102, req_id: 1, sequence: 0, body: b"not json".to_vec() };
        match dispatch(&mut ctx, &table, &bad) {
            DispatchOutcome::CloseConnection { .. } => {}
            _ => panic!("expected close"),
        }
    }

    #[test]
    fn unknown_command_is_invalid_argument() {
        let (mut ctx, table) = setup();
        let unknown = req(9999, 1, json!([]));
        match dispatch(&mut ctx, &table, &unknown) {
            DispatchOutcome::Reply(r) => assert_eq!(r.error.unwrap().code, 5001),
            _ => panic!("expected reply"),
        }
    }

    #[test]
    fn mutating_command_rejected_when_service_unavailable() {
        let (mut ctx, table) = setup();
        ctx.signal_block = true;
        let update = req(102, 1, json!([1, "USD", "deposit", 1, "1.00", {}]));
        match dispatch(&mut ctx, &table, &update) {
            DispatchOutcome::Reply(r) => assert_eq!(r.error.unwrap().code, 5003),
            _ => panic!("expected reply"),
        }
    }

    #[test]
    fn order_put_limit_then_cancel_round_trips() {
        let (mut ctx, table) = setup();
        dispatch(&mut ctx, &table, &req(102, 1, json!([1, "USD", "deposit", 1, "50000.00", {}])));

        let put = req(201, 2, json!([1, "BTCUSD", "bid", "1", "10000.00", "0.001", "0.001", ""]));
        let order_id = match dispatch(&mut ctx, &table, &put) {
            DispatchOutcome::Reply(r) => {
                assert!(r.error.is_none());
                r.result.unwrap()["id"].as_u64().unwrap()
            }
            _ => panic!("expected reply"),
        };

        let cancel = req(206, 3, json!([1, "BTCUSD", order_id]));
        match dispatch(&mut ctx, &table, &cancel) {
            DispatchOutcome::Reply(r) => assert!(r.error.is_none()),
            _ => panic!("expected reply"),
        }
    }
}
