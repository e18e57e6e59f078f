//! Matching engine: order-placement validation and the four order-type
//! handlers (LIMIT, MARKET, AON, FOK) plus cancellation.
//!
//! The validation sequencing is grounded in
//! `original_source/matchengine/me_server.c`'s `on_cmd_order_put` (amount
//! check, then price/tick/total/price-limit checks, then the
//! `check_makers_exist` gate, then balance checks). The fill mechanics are
//! grounded in the teacher's `Orderbook::match_order`
//! (`services/matching/orderbook.rs`): walk the opposite side's best price
//! levels, consume FIFO within a level, stop when the taker is filled or the
//! crossing condition no longer holds. This version generalizes it to four
//! order kinds, per-order fees, and freeze/available balance transfers
//! instead of the teacher's flat `FeeConfig`.

use crate::balance::Kind;
use crate::context::EngineContext;
use crate::decimal::Dec;
use crate::error::{EngineError, EngineResult};
use crate::market::types::{Order, OrderId, OrderKind, Side, Trade, UserId};
use crate::market::Market;
use crate::sinks::ExternalSinks;

pub struct PlaceOrderRequest {
    pub market: String,
    pub user_id: UserId,
    pub side: Side,
    pub kind: OrderKind,
    pub amount: Dec,
    /// Ignored for MARKET.
    pub price: Dec,
    pub taker_fee: Dec,
    /// Ignored for MARKET and FOK.
    pub maker_fee: Dec,
    pub source: String,
}

/// Validates and places an order, per SPEC_FULL.md #4.5. On success the
/// returned `Order` reflects its post-match state: filled (and absent from
/// the book), partially filled and resting, or resting untouched.
pub fn place_order<S: ExternalSinks>(
    ctx: &mut EngineContext<S>,
    req: PlaceOrderRequest,
) -> EngineResult<Order> {
    if req.source.len() > ctx.settings.source_max_len {
        return Err(EngineError::Invalid("source too long".into()));
    }
    if !(req.taker_fee.is_zero() || req.taker_fee.is_positive()) || req.taker_fee.inner() >= rust_decimal::Decimal::ONE {
        return Err(EngineError::Invalid("taker_fee out of range".into()));
    }
    if req.kind != OrderKind::Market
        && (!(req.maker_fee.is_zero() || req.maker_fee.is_positive()) || req.maker_fee.inner() >= rust_decimal::Decimal::ONE)
    {
        return Err(EngineError::Invalid("maker_fee out of range".into()));
    }

    let stock_symbol;
    let money_symbol;
    let stock_prec;
    let money_prec;
    let fee_prec;
    let min_amount;
    let min_total;
    let include_fee;
    {
        let market = ctx.markets.require(&req.market)?;
        stock_symbol = market.config.stock.clone();
        money_symbol = market.config.money.clone();
        stock_prec = market.config.stock_prec;
        money_prec = market.config.money_prec;
        fee_prec = market.config.fee_prec;
        min_amount = market.config.min_amount;
        min_total = market.config.min_total;
        include_fee = market.config.include_fee;
    }

    let stock_tick = ctx.assets.tick_size(&stock_symbol).ok_or(EngineError::Internal("missing stock asset".into()))?;
    let money_tick = ctx.assets.tick_size(&money_symbol).ok_or(EngineError::Internal("missing money asset".into()))?;

    // 1. amount
    if req.amount.inner() < min_amount.inner() || !req.amount.is_multiple_of(stock_tick) {
        return Err(EngineError::InvalidAmount);
    }

    // 2. price (LIMIT/AON/FOK only)
    if req.kind.has_explicit_price() {
        if !req.price.is_multiple_of(money_tick) {
            return Err(EngineError::InvalidPrice);
        }
        let total = (req.price * req.amount).rescale(money_prec);
        if total.inner() < min_total.inner() {
            return Err(EngineError::PriceOutOfRange);
        }
        let market = ctx.markets.require(&req.market)?;
        let last = market.last_price;
        let closing = market.closing_price;
        if !crate::config::EngineSettings::check_price_limit(last, req.price, ctx.settings.last_price_limit)
            || !crate::config::EngineSettings::check_price_limit(closing, req.price, ctx.settings.closing_price_limit)
        {
            return Err(EngineError::PriceOutOfRange);
        }
    }

    let market = ctx.markets.require(&req.market)?;

    // 3. MARKET requires a non-empty opposite side.
    if req.kind == OrderKind::Market && market.book.is_side_empty(req.side.opposite()) {
        return Err(EngineError::NoOrdersFound);
    }

    // FOK's maker-candidate gate: reject upfront if the opposite side is
    // empty, mirroring `check_makers_exist` in the source.
    if req.kind.requires_counter_orders_precheck() && market.book.is_side_empty(req.side.opposite()) {
        return Err(EngineError::NoOrdersFound);
    }

    // MARKET BID: top-of-book total must clear min_total (no explicit price
    // to check against otherwise).
    if req.kind == OrderKind::Market && req.side == Side::Bid {
        let best_ask = market.book.best_ask().ok_or(EngineError::NoOrdersFound)?;
        let total = (best_ask.price * req.amount).rescale(money_prec);
        if total.inner() < min_total.inner() {
            return Err(EngineError::PriceOutOfRange);
        }
    }

    // 4. balance
    match req.side {
        Side::Ask => {
            if ctx.balances.available(req.user_id, &stock_symbol).inner() < req.amount.inner() {
                return Err(EngineError::InsufficientBalance);
            }
        }
        Side::Bid => {
            if req.kind.has_explicit_price() {
                let base_total = (req.amount * req.price).rescale(money_prec);
                let required = if include_fee {
                    (base_total * (Dec::ONE + req.taker_fee)).rescale(money_prec)
                } else {
                    base_total
                };
                let available = ctx.balances.available(req.user_id, &money_symbol);
                if available.inner() < required.inner() {
                    return Err(if include_fee {
                        EngineError::InsufficientFee
                    } else {
                        EngineError::InsufficientBalance
                    });
                }
            }
            // MARKET BID's affordability is bounded defensively during the
            // match loop itself (see `execute_match`), since its total cost
            // is unknown until the book is walked.
        }
    }

    // FOK: confirm the book can satisfy `amount` entirely before mutating
    // anything.
    if req.kind == OrderKind::Fok && !can_fill_fully(market, req.side, req.price, req.amount) {
        return Err(EngineError::NoOrdersFound);
    }

    // --- validation complete; begin mutation ---

    let now = ctx.now_ts();
    let id = ctx.next_order_id();
    let mut order = Order {
        id,
        kind: req.kind,
        side: req.side,
        create_time: now,
        update_time: now,
        user_id: req.user_id,
        market: req.market.clone(),
        source: req.source,
        price: req.price,
        amount: req.amount,
        left: req.amount,
        freeze: Dec::ZERO,
        taker_fee: req.taker_fee,
        maker_fee: req.maker_fee,
        deal_stock: Dec::ZERO,
        deal_money: Dec::ZERO,
        deal_fee: Dec::ZERO,
    };

    if req.kind != OrderKind::Aon {
        let market = ctx.markets.require_mut(&req.market)?;
        execute_match(
            market,
            &mut ctx.balances,
            &mut ctx.sinks,
            stock_prec,
            money_prec,
            fee_prec,
            &stock_symbol,
            &money_symbol,
            ctx.settings.fee_collector_user_id,
            &mut order,
            now,
        )?;
    }

    if order.left.is_positive() {
        if req.kind.never_rests() {
            // MARKET/FOK never rest; a partial MARKET fill simply terminates.
            let order_json = serde_json::to_value(&order).expect("Order serializes");
            ctx.sinks.append_operlog("order_put", &order_put_params(&order));
            ctx.sinks.append_history("order_put", &order_json);
            ctx.sinks.push_message("order_put", &order_json);
            return Ok(order);
        }
        freeze_remaining(&mut ctx.balances, &stock_symbol, &money_symbol, money_prec, include_fee, &order)?;
        let market = ctx.markets.require_mut(&req.market)?;
        market.book.insert(order.clone());
    }

    let order_json = serde_json::to_value(&order).expect("Order serializes");
    ctx.sinks.append_operlog("order_put", &order_put_params(&order));
    ctx.sinks.append_history("order_put", &order_json);
    ctx.sinks.push_message("order_put", &order_json);
    Ok(order)
}

fn order_put_params(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id,
        "user_id": order.user_id,
        "market": order.market,
        "side": order.side.to_string(),
    })
}

fn freeze_remaining(
    balances: &mut crate::balance::BalanceLedger,
    stock: &str,
    money: &str,
    money_prec: u32,
    include_fee: bool,
    order: &Order,
) -> EngineResult<()> {
    match order.side {
        Side::Ask => balances.freeze(order.user_id, stock, order.left).map_err(|_| EngineError::InsufficientBalance),
        Side::Bid => {
            let base = (order.left * order.price).rescale(money_prec);
            let amount = if include_fee {
                (base * (Dec::ONE + order.taker_fee)).rescale(money_prec)
            } else {
                base
            };
            balances.freeze(order.user_id, money, amount).map_err(|_| EngineError::InsufficientBalance)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_match<S: ExternalSinks>(
    market: &mut Market,
    balances: &mut crate::balance::BalanceLedger,
    sinks: &mut S,
    stock_prec: u32,
    money_prec: u32,
    fee_prec: u32,
    stock: &str,
    money: &str,
    fee_collector: UserId,
    taker: &mut Order,
    now: i64,
) -> EngineResult<()> {
    while taker.left.is_positive() {
        let maker_id = match taker.side {
            Side::Bid => market.book.best_ask_id(),
            Side::Ask => market.book.best_bid_id(),
        };
        let maker_id = match maker_id {
            Some(id) => id,
            None => break,
        };
        let maker_price = market.book.get_by_id(maker_id).expect("id from book").price;

        if taker.kind.has_explicit_price() {
            let crosses = match taker.side {
                Side::Bid => maker_price.inner() <= taker.price.inner(),
                Side::Ask => maker_price.inner() >= taker.price.inner(),
            };
            if !crosses {
                break;
            }
        }

        let maker_left = market.book.get_by_id(maker_id).unwrap().left;
        let mut deal_amount = taker.left.min(maker_left);
        let mut deal_money = (deal_amount * maker_price).rescale(money_prec);

        // Defensive affordability clamp: only the MARKET side lacks an
        // upfront bound on total cost (LIMIT/AON/FOK's pre-check already
        // guarantees sufficiency given their own limit price). Without this,
        // a thin book could walk a MARKET BID past its available balance.
        match taker.side {
            Side::Bid => {
                let avail = balances.available(taker.user_id, money);
                if deal_money.inner() > avail.inner() {
                    if maker_price.is_zero() {
                        break;
                    }
                    let affordable = avail.checked_div(maker_price).unwrap_or(Dec::ZERO).rescale(stock_prec);
                    deal_amount = affordable.min(deal_amount);
                    if !deal_amount.is_positive() {
                        break;
                    }
                    deal_money = (deal_amount * maker_price).rescale(money_prec);
                }
            }
            Side::Ask => {
                let avail = balances.available(taker.user_id, stock);
                if deal_amount.inner() > avail.inner() {
                    deal_amount = avail.min(deal_amount);
                    if !deal_amount.is_positive() {
                        break;
                    }
                    deal_money = (deal_amount * maker_price).rescale(money_prec);
                }
            }
        }

        let maker = market.book.get_mut_by_id(maker_id).expect("id from book");
        let maker_user_id = maker.user_id;
        let maker_maker_fee = maker.maker_fee;
        maker.left = maker.left - deal_amount;
        maker.deal_stock = maker.deal_stock + deal_amount;
        maker.deal_money = maker.deal_money + deal_money;
        maker.update_time = now;
        let maker_fully_filled = maker.left.is_zero();

        taker.left = taker.left - deal_amount;
        taker.deal_stock = taker.deal_stock + deal_amount;
        taker.deal_money = taker.deal_money + deal_money;
        taker.update_time = now;

        match taker.side {
            Side::Bid => {
                // maker is ASK: receives money, pays out frozen stock.
                let maker_fee_amt = (deal_money * maker_maker_fee).rescale(fee_prec);
                balances
                    .add(maker_user_id, Kind::Available, money, deal_money - maker_fee_amt)
                    .map_err(|_| EngineError::Internal("maker credit failed".into()))?;
                if maker_fee_amt.is_positive() {
                    balances
                        .add(fee_collector, Kind::Available, money, maker_fee_amt)
                        .map_err(|_| EngineError::Internal("fee credit failed".into()))?;
                }
                balances
                    .add(maker_user_id, Kind::Freeze, stock, -deal_amount)
                    .map_err(|_| EngineError::Internal("maker freeze debit failed".into()))?;

                let taker_fee_amt = (deal_amount * taker.taker_fee).rescale(stock_prec);
                balances
                    .add(taker.user_id, Kind::Available, stock, deal_amount - taker_fee_amt)
                    .map_err(|_| EngineError::Internal("taker credit failed".into()))?;
                if taker_fee_amt.is_positive() {
                    balances
                        .add(fee_collector, Kind::Available, stock, taker_fee_amt)
                        .map_err(|_| EngineError::Internal("fee credit failed".into()))?;
                }
                balances
                    .add(taker.user_id, Kind::Available, money, -deal_money)
                    .map_err(|_| EngineError::Internal("taker debit failed".into()))?;
                taker.deal_fee = taker.deal_fee + taker_fee_amt;
            }
            Side::Ask => {
                // maker is BID: receives stock, pays out frozen money.
                let maker_fee_amt = (deal_amount * maker_maker_fee).rescale(stock_prec);
                balances
                    .add(maker_user_id, Kind::Available, stock, deal_amount - maker_fee_amt)
                    .map_err(|_| EngineError::Internal("maker credit failed".into()))?;
                if maker_fee_amt.is_positive() {
                    balances
                        .add(fee_collector, Kind::Available, stock, maker_fee_amt)
                        .map_err(|_| EngineError::Internal("fee credit failed".into()))?;
                }
                balances
                    .add(maker_user_id, Kind::Freeze, money, -deal_money)
                    .map_err(|_| EngineError::Internal("maker freeze debit failed".into()))?;

                let taker_fee_amt = (deal_money * taker.taker_fee).rescale(money_prec);
                balances
                    .add(taker.user_id, Kind::Available, money, deal_money - taker_fee_amt)
                    .map_err(|_| EngineError::Internal("taker credit failed".into()))?;
                if taker_fee_amt.is_positive() {
                    balances
                        .add(fee_collector, Kind::Available, money, taker_fee_amt)
                        .map_err(|_| EngineError::Internal("fee credit failed".into()))?;
                }
                balances
                    .add(taker.user_id, Kind::Available, stock, -deal_amount)
                    .map_err(|_| EngineError::Internal("taker debit failed".into()))?;
                taker.deal_fee = taker.deal_fee + taker_fee_amt;
            }
        }

        market.last_price = maker_price;

        let trade = Trade {
            trade_id: uuid::Uuid::new_v4(),
            market: market.config.symbol.clone(),
            taker_order_id: taker.id,
            maker_order_id: maker_id,
            taker_user_id: taker.user_id,
            maker_user_id,
            taker_side: taker.side,
            price: maker_price,
            amount: deal_amount,
            maker_fee: maker_maker_fee,
            taker_fee: taker.taker_fee,
            timestamp: now,
        };
        let trade_json = serde_json::to_value(&trade).expect("Trade serializes");
        sinks.append_history("deal", &trade_json);
        sinks.push_message("deals", &trade_json);

        if maker_fully_filled {
            market.book.remove(maker_id).expect("maker id is live");
        }

        if deal_amount.is_zero() {
            // Affordability clamp produced nothing fillable; avoid spinning.
            break;
        }
    }
    Ok(())
}

/// Simulates walking the opposite side without mutating anything, to decide
/// whether a FOK order can be filled in full.
fn can_fill_fully(market: &Market, side: Side, price: Dec, amount: Dec) -> bool {
    let opposite = side.opposite();
    let mut remaining = amount;
    for id in market.book.ids_in_order(opposite) {
        if !remaining.is_positive() {
            break;
        }
        let maker = market.book.get_by_id(id).expect("id from book");
        let crosses = match side {
            Side::Bid => maker.price.inner() <= price.inner(),
            Side::Ask => maker.price.inner() >= price.inner(),
        };
        if !crosses {
            break;
        }
        remaining = remaining - remaining.min(maker.left);
    }
    !remaining.is_positive()
}

/// Cancels a live order: removes it from the book and all indexes, unfreezes
/// its remaining locked balance, and emits the durability hooks.
pub fn cancel_order<S: ExternalSinks>(
    ctx: &mut EngineContext<S>,
    market_symbol: &str,
    user_id: UserId,
    order_id: OrderId,
) -> EngineResult<Order> {
    let (stock, money, money_prec, include_fee) = {
        let market = ctx.markets.require(market_symbol)?;
        (
            market.config.stock.clone(),
            market.config.money.clone(),
            market.config.money_prec,
            market.config.include_fee,
        )
    };

    {
        let market = ctx.markets.require(market_symbol)?;
        let order = market.book.get_by_id(order_id).ok_or(EngineError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(EngineError::UserMismatch);
        }
    }

    let market = ctx.markets.require_mut(market_symbol)?;
    let order = market.book.remove(order_id)?;

    match order.side {
        Side::Ask => {
            ctx.balances
                .unfreeze(order.user_id, &stock, order.left)
                .map_err(|_| EngineError::Internal("unfreeze on cancel failed".into()))?;
        }
        Side::Bid => {
            let base = (order.left * order.price).rescale(money_prec);
            let amount = if include_fee {
                (base * (Dec::ONE + order.taker_fee)).rescale(money_prec)
            } else {
                base
            };
            ctx.balances
                .unfreeze(order.user_id, &money, amount)
                .map_err(|_| EngineError::Internal("unfreeze on cancel failed".into()))?;
        }
    }

    let order_json = serde_json::to_value(&order).expect("Order serializes");
    ctx.sinks.append_operlog("order_cancel", &order_put_params(&order));
    ctx.sinks.append_history("order_cancel", &order_json);
    ctx.sinks.push_message("order_cancel", &order_json);
    Ok(order)
}

impl<S: ExternalSinks> EngineContext<S> {
    /// Wall-clock timestamp in milliseconds, per the teacher's
    /// `TradeExecution::timestamp` convention (`chrono::Utc::now()`).
    pub fn now_ts(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::market::MarketConfig;
    use crate::sinks::RecordingSinks;
    use rust_decimal_macros::dec;

    fn setup() -> EngineContext<RecordingSinks> {
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
                min_amount: Dec::from_decimal(dec!(0.001)),
                min_total: Dec::from_decimal(dec!(10)),
                init_price: Dec::from_decimal(dec!(10000)),
                include_fee: false,
                delisting_ts: 0,
            })
            .unwrap();
        ctx
    }

    fn req(user_id: u64, side: Side, kind: OrderKind, amount: &str, price: &str, taker_fee: &str, maker_fee: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            market: "BTCUSD".into(),
            user_id,
            side,
            kind,
            amount: Dec::parse(amount, 8).unwrap(),
            price: Dec::parse(price, 2).unwrap(),
            taker_fee: Dec::parse(taker_fee, 4).unwrap(),
            maker_fee: Dec::parse(maker_fee, 4).unwrap(),
            source: String::new(),
        }
    }

    #[test]
    fn scenario_1_resting_limit_bid_freezes_money() {
        let mut ctx = setup();
        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(50000)));

        let order = place_order(&mut ctx, req(1, Side::Bid, OrderKind::Limit, "1", "10000", "0.001", "0.001")).unwrap();
        assert!(order.left.is_positive());
        assert_eq!(ctx.balances.available(1, "USD").inner(), dec!(40000));
        assert_eq!(ctx.balances.freeze_balance(1, "USD").inner(), dec!(10000));
    }

    #[test]
    fn scenario_2_full_cross_applies_maker_and_taker_fees() {
        let mut ctx = setup();
        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(50000)));
        ctx.balances.update(true, 2, "BTC", "deposit", 1, Dec::from_decimal(dec!(2)));

        place_order(&mut ctx, req(1, Side::Bid, OrderKind::Limit, "1", "10000", "0.001", "0.001")).unwrap();
        let taker = place_order(&mut ctx, req(2, Side::Ask, OrderKind::Limit, "1", "10000", "0.002", "0.001")).unwrap();

        assert!(taker.left.is_zero());
        assert_eq!(ctx.balances.available(2, "USD").inner(), dec!(9980));
        assert_eq!(ctx.balances.available(1, "BTC").inner(), dec!(0.999));
        assert_eq!(ctx.markets.require("BTCUSD").unwrap().last_price.inner(), dec!(10000));
        assert!(ctx.markets.require("BTCUSD").unwrap().book.get_by_id(1).is_none());
    }

    #[test]
    fn scenario_3_fok_rejected_when_book_cannot_fill_fully() {
        let mut ctx = setup();
        ctx.balances.update(true, 2, "BTC", "deposit", 1, Dec::from_decimal(dec!(3)));
        place_order(&mut ctx, req(2, Side::Ask, OrderKind::Limit, "3", "10000", "0.001", "0.001")).unwrap();

        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(100000)));
        let err = place_order(
            &mut ctx,
            PlaceOrderRequest {
                maker_fee: Dec::ZERO,
                ..req(1, Side::Bid, OrderKind::Fok, "5", "10000", "0.001", "0")
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), 15);
        assert_eq!(ctx.balances.available(1, "USD").inner(), dec!(100000));
    }

    #[test]
    fn scenario_4_market_order_against_empty_book_is_rejected() {
        let mut ctx = setup();
        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(100000)));
        let err = place_order(
            &mut ctx,
            PlaceOrderRequest {
                price: Dec::ZERO,
                maker_fee: Dec::ZERO,
                ..req(1, Side::Bid, OrderKind::Market, "1", "0", "0.001", "0")
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), 15);
    }

    #[test]
    fn scenario_5_repeated_balance_update_returns_repeat_code() {
        let mut ctx = setup();
        let first = ctx.balances.update(true, 1, "USD", "deposit", 7, Dec::from_decimal(dec!(100)));
        let second = ctx.balances.update(true, 1, "USD", "deposit", 7, Dec::from_decimal(dec!(100)));
        assert_eq!(first, crate::balance::UpdateOutcome::Applied);
        assert_eq!(second, crate::balance::UpdateOutcome::Repeat);
        assert_eq!(ctx.balances.available(1, "USD").inner(), dec!(100));
    }

    #[test]
    fn cancel_restores_available_balance() {
        let mut ctx = setup();
        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(50000)));
        let order = place_order(&mut ctx, req(1, Side::Bid, OrderKind::Limit, "1", "10000", "0.001", "0.001")).unwrap();

        cancel_order(&mut ctx, "BTCUSD", 1, order.id).unwrap();
        assert_eq!(ctx.balances.available(1, "USD").inner(), dec!(50000));
        assert_eq!(ctx.balances.freeze_balance(1, "USD").inner(), dec!(0));
    }

    #[test]
    fn aon_books_without_matching_even_when_crossing() {
        let mut ctx = setup();
        ctx.balances.update(true, 2, "BTC", "deposit", 1, Dec::from_decimal(dec!(2)));
        place_order(&mut ctx, req(2, Side::Ask, OrderKind::Limit, "1", "9000", "0.001", "0.001")).unwrap();

        ctx.balances.update(true, 1, "USD", "deposit", 1, Dec::from_decimal(dec!(50000)));
        let aon = place_order(&mut ctx, req(1, Side::Bid, OrderKind::Aon, "1", "10000", "0.001", "0.001")).unwrap();

        // AON books as a maker-only order even though it crosses the resting ask.
        assert!(aon.left.is_positive());
        assert!(ctx.markets.require("BTCUSD").unwrap().book.get_by_id(aon.id).is_some());
    }
}
