//! Per-market order book: two price-time ordered sets, a by-id index, and a
//! per-user index.
//!
//! Grounded on the teacher's `Orderbook` (`services/matching/orderbook.rs`),
//! which keeps `bids`/`asks: BTreeMap<PriceLevel, VecDeque<OrderEntry>>` plus
//! an `order_index: DashMap<Uuid, (Side, PriceLevel)>`. This version drops
//! the `DashMap`/`parking_lot::RwLock` concurrency wrappers (see
//! SPEC_FULL.md #5 / DESIGN.md: the core has no concurrent writers by
//! construction) and adds the per-user index the teacher's book never
//! needed, since its callers queried the database for order history instead.
//! Orders themselves live in `order_by_id`; the book and user index only
//! hold stable `(price, id)` keys, per SPEC_FULL.md #9's note on cyclic
//! references.

use crate::decimal::Dec;
use crate::error::EngineError;
use crate::market::types::{AskKey, BidKey, Order, OrderId, Side, UserId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BookStatus {
    pub ask_count: u64,
    pub ask_amount: Dec,
    pub bid_count: u64,
    pub bid_amount: Dec,
}

#[derive(Debug, Default)]
pub struct OrderBook {
    asks: BTreeSet<AskKey>,
    bids: BTreeSet<BidKey>,
    order_by_id: HashMap<OrderId, Order>,
    orders_by_user: HashMap<UserId, BTreeSet<OrderId>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: Order) {
        let id = order.id;
        let user_id = order.user_id;
        match order.side {
            Side::Ask => {
                self.asks.insert(AskKey(order.price, id));
            }
            Side::Bid => {
                self.bids.insert(BidKey::new(order.price, id));
            }
        }
        self.order_by_id.insert(id, order);
        self.orders_by_user.entry(user_id).or_default().insert(id);
    }

    /// Remove an order from the book and all indexes, returning the order
    /// that was removed.
    pub fn remove(&mut self, id: OrderId) -> Result<Order, EngineError> {
        let order = self.order_by_id.remove(&id).ok_or(EngineError::OrderNotFound)?;
        match order.side {
            Side::Ask => {
                self.asks.remove(&AskKey(order.price, id));
            }
            Side::Bid => {
                self.bids.remove(&BidKey::new(order.price, id));
            }
        }
        if let Some(set) = self.orders_by_user.get_mut(&order.user_id) {
            set.remove(&id);
            if set.is_empty() {
                self.orders_by_user.remove(&order.user_id);
            }
        }
        Ok(order)
    }

    pub fn get_by_id(&self, id: OrderId) -> Option<&Order> {
        self.order_by_id.get(&id)
    }

    pub fn get_mut_by_id(&mut self, id: OrderId) -> Option<&mut Order> {
        self.order_by_id.get_mut(&id)
    }

    pub fn list_by_user(&self, user_id: UserId) -> Vec<&Order> {
        self.orders_by_user
            .get(&user_id)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.order_by_id.get(id))
            .collect()
    }

    pub fn best_ask_id(&self) -> Option<OrderId> {
        self.asks.iter().next().map(|k| k.1)
    }

    pub fn best_bid_id(&self) -> Option<OrderId> {
        self.bids.iter().next().map(|k| k.1)
    }

    pub fn best_ask(&self) -> Option<&Order> {
        self.best_ask_id().and_then(|id| self.order_by_id.get(&id))
    }

    pub fn best_bid(&self) -> Option<&Order> {
        self.best_bid_id().and_then(|id| self.order_by_id.get(&id))
    }

    /// Ask order ids in price-time priority, front to back.
    pub fn ask_ids_in_order(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.asks.iter().map(|k| k.1)
    }

    /// Bid order ids in price-time priority, front to back.
    pub fn bid_ids_in_order(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.bids.iter().map(|k| k.1)
    }

    pub fn ids_in_order(&self, side: Side) -> Vec<OrderId> {
        match side {
            Side::Ask => self.ask_ids_in_order().collect(),
            Side::Bid => self.bid_ids_in_order().collect(),
        }
    }

    pub fn is_side_empty(&self, side: Side) -> bool {
        match side {
            Side::Ask => self.asks.is_empty(),
            Side::Bid => self.bids.is_empty(),
        }
    }

    pub fn status(&self) -> BookStatus {
        let mut ask_amount = Dec::ZERO;
        for id in self.ask_ids_in_order() {
            ask_amount = ask_amount + self.order_by_id[&id].left;
        }
        let mut bid_amount = Dec::ZERO;
        for id in self.bid_ids_in_order() {
            bid_amount = bid_amount + self.order_by_id[&id].left;
        }
        BookStatus {
            ask_count: self.asks.len() as u64,
            ask_amount,
            bid_count: self.bids.len() as u64,
            bid_amount,
        }
    }

    /// Consecutive-price-grouped levels for a side, best first, up to
    /// `limit` distinct price levels. Grounded on
    /// `original_source/matchengine/me_server.c`'s `get_depth`.
    pub fn depth_levels(&self, side: Side, limit: usize) -> Vec<(Dec, Dec)> {
        let mut levels: BTreeMap<PriceRank, Dec> = BTreeMap::new();
        let ids: Vec<OrderId> = self.ids_in_order(side);
        for id in ids {
            let order = &self.order_by_id[&id];
            let rank = PriceRank::new(side, order.price);
            *levels.entry(rank).or_insert(Dec::ZERO) = levels.get(&rank).copied().unwrap_or(Dec::ZERO) + order.left;
        }
        levels
            .into_iter()
            .take(limit)
            .map(|(rank, amount)| (rank.price(), amount))
            .collect()
    }
}

/// Wraps a price so that asks sort ascending and bids sort descending when
/// used as a `BTreeMap` key, without needing two copies of the grouping
/// logic in `depth_levels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PriceRank {
    Ask(Dec),
    Bid(std::cmp::Reverse<Dec>),
}

impl PriceRank {
    fn new(side: Side, price: Dec) -> PriceRank {
        match side {
            Side::Ask => PriceRank::Ask(price),
            Side::Bid => PriceRank::Bid(std::cmp::Reverse(price)),
        }
    }

    fn price(&self) -> Dec {
        match self {
            PriceRank::Ask(p) => *p,
            PriceRank::Bid(std::cmp::Reverse(p)) => *p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::OrderKind;
    use rust_decimal_macros::dec;

    fn order(id: OrderId, side: Side, price: Dec, left: Dec, user_id: UserId) -> Order {
        Order {
            id,
            kind: OrderKind::Limit,
            side,
            create_time: 0,
            update_time: 0,
            user_id,
            market: "BTCUSD".into(),
            source: String::new(),
            price,
            amount: left,
            left,
            freeze: Dec::ZERO,
            taker_fee: Dec::ZERO,
            maker_fee: Dec::ZERO,
            deal_stock: Dec::ZERO,
            deal_money: Dec::ZERO,
            deal_fee: Dec::ZERO,
        }
    }

    #[test]
    fn insert_and_indexes_agree() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Ask, Dec::from_decimal(dec!(100)), Dec::from_decimal(dec!(1)), 7));
        assert!(book.get_by_id(1).is_some());
        assert_eq!(book.list_by_user(7).len(), 1);
        assert_eq!(book.best_ask_id(), Some(1));
    }

    #[test]
    fn remove_clears_all_indexes() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Bid, Dec::from_decimal(dec!(100)), Dec::from_decimal(dec!(1)), 7));
        book.remove(1).unwrap();
        assert!(book.get_by_id(1).is_none());
        assert!(book.list_by_user(7).is_empty());
        assert!(book.is_side_empty(Side::Bid));
    }

    #[test]
    fn bids_best_is_highest_price_asks_best_is_lowest() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Bid, Dec::from_decimal(dec!(100)), Dec::from_decimal(dec!(1)), 1));
        book.insert(order(2, Side::Bid, Dec::from_decimal(dec!(110)), Dec::from_decimal(dec!(1)), 2));
        book.insert(order(3, Side::Ask, Dec::from_decimal(dec!(120)), Dec::from_decimal(dec!(1)), 3));
        book.insert(order(4, Side::Ask, Dec::from_decimal(dec!(115)), Dec::from_decimal(dec!(1)), 4));

        assert_eq!(book.best_bid().unwrap().price.inner(), dec!(110));
        assert_eq!(book.best_ask().unwrap().price.inner(), dec!(115));
    }

    #[test]
    fn depth_levels_group_same_price() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Ask, Dec::from_decimal(dec!(100)), Dec::from_decimal(dec!(1)), 1));
        book.insert(order(2, Side::Ask, Dec::from_decimal(dec!(100)), Dec::from_decimal(dec!(2)), 2));
        book.insert(order(3, Side::Ask, Dec::from_decimal(dec!(101)), Dec::from_decimal(dec!(1)), 3));

        let levels = book.depth_levels(Side::Ask, 10);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].0.inner(), dec!(100));
        assert_eq!(levels[0].1.inner(), dec!(3));
    }
}
