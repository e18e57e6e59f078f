//! Order and market value types.
//!
//! Grounded on the teacher's `services/matching/types.rs` (`Side`,
//! `OrderType`, `OrderStatus`, `OrderEntry`) generalized per SPEC_FULL.md
//! #3: four order kinds instead of two, a `u64` strictly-increasing id
//! instead of a `Uuid` (the book's ordering invariant depends on id being
//! a total, monotonic order), and the full fee/freeze/deal bookkeeping the
//! teacher's lighter `OrderEntry` does not carry.

use crate::decimal::Dec;
use serde::Serialize;

pub type OrderId = u64;
pub type UserId = crate::balance::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ask,
    Bid,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Ask => Side::Bid,
            Side::Bid => Side::Ask,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Ask => write!(f, "ask"),
            Side::Bid => write!(f, "bid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit,
    Market,
    Aon,
    Fok,
}

impl OrderKind {
    /// LIMIT/AON/FOK all carry an explicit price; MARKET is priced at the
    /// book's best opposite price as it walks.
    pub fn has_explicit_price(self) -> bool {
        !matches!(self, OrderKind::Market)
    }

    /// MARKET and FOK never rest on the book; they either fill (fully or
    /// partially for MARKET, fully-or-nothing for FOK) and terminate.
    pub fn never_rests(self) -> bool {
        matches!(self, OrderKind::Market | OrderKind::Fok)
    }

    /// AON/FOK require the opposite side to already exist before placement
    /// is considered (the "maker-candidate" gate in
    /// `original_source/matchengine/me_server.c`'s `check_makers_exist`) --
    /// except AON, which books unconditionally per SPEC_FULL.md #4.5's
    /// resolution of the Open Question, and MARKET, which has its own
    /// explicit non-empty-book precheck. FOK is the one kind gated here.
    pub fn requires_counter_orders_precheck(self) -> bool {
        matches!(self, OrderKind::Fok)
    }
}

/// A live order, as stored in a market's book and indexes.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub kind: OrderKind,
    pub side: Side,
    pub create_time: i64,
    pub update_time: i64,
    pub user_id: UserId,
    pub market: String,
    pub source: String,
    pub price: Dec,
    pub amount: Dec,
    pub left: Dec,
    pub freeze: Dec,
    pub taker_fee: Dec,
    pub maker_fee: Dec,
    pub deal_stock: Dec,
    pub deal_money: Dec,
    pub deal_fee: Dec,
}

impl Order {
    pub fn is_filled(&self) -> bool {
        self.left.is_zero()
    }
}

/// A key identifying an order's position inside a price-time ordered set,
/// without requiring the set to hold the `Order` value itself (the book and
/// by-user index hold this key; `order_by_id` owns the `Order`). See
/// SPEC_FULL.md #9's note on cyclic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AskKey(pub Dec, pub OrderId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BidKey(pub std::cmp::Reverse<Dec>, pub OrderId);

impl BidKey {
    pub fn new(price: Dec, id: OrderId) -> BidKey {
        BidKey(std::cmp::Reverse(price), id)
    }

    pub fn price(&self) -> Dec {
        self.0 .0
    }
}

/// A single executed fill between a taker and a maker.
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub trade_id: uuid::Uuid,
    pub market: String,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub taker_user_id: UserId,
    pub maker_user_id: UserId,
    pub taker_side: Side,
    pub price: Dec,
    pub amount: Dec,
    pub maker_fee: Dec,
    pub taker_fee: Dec,
    pub timestamp: i64,
}
