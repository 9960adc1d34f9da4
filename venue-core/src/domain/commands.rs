//! Client command surface. A command is the only thing callers submit;
//! `Engine::submit` / `Venue::submit` translate it into an ordered list of
//! domain events.

use super::types::{AccountId, Instrument, OrderId, Price, Qty, Side, TimeInForce};

/// A resting/crossing limit order request.
#[derive(Debug, Clone)]
pub struct PlaceLimit {
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub tif: TimeInForce,
    pub post_only: bool,
    /// Advisory only; never used for sequencing or matching priority.
    pub client_ts_ns: i64,
}

/// A market order request: no price, never rests; any unfilled remainder
/// expires rather than resting or being rejected as a whole.
#[derive(Debug, Clone)]
pub struct PlaceMarket {
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub qty: Qty,
    pub client_ts_ns: i64,
}

/// Cancel a previously accepted, still-active order.
#[derive(Debug, Clone)]
pub struct Cancel {
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub client_ts_ns: i64,
}

/// Tagged union of everything a caller can submit.
#[derive(Debug, Clone)]
pub enum Command {
    PlaceLimit(PlaceLimit),
    PlaceMarket(PlaceMarket),
    Cancel(Cancel),
}

impl Command {
    pub fn instrument(&self) -> &Instrument {
        match self {
            Command::PlaceLimit(c) => &c.instrument,
            Command::PlaceMarket(c) => &c.instrument,
            Command::Cancel(c) => &c.instrument,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Command::PlaceLimit(c) => c.order_id,
            Command::PlaceMarket(c) => c.order_id,
            Command::Cancel(c) => c.order_id,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        match self {
            Command::PlaceLimit(c) => &c.account_id,
            Command::PlaceMarket(c) => &c.account_id,
            Command::Cancel(c) => &c.account_id,
        }
    }
}
