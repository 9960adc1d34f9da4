//! The event surface. Every event carries `(seq, ts_ns, instrument, ..)` and
//! is, once emitted, immutable — the event log is the source of truth from
//! which both `EngineState` and `OrderBook` can be re-derived.

use super::types::{AccountId, Asset, Instrument, OrderId, Price, Qty, Side};

/// Canonical `OrderRejected` reason strings. Kept as associated constants so
/// call sites compare against one spelling; `OrderRejected::reason` itself
/// stays a plain `&'static str`, not an enum, per the external contract.
pub mod reject_reason {
    pub const INSTRUMENT_MISMATCH: &str = "instrument mismatch";
    pub const INSTRUMENT_NOT_FOUND: &str = "instrument not found";
    pub const QTY_MUST_BE_POSITIVE: &str = "qty must be > 0";
    pub const PRICE_MUST_BE_POSITIVE: &str = "price must be > 0";
    pub const DUPLICATE_ORDER_ID: &str = "duplicate order_id";
    pub const UNKNOWN_ORDER_ID: &str = "unknown order_id";
    pub const ORDER_NOT_CANCELABLE: &str = "order not cancelable";
    pub const ORDER_ID_NOT_IN_BOOK: &str = "order_id not in book";
    pub const POST_ONLY_WOULD_CROSS: &str = "post-only order would cross";
    pub const INSUFFICIENT_FUNDS: &str = "insufficient funds";
    pub const FOK_NOT_FILLABLE: &str = "FOK not fillable";
}

#[derive(Debug, Clone)]
pub struct OrderAccepted {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone)]
pub struct OrderRejected {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub reason: &'static str,
}

#[derive(Debug, Clone)]
pub struct OrderRested {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone)]
pub struct OrderCanceled {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct TradeOccurred {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone)]
pub struct OrderExpired {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub order_id: OrderId,
    /// Carried for audit parity with `OrderRested`.
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub reason: &'static str,
}

#[derive(Debug, Clone)]
pub struct TopOfBookChanged {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub best_bid_ticks: Option<i64>,
    pub best_ask_ticks: Option<i64>,
}

// The funds events below carry `instrument` even though the balances they
// describe are conceptually account-scoped, not instrument-scoped: each
// `Engine` owns an independent `EngineState` (and therefore an independent
// ledger namespace, with no cross-instrument transfers), so the instrument
// tag is what lets `Venue::replay` route a merged multi-instrument stream
// back to the engine that emitted it.

#[derive(Debug, Clone)]
pub struct FundsCredited {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub account_id: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct FundsReserved {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub account_id: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct FundsReleased {
    pub seq: u64,
    pub ts_ns: i64,
    pub instrument: Instrument,
    pub account_id: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

/// Tagged union of everything the engine emits.
#[derive(Debug, Clone)]
pub enum Event {
    OrderAccepted(OrderAccepted),
    OrderRejected(OrderRejected),
    OrderRested(OrderRested),
    OrderCanceled(OrderCanceled),
    TradeOccurred(TradeOccurred),
    OrderExpired(OrderExpired),
    TopOfBookChanged(TopOfBookChanged),
    FundsCredited(FundsCredited),
    FundsReserved(FundsReserved),
    FundsReleased(FundsReleased),
}

impl Event {
    pub fn instrument(&self) -> Option<&Instrument> {
        match self {
            Event::OrderAccepted(e) => Some(&e.instrument),
            Event::OrderRejected(e) => Some(&e.instrument),
            Event::OrderRested(e) => Some(&e.instrument),
            Event::OrderCanceled(e) => Some(&e.instrument),
            Event::TradeOccurred(e) => Some(&e.instrument),
            Event::OrderExpired(e) => Some(&e.instrument),
            Event::TopOfBookChanged(e) => Some(&e.instrument),
            Event::FundsCredited(e) => Some(&e.instrument),
            Event::FundsReserved(e) => Some(&e.instrument),
            Event::FundsReleased(e) => Some(&e.instrument),
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Event::OrderAccepted(e) => e.seq,
            Event::OrderRejected(e) => e.seq,
            Event::OrderRested(e) => e.seq,
            Event::OrderCanceled(e) => e.seq,
            Event::TradeOccurred(e) => e.seq,
            Event::OrderExpired(e) => e.seq,
            Event::TopOfBookChanged(e) => e.seq,
            Event::FundsCredited(e) => e.seq,
            Event::FundsReserved(e) => e.seq,
            Event::FundsReleased(e) => e.seq,
        }
    }
}
