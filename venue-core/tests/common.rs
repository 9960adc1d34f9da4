//! Shared test scaffolding: a fixed instrument, small command builders, and
//! a one-line `Engine` constructor so each test file reads as setup + act +
//! assert without repeating the wiring every time.

use std::sync::Arc;

use venue_core::prelude::*;

pub const INSTR: &str = "BTC-USD";

pub fn instrument() -> Instrument {
    Instrument::from(INSTR)
}

/// A bare engine with a fixed clock and no ledger — the default for tests
/// that only care about matching, not funds.
pub fn engine() -> Engine {
    let next_meta = Arc::new(NextMeta::new(Box::new(ManualClock::new(1))));
    Engine::standalone(instrument(), None, next_meta)
}

/// An engine with a BTC/USD ledger in use.
pub fn engine_with_ledger() -> Engine {
    let next_meta = Arc::new(NextMeta::new(Box::new(ManualClock::new(1))));
    Engine::standalone(
        instrument(),
        Some(LedgerAssets {
            base: Asset::from("BTC"),
            quote: Asset::from("USD"),
        }),
        next_meta,
    )
}

pub fn limit(order_id: u64, account: &str, side: Side, price: i64, qty: i64) -> Command {
    limit_tif(order_id, account, side, price, qty, TimeInForce::Gtc)
}

pub fn limit_tif(order_id: u64, account: &str, side: Side, price: i64, qty: i64, tif: TimeInForce) -> Command {
    Command::PlaceLimit(PlaceLimit {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from(account),
        side,
        price: Price(price),
        qty: Qty(qty),
        tif,
        post_only: false,
        client_ts_ns: 0,
    })
}

pub fn post_only(order_id: u64, account: &str, side: Side, price: i64, qty: i64) -> Command {
    Command::PlaceLimit(PlaceLimit {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from(account),
        side,
        price: Price(price),
        qty: Qty(qty),
        tif: TimeInForce::Gtc,
        post_only: true,
        client_ts_ns: 0,
    })
}

pub fn market(order_id: u64, account: &str, side: Side, qty: i64) -> Command {
    Command::PlaceMarket(PlaceMarket {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from(account),
        side,
        qty: Qty(qty),
        client_ts_ns: 0,
    })
}

pub fn cancel(order_id: u64, account: &str) -> Command {
    Command::Cancel(Cancel {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from(account),
        client_ts_ns: 0,
    })
}

pub fn trades(events: &[Event]) -> Vec<&venue_core::domain::events::TradeOccurred> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::TradeOccurred(t) => Some(t),
            _ => None,
        })
        .collect()
}

pub fn is_rejected(events: &[Event]) -> bool {
    matches!(events.last(), Some(Event::OrderRejected(_)))
}

pub fn rejection_reason(events: &[Event]) -> Option<&'static str> {
    events.iter().find_map(|e| match e {
        Event::OrderRejected(r) => Some(r.reason),
        _ => None,
    })
}
