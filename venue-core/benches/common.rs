use std::sync::Arc;

use venue_core::prelude::*;

pub const INSTR: &str = "BTC-USD";

pub fn instrument() -> Instrument {
    Instrument::from(INSTR)
}

pub fn engine() -> Engine {
    let next_meta = Arc::new(NextMeta::new(Box::new(ManualClock::new(1))));
    Engine::standalone(instrument(), None, next_meta)
}

pub fn limit_order(order_id: u64, side: Side, price: i64, qty: i64) -> Command {
    Command::PlaceLimit(PlaceLimit {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from("bench"),
        side,
        price: Price(price),
        qty: Qty(qty),
        tif: TimeInForce::Gtc,
        post_only: false,
        client_ts_ns: 0,
    })
}

pub fn market_order(order_id: u64, side: Side, qty: i64) -> Command {
    Command::PlaceMarket(PlaceMarket {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from("bench"),
        side,
        qty: Qty(qty),
        client_ts_ns: 0,
    })
}

pub fn cancel_order(order_id: u64) -> Command {
    Command::Cancel(Cancel {
        instrument: instrument(),
        order_id: OrderId(order_id),
        account_id: AccountId::from("bench"),
        client_ts_ns: 0,
    })
}
