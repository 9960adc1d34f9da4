//! `venue_core`: a deterministic, in-process limit-order matching engine.
//!
//! The crate is organized around one idea: the event log is the source of
//! truth, and everything else — the order book, the per-account ledger, the
//! top-of-book a caller observes — is a pure projection of it. `domain`
//! holds the wire-shaped types (commands in, events out); `engine` holds the
//! state machine that folds one onto the other; `venue` routes commands
//! across many instruments sharing one sequence counter.
//!
//! ```
//! use std::sync::Arc;
//! use venue_core::prelude::*;
//!
//! let next_meta = Arc::new(NextMeta::new(Box::new(ManualClock::new(0))));
//! let mut engine = Engine::standalone(Instrument::from("BTC-USD"), None, next_meta);
//!
//! let events = engine.submit(Command::PlaceLimit(PlaceLimit {
//!     instrument: Instrument::from("BTC-USD"),
//!     order_id: OrderId(1),
//!     account_id: AccountId::from("alice"),
//!     side: Side::Buy,
//!     price: Price(100),
//!     qty: Qty(5),
//!     tif: TimeInForce::Gtc,
//!     post_only: false,
//!     client_ts_ns: 0,
//! }));
//! assert!(matches!(events[0], Event::OrderAccepted(_)));
//! ```

pub mod domain;
pub mod engine;
pub mod venue;

pub mod prelude {
    pub use crate::domain::commands::{Cancel, Command, PlaceLimit, PlaceMarket};
    pub use crate::domain::events::{reject_reason, Event};
    pub use crate::domain::types::{
        AccountId, Asset, Instrument, OrderId, OrderStatus, Price, Qty, Side, TimeInForce,
        MARKET_BUY_PRICE, MARKET_SELL_PRICE,
    };
    pub use crate::engine::prelude::*;
    pub use crate::venue::{InstrumentConfig, Venue};
}
