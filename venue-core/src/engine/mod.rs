pub mod book;
pub mod clock;
pub mod engine;
pub mod error;
pub mod log;
pub mod state;

pub mod prelude {
    pub use super::book::{Fill, OrderBook, PriceLevel, RestingOrder};
    pub use super::clock::{Clock, ManualClock, NextMeta, SystemClock};
    pub use super::engine::{Engine, LedgerAssets};
    pub use super::error::{BookInvariantError, LedgerError};
    pub use super::log::{EventLog, InMemoryEventLog};
    pub use super::state::{Balance, EngineState, OrderRecord};
}
