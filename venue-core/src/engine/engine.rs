//! The per-instrument command state machine: `submit` dispatches a
//! `Command` to a typed handler, folds the resulting events into
//! `EngineState` and the `OrderBook`, and appends them to the `EventLog`.
//! Everything downstream of dispatch — settlement, top-of-book diffing,
//! replay — lives here so `OrderBook` and `EngineState` can stay pure data
//! structures with no notion of commands.

use std::sync::Arc;

use tracing::{instrument as trace_instrument, trace};

use crate::domain::commands::{Cancel, Command, PlaceLimit, PlaceMarket};
use crate::domain::events::{
    reject_reason, Event, FundsCredited, FundsReleased, FundsReserved, OrderAccepted,
    OrderCanceled, OrderExpired, OrderRejected, OrderRested, TopOfBookChanged, TradeOccurred,
};
use crate::domain::types::{
    AccountId, Asset, Instrument, OrderId, OrderStatus, Price, Qty, Side, TimeInForce,
    MARKET_BUY_PRICE, MARKET_SELL_PRICE,
};
use crate::engine::book::{OrderBook, RestingOrder};
use crate::engine::clock::NextMeta;
use crate::engine::log::{EventLog, InMemoryEventLog};
use crate::engine::state::EngineState;

/// Which two assets a `PlaceLimit`/`PlaceMarket` command moves, and in which
/// direction, for this instrument. `None` on `Engine` means no ledger is in
/// use: the funds check and all `Funds*` events are skipped entirely, so
/// matching-only callers never need to seed a ledger at all.
#[derive(Debug, Clone)]
pub struct LedgerAssets {
    pub base: Asset,
    pub quote: Asset,
}

/// One instrument's matching engine: owns its book, its state, its event
/// log, and (optionally) its ledger namespace. A `Venue` hands every command
/// to the `Engine` for the instrument it names; an `Engine` can just as well
/// be used on its own.
pub struct Engine {
    instrument: Instrument,
    ledger: Option<LedgerAssets>,
    next_meta: Arc<NextMeta>,
    pub state: EngineState,
    pub book: OrderBook,
    log: Box<dyn EventLog>,
}

impl Engine {
    pub fn new(
        instrument: Instrument,
        ledger: Option<LedgerAssets>,
        next_meta: Arc<NextMeta>,
        log: Box<dyn EventLog>,
    ) -> Self {
        Self {
            book: OrderBook::new(instrument.clone()),
            instrument,
            ledger,
            next_meta,
            state: EngineState::new(),
            log,
        }
    }

    /// Convenience constructor for an engine not shared with a `Venue`.
    pub fn standalone(instrument: Instrument, ledger: Option<LedgerAssets>, next_meta: Arc<NextMeta>) -> Self {
        Self::new(instrument, ledger, next_meta, Box::new(InMemoryEventLog::new()))
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn ledger_in_use(&self) -> bool {
        self.ledger.is_some()
    }

    /// Rebuilds an engine from a previously captured event stream.
    /// Events for another instrument are silently skipped — `Venue::replay`
    /// is responsible for partitioning the merged stream up front and
    /// treating a stray instrument as fatal.
    pub fn replay(
        instrument: Instrument,
        ledger: Option<LedgerAssets>,
        events: Vec<Event>,
        next_meta: Arc<NextMeta>,
        rebuild_book: bool,
    ) -> Self {
        let mut engine = Self::new(instrument.clone(), ledger, next_meta, Box::new(InMemoryEventLog::new()));
        for event in events {
            if event.instrument() != Some(&instrument) {
                continue;
            }
            if rebuild_book {
                engine.book.apply_event(&event);
            }
            engine.state.apply(&event);
            engine.log.append(event);
        }
        engine
    }

    /// Submits one command, producing the ordered list of events it caused.
    /// Every event returned has already been appended to the log and folded
    /// into `state`; `book` reflects the same mutation since matching runs
    /// inline with dispatch.
    #[trace_instrument(skip(self, command), fields(instrument = %self.instrument))]
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        if command.instrument() != &self.instrument {
            let (seq, ts_ns) = self.next_meta.next();
            let event = Event::OrderRejected(OrderRejected {
                seq,
                ts_ns,
                instrument: command.instrument().clone(),
                order_id: command.order_id(),
                reason: reject_reason::INSTRUMENT_MISMATCH,
            });
            self.state.apply(&event);
            self.log.append(event.clone());
            return vec![event];
        }

        let top_before = self.book.top_of_book();
        let mut events = match &command {
            Command::PlaceLimit(c) => self.handle_place_limit(c),
            Command::PlaceMarket(c) => self.handle_place_market(c),
            Command::Cancel(c) => self.handle_cancel(c),
        };
        let top_after = self.book.top_of_book();

        if top_after != top_before {
            let (seq, ts_ns) = self.next_meta.next();
            events.push(Event::TopOfBookChanged(TopOfBookChanged {
                seq,
                ts_ns,
                instrument: self.instrument.clone(),
                best_bid_ticks: top_after.0,
                best_ask_ticks: top_after.1,
            }));
        }

        for event in &events {
            self.state.apply(event);
        }
        self.log.extend(events.clone());

        trace!(count = events.len(), "command settled");
        events
    }

    fn reject(&self, order_id: OrderId, reason: &'static str) -> Event {
        let (seq, ts_ns) = self.next_meta.next();
        Event::OrderRejected(OrderRejected {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            order_id,
            reason,
        })
    }

    fn accepted(&self, order_id: OrderId, account_id: AccountId, side: Side, price: Price, qty: Qty) -> Event {
        let (seq, ts_ns) = self.next_meta.next();
        Event::OrderAccepted(OrderAccepted {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            order_id,
            account_id,
            side,
            price,
            qty,
        })
    }

    fn reserved(&self, account_id: AccountId, asset: Asset, amount: i64) -> Event {
        let (seq, ts_ns) = self.next_meta.next();
        Event::FundsReserved(FundsReserved {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            account_id,
            asset,
            amount,
        })
    }

    fn released(&self, account_id: AccountId, asset: Asset, amount: i64) -> Event {
        let (seq, ts_ns) = self.next_meta.next();
        Event::FundsReleased(FundsReleased {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            account_id,
            asset,
            amount,
        })
    }

    fn credited(&self, account_id: AccountId, asset: Asset, amount: i64) -> Event {
        let (seq, ts_ns) = self.next_meta.next();
        Event::FundsCredited(FundsCredited {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            account_id,
            asset,
            amount,
        })
    }

    /// Consumes `amount_given` of `asset_given` from `account`'s existing
    /// hold without changing its available balance (release the hold, then
    /// immediately debit the same amount back out) and credits the asset it
    /// receives in exchange. Used for any leg that was reserved ahead of
    /// time — always true for a maker, true for a GTC taker.
    fn settle_from_hold(
        &self,
        events: &mut Vec<Event>,
        account: &AccountId,
        asset_given: &Asset,
        amount_given: i64,
        asset_received: &Asset,
        amount_received: i64,
    ) {
        if amount_given > 0 {
            events.push(self.released(account.clone(), asset_given.clone(), amount_given));
            events.push(self.credited(account.clone(), asset_given.clone(), -amount_given));
        }
        if amount_received > 0 {
            events.push(self.credited(account.clone(), asset_received.clone(), amount_received));
        }
    }

    /// Same exchange as `settle_from_hold` but for a leg that was never
    /// reserved — an IOC/FOK/market taker pays directly out of available.
    fn settle_direct(
        &self,
        events: &mut Vec<Event>,
        account: &AccountId,
        asset_given: &Asset,
        amount_given: i64,
        asset_received: &Asset,
        amount_received: i64,
    ) {
        if amount_given > 0 {
            events.push(self.credited(account.clone(), asset_given.clone(), -amount_given));
        }
        if amount_received > 0 {
            events.push(self.credited(account.clone(), asset_received.clone(), amount_received));
        }
    }

    fn handle_place_limit(&mut self, cmd: &PlaceLimit) -> Vec<Event> {
        if cmd.qty.0 <= 0 {
            return vec![self.reject(cmd.order_id, reject_reason::QTY_MUST_BE_POSITIVE)];
        }
        if cmd.price.0 <= 0 {
            return vec![self.reject(cmd.order_id, reject_reason::PRICE_MUST_BE_POSITIVE)];
        }
        if self.state.order(cmd.order_id).is_some() {
            return vec![self.reject(cmd.order_id, reject_reason::DUPLICATE_ORDER_ID)];
        }

        if cmd.post_only {
            let crosses = match cmd.side {
                Side::Buy => self.book.best_ask().is_some_and(|ask| cmd.price.0 >= ask),
                Side::Sell => self.book.best_bid().is_some_and(|bid| cmd.price.0 <= bid),
            };
            if crosses {
                return vec![self.reject(cmd.order_id, reject_reason::POST_ONLY_WOULD_CROSS)];
            }
        }

        if let Some(assets) = self.ledger.clone() {
            let (asset, required) = match cmd.side {
                Side::Buy => (assets.quote, cmd.qty.0 * cmd.price.0),
                Side::Sell => (assets.base, cmd.qty.0),
            };
            if self.state.available(&cmd.account_id, &asset) < required {
                return vec![self.reject(cmd.order_id, reject_reason::INSUFFICIENT_FUNDS)];
            }
        }

        if cmd.tif == TimeInForce::Fok {
            let liquidity = self.book.liquidity_at_or_better(cmd.side, cmd.price.0);
            if liquidity < cmd.qty.0 {
                return vec![self.reject(cmd.order_id, reject_reason::FOK_NOT_FILLABLE)];
            }
        }

        let mut events = vec![self.accepted(cmd.order_id, cmd.account_id.clone(), cmd.side, cmd.price, cmd.qty)];

        if cmd.tif == TimeInForce::Gtc {
            if let Some(assets) = &self.ledger {
                let (asset, amount) = match cmd.side {
                    Side::Buy => (assets.quote.clone(), cmd.qty.0 * cmd.price.0),
                    Side::Sell => (assets.base.clone(), cmd.qty.0),
                };
                events.push(self.reserved(cmd.account_id.clone(), asset, amount));
            }
        }

        let rest = cmd.tif == TimeInForce::Gtc;
        let (fills, remaining) = self.book.place_limit(
            RestingOrder {
                order_id: cmd.order_id,
                instrument: cmd.instrument.clone(),
                account_id: cmd.account_id.clone(),
                side: cmd.side,
                price: cmd.price,
                remaining: cmd.qty,
            },
            rest,
        );

        let mut filled_qty = 0i64;
        let mut filled_notional = 0i64;

        for fill in &fills {
            let (seq, ts_ns) = self.next_meta.next();
            events.push(Event::TradeOccurred(TradeOccurred {
                seq,
                ts_ns,
                instrument: self.instrument.clone(),
                taker_order_id: cmd.order_id,
                maker_order_id: fill.maker_order_id,
                price: fill.maker_price,
                qty: fill.qty,
            }));

            if let Some(assets) = self.ledger.clone() {
                let notional = fill.maker_price.0 * fill.qty.0;
                filled_qty += fill.qty.0;
                filled_notional += notional;

                match cmd.side {
                    Side::Buy => {
                        if cmd.tif == TimeInForce::Gtc {
                            self.settle_from_hold(&mut events, &cmd.account_id, &assets.quote, notional, &assets.base, fill.qty.0);
                        } else {
                            self.settle_direct(&mut events, &cmd.account_id, &assets.quote, notional, &assets.base, fill.qty.0);
                        }
                        // The maker is always a resting GTC order — it always had a hold.
                        self.settle_from_hold(&mut events, &fill.maker_account_id, &assets.base, fill.qty.0, &assets.quote, notional);
                    }
                    Side::Sell => {
                        if cmd.tif == TimeInForce::Gtc {
                            self.settle_from_hold(&mut events, &cmd.account_id, &assets.base, fill.qty.0, &assets.quote, notional);
                        } else {
                            self.settle_direct(&mut events, &cmd.account_id, &assets.base, fill.qty.0, &assets.quote, notional);
                        }
                        self.settle_from_hold(&mut events, &fill.maker_account_id, &assets.quote, notional, &assets.base, fill.qty.0);
                    }
                }
            }
        }

        // A GTC buy reserves at its own limit price; if matches traded at a
        // better (lower) maker price, the difference was never actually
        // owed and must flow back to available now rather than sit stranded
        // in the hold for the remaining lots. A GTC sell's hold is quantity-
        // denominated, so no such excess is possible on that side.
        if cmd.tif == TimeInForce::Gtc && cmd.side == Side::Buy && filled_qty > 0 {
            if let Some(assets) = &self.ledger {
                let excess = filled_qty * cmd.price.0 - filled_notional;
                if excess > 0 {
                    events.push(self.released(cmd.account_id.clone(), assets.quote.clone(), excess));
                }
            }
        }

        if remaining > 0 {
            match cmd.tif {
                TimeInForce::Gtc => {
                    let (seq, ts_ns) = self.next_meta.next();
                    events.push(Event::OrderRested(OrderRested {
                        seq,
                        ts_ns,
                        instrument: self.instrument.clone(),
                        order_id: cmd.order_id,
                        account_id: cmd.account_id.clone(),
                        side: cmd.side,
                        price: cmd.price,
                        qty: Qty(remaining),
                    }));
                }
                TimeInForce::Ioc => {
                    let (seq, ts_ns) = self.next_meta.next();
                    events.push(Event::OrderExpired(OrderExpired {
                        seq,
                        ts_ns,
                        instrument: self.instrument.clone(),
                        order_id: cmd.order_id,
                        side: cmd.side,
                        price: cmd.price,
                        qty: Qty(remaining),
                        reason: "IOC",
                    }));
                }
                TimeInForce::Fok => {
                    unreachable!("FOK fillability was probed before matching; it cannot leave a remainder")
                }
            }
        }

        events
    }

    fn handle_place_market(&mut self, cmd: &PlaceMarket) -> Vec<Event> {
        if cmd.qty.0 <= 0 {
            return vec![self.reject(cmd.order_id, reject_reason::QTY_MUST_BE_POSITIVE)];
        }
        if self.state.order(cmd.order_id).is_some() {
            return vec![self.reject(cmd.order_id, reject_reason::DUPLICATE_ORDER_ID)];
        }

        if let Some(assets) = self.ledger.clone() {
            match cmd.side {
                Side::Buy => {
                    if let Some(best_ask) = self.book.best_ask() {
                        let estimate = best_ask * cmd.qty.0;
                        if self.state.available(&cmd.account_id, &assets.quote) < estimate {
                            return vec![self.reject(cmd.order_id, reject_reason::INSUFFICIENT_FUNDS)];
                        }
                    }
                }
                Side::Sell => {
                    if self.state.available(&cmd.account_id, &assets.base) < cmd.qty.0 {
                        return vec![self.reject(cmd.order_id, reject_reason::INSUFFICIENT_FUNDS)];
                    }
                }
            }
        }

        let probe_price = match cmd.side {
            Side::Buy => MARKET_BUY_PRICE,
            Side::Sell => MARKET_SELL_PRICE,
        };

        let mut events = vec![self.accepted(cmd.order_id, cmd.account_id.clone(), cmd.side, probe_price, cmd.qty)];

        let (fills, remaining) = self.book.place_limit(
            RestingOrder {
                order_id: cmd.order_id,
                instrument: cmd.instrument.clone(),
                account_id: cmd.account_id.clone(),
                side: cmd.side,
                price: probe_price,
                remaining: cmd.qty,
            },
            false,
        );

        for fill in &fills {
            let (seq, ts_ns) = self.next_meta.next();
            events.push(Event::TradeOccurred(TradeOccurred {
                seq,
                ts_ns,
                instrument: self.instrument.clone(),
                taker_order_id: cmd.order_id,
                maker_order_id: fill.maker_order_id,
                price: fill.maker_price,
                qty: fill.qty,
            }));

            if let Some(assets) = self.ledger.clone() {
                let notional = fill.maker_price.0 * fill.qty.0;
                match cmd.side {
                    Side::Buy => {
                        self.settle_direct(&mut events, &cmd.account_id, &assets.quote, notional, &assets.base, fill.qty.0);
                        self.settle_from_hold(&mut events, &fill.maker_account_id, &assets.base, fill.qty.0, &assets.quote, notional);
                    }
                    Side::Sell => {
                        self.settle_direct(&mut events, &cmd.account_id, &assets.base, fill.qty.0, &assets.quote, notional);
                        self.settle_from_hold(&mut events, &fill.maker_account_id, &assets.quote, notional, &assets.base, fill.qty.0);
                    }
                }
            }
        }

        if remaining > 0 {
            let (seq, ts_ns) = self.next_meta.next();
            events.push(Event::OrderExpired(OrderExpired {
                seq,
                ts_ns,
                instrument: self.instrument.clone(),
                order_id: cmd.order_id,
                side: cmd.side,
                price: probe_price,
                qty: Qty(remaining),
                reason: "unfilled",
            }));
        }

        events
    }

    fn handle_cancel(&mut self, cmd: &Cancel) -> Vec<Event> {
        let record = match self.state.order(cmd.order_id) {
            Some(r) => r.clone(),
            None => return vec![self.reject(cmd.order_id, reject_reason::UNKNOWN_ORDER_ID)],
        };
        if record.status != OrderStatus::Active {
            return vec![self.reject(cmd.order_id, reject_reason::ORDER_NOT_CANCELABLE)];
        }
        if !self.book.cancel(cmd.order_id) {
            return vec![self.reject(cmd.order_id, reject_reason::ORDER_ID_NOT_IN_BOOK)];
        }

        let (seq, ts_ns) = self.next_meta.next();
        let mut events = vec![Event::OrderCanceled(OrderCanceled {
            seq,
            ts_ns,
            instrument: self.instrument.clone(),
            order_id: cmd.order_id,
        })];

        if let Some(assets) = &self.ledger {
            let (asset, amount) = match record.side {
                Side::Buy => (assets.quote.clone(), record.remaining.0 * record.price.0),
                Side::Sell => (assets.base.clone(), record.remaining.0),
            };
            if amount > 0 {
                events.push(self.released(record.account_id.clone(), asset, amount));
            }
        }

        events
    }
}
