//! Single-instrument order book: price-level maps, derived price ladders,
//! FIFO queues within a level, and the crossing algorithm.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::domain::events::Event;
use crate::domain::types::{AccountId, Instrument, OrderId, Price, Qty, Side};
use crate::engine::error::BookInvariantError;

/// An order resting in the book, owned exclusively by its `PriceLevel`
/// while it rests. The `index` never holds a handle to it, only a
/// `(Side, price_ticks)` back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub instrument: Instrument,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub remaining: Qty,
}

/// One maker consumed during a match: which order (and whose account, for
/// ledger settlement), at what price (always the maker's own resting price
/// — this is what preserves price improvement for the taker), and how much.
#[derive(Debug, Clone)]
pub struct Fill {
    pub maker_order_id: OrderId,
    pub maker_account_id: AccountId,
    pub maker_price: Price,
    pub qty: Qty,
}

/// FIFO queue of resting orders at a single price. Every order in a level
/// shares the same `price` and `side`; empty levels are never kept around
/// by the owning `OrderBook`.
#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    orders: VecDeque<RestingOrder>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Appends to the tail. Adding a duplicate `order_id` overwrites the
    /// existing entry in place (this must not arise under correct engine
    /// usage).
    pub fn add(&mut self, order: RestingOrder) {
        if let Some(slot) = self.orders.iter_mut().find(|o| o.order_id == order.order_id) {
            *slot = order;
        } else {
            self.orders.push_back(order);
        }
    }

    /// Removes by id; `false` if absent.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        if let Some(pos) = self.orders.iter().position(|o| o.order_id == order_id) {
            self.orders.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn peek_oldest(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    pub fn pop_oldest(&mut self) -> RestingOrder {
        self.orders
            .pop_front()
            .expect("pop_oldest called on an empty price level")
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Decrements `order_id`'s remaining quantity by `qty` (clamped at
    /// zero), evicting it from the queue once it reaches zero. Used by both
    /// live matching and replay so the two paths can't drift apart. Returns
    /// `true` if the order was evicted.
    fn apply_fill(&mut self, order_id: OrderId, qty: i64) -> bool {
        if let Some(pos) = self.orders.iter().position(|o| o.order_id == order_id) {
            let remaining = (self.orders[pos].remaining.0 - qty).max(0);
            self.orders[pos].remaining = Qty(remaining);
            if remaining == 0 {
                self.orders.remove(pos);
                return true;
            }
        }
        false
    }
}

/// A single instrument's order book. Two price-level maps double as the
/// sorted price ladders (a `BTreeMap`'s keys are always in ascending
/// order, so no separate ladder structure is maintained). Best bid is the
/// map's last key, best ask its first.
#[derive(Debug)]
pub struct OrderBook {
    instrument: Instrument,
    bids: BTreeMap<i64, PriceLevel>,
    asks: BTreeMap<i64, PriceLevel>,
    index: HashMap<OrderId, (Side, i64)>,
}

impl OrderBook {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    pub fn top_of_book(&self) -> (Option<i64>, Option<i64>) {
        (self.best_bid(), self.best_ask())
    }

    pub fn level(&self, side: Side, price_ticks: i64) -> Option<&PriceLevel> {
        self.level_map(side).get(&price_ticks)
    }

    fn level_map(&self, side: Side) -> &BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn level_map_mut(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Inserts `price` into the ladder if absent. Read-only counterpart is
    /// `get_level_mut`, which must never be used to paper over a missing
    /// level — only `ensure_level` is allowed to create one.
    fn ensure_level(&mut self, side: Side, price_ticks: i64) -> &mut PriceLevel {
        self.level_map_mut(side)
            .entry(price_ticks)
            .or_insert_with(|| PriceLevel::new(Price(price_ticks)))
    }

    /// Looks up an existing level. Panics (I1 violation) if the ladder and
    /// level map have desynchronized — it never creates a level.
    fn get_level_mut(&mut self, side: Side, price_ticks: i64) -> &mut PriceLevel {
        self.level_map_mut(side)
            .get_mut(&price_ticks)
            .unwrap_or_else(|| panic!("{}", BookInvariantError::LadderDesync(price_ticks)))
    }

    fn remove_level_if_empty(&mut self, side: Side, price_ticks: i64) {
        let is_empty = self
            .level_map(side)
            .get(&price_ticks)
            .map(PriceLevel::is_empty)
            .unwrap_or(false);
        if is_empty {
            self.level_map_mut(side).remove(&price_ticks);
        }
    }

    fn crosses(taker_side: Side, taker_price_ticks: i64, best_opp_price_ticks: i64) -> bool {
        match taker_side {
            Side::Buy => taker_price_ticks >= best_opp_price_ticks,
            Side::Sell => taker_price_ticks <= best_opp_price_ticks,
        }
    }

    /// Probes how much quantity is available at or better than
    /// `limit_price_ticks` on `maker_side` without mutating the book. Used
    /// by `Engine` to evaluate FOK fillability.
    pub fn liquidity_at_or_better(&self, taker_side: Side, limit_price_ticks: i64) -> i64 {
        let maker_side = taker_side.opposite();
        let mut total = 0i64;
        for (price_ticks, level) in self.iter_levels_best_first(maker_side) {
            if !Self::crosses(taker_side, limit_price_ticks, price_ticks) {
                break;
            }
            total += level.orders.iter().map(|o| o.remaining.0).sum::<i64>();
        }
        total
    }

    fn iter_levels_best_first(&self, side: Side) -> Box<dyn Iterator<Item = (i64, &PriceLevel)> + '_> {
        match side {
            // Bids: best is highest price, so walk descending.
            Side::Buy => Box::new(self.bids.iter().rev().map(|(p, l)| (*p, l))),
            // Asks: best is lowest price, so walk ascending.
            Side::Sell => Box::new(self.asks.iter().map(|(p, l)| (*p, l))),
        }
    }

    /// Matches `order` against the opposite side, then — if quantity
    /// remains and `rest` is true — rests it at the tail of its own level.
    /// Returns the fills generated and the quantity left unfilled.
    pub fn place_limit(&mut self, order: RestingOrder, rest: bool) -> (Vec<Fill>, i64) {
        assert_eq!(
            order.instrument, self.instrument,
            "order routed to the wrong instrument's book (venue bug)"
        );

        let taker_side = order.side;
        let maker_side = taker_side.opposite();
        let taker_price_ticks = order.price.0;
        let mut remaining = order.remaining.0;
        let mut fills = Vec::new();

        while remaining > 0 {
            let best_opp = match maker_side {
                Side::Buy => self.best_bid(),
                Side::Sell => self.best_ask(),
            };
            let best_opp = match best_opp {
                Some(p) => p,
                None => break,
            };
            if !Self::crosses(taker_side, taker_price_ticks, best_opp) {
                break;
            }

            loop {
                let level = self.get_level_mut(maker_side, best_opp);
                let (maker_id, maker_account, maker_remaining) = match level.peek_oldest() {
                    Some(o) => (o.order_id, o.account_id.clone(), o.remaining.0),
                    None => break,
                };
                let fill_qty = remaining.min(maker_remaining);
                let evicted = level.apply_fill(maker_id, fill_qty);
                fills.push(Fill {
                    maker_order_id: maker_id,
                    maker_account_id: maker_account,
                    maker_price: Price(best_opp),
                    qty: Qty(fill_qty),
                });
                remaining -= fill_qty;
                if evicted {
                    self.index.remove(&maker_id);
                }
                if remaining == 0 {
                    break;
                }
            }
            self.remove_level_if_empty(maker_side, best_opp);
        }

        if remaining > 0 && rest {
            let mut resting = order;
            resting.remaining = Qty(remaining);
            let order_id = resting.order_id;
            let level = self.ensure_level(taker_side, taker_price_ticks);
            level.add(resting);
            self.index.insert(order_id, (taker_side, taker_price_ticks));
        }

        (fills, remaining)
    }

    /// Removes a resting order by id. Never creates a missing level: a
    /// desynchronized index is an invariant violation and panics instead of
    /// silently fabricating the level `get_level_mut` would need.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        let (side, price_ticks) = match self.index.get(&order_id).copied() {
            Some(loc) => loc,
            None => return false,
        };

        let level = self
            .level_map_mut(side)
            .get_mut(&price_ticks)
            .unwrap_or_else(|| panic!("{}", BookInvariantError::IndexPointsAtMissingLevel(order_id)));

        let removed = level.cancel(order_id);
        if removed {
            self.remove_level_if_empty(side, price_ticks);
            self.index.remove(&order_id);
        }
        removed
    }

    /// Replay hook: reconstructs the book from a previously captured event
    /// stream. `OrderRested` inserts, `TradeOccurred` decrements the maker,
    /// `OrderCanceled` behaves as `cancel`; everything else is a no-op here.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::OrderRested(e) => {
                let level = self.ensure_level(e.side, e.price.0);
                level.add(RestingOrder {
                    order_id: e.order_id,
                    instrument: e.instrument.clone(),
                    account_id: e.account_id.clone(),
                    side: e.side,
                    price: e.price,
                    remaining: e.qty,
                });
                self.index.insert(e.order_id, (e.side, e.price.0));
            }
            Event::TradeOccurred(e) => {
                if let Some((side, price_ticks)) = self.index.get(&e.maker_order_id).copied() {
                    let level = self.get_level_mut(side, price_ticks);
                    let evicted = level.apply_fill(e.maker_order_id, e.qty.0);
                    if evicted {
                        self.index.remove(&e.maker_order_id);
                    }
                    self.remove_level_if_empty(side, price_ticks);
                }
            }
            Event::OrderCanceled(e) => {
                self.cancel(e.order_id);
            }
            _ => {}
        }
    }
}
