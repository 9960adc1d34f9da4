//! The event fold: `EngineState` is a pure, deterministic projection of
//! the event log onto order records and the per-account asset ledger.
//! Given the same prefix of events, the resulting state is bit-identical.

use std::collections::HashMap;

use crate::domain::events::Event;
use crate::domain::types::{AccountId, Asset, Instrument, OrderId, OrderStatus, Price, Qty, Side};
use crate::engine::error::LedgerError;

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub instrument: Instrument,
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    pub remaining: Qty,
    pub status: OrderStatus,
}

/// `available + held` for one `(account, asset)` pair. Both halves are
/// always `>= 0`; the sum changes only via `credit`, reservation moves
/// value between the two halves within one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub available: i64,
    pub held: i64,
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub orders: HashMap<OrderId, OrderRecord>,
    balances: HashMap<(AccountId, Asset), Balance>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, order_id: OrderId) -> Option<&OrderRecord> {
        self.orders.get(&order_id)
    }

    pub fn available(&self, account: &AccountId, asset: &Asset) -> i64 {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .map(|b| b.available)
            .unwrap_or(0)
    }

    pub fn held(&self, account: &AccountId, asset: &Asset) -> i64 {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .map(|b| b.held)
            .unwrap_or(0)
    }

    /// Seeds an account's available balance directly — the test/bootstrap
    /// entry point, analogous to a `FundsCredited` event applied out of
    /// band before any commands are submitted.
    pub fn credit(&mut self, account: AccountId, asset: Asset, amount: i64) {
        let balance = self.balances.entry((account, asset)).or_default();
        balance.available += amount;
    }

    fn reserve(&mut self, account: &AccountId, asset: &Asset, amount: i64) {
        let balance = self
            .balances
            .get_mut(&(account.clone(), asset.clone()))
            .unwrap_or_else(|| {
                panic!(
                    "{}",
                    LedgerError::InsufficientAvailable {
                        account: account.clone(),
                        asset: asset.clone(),
                        amount,
                    }
                )
            });
        if balance.available < amount {
            panic!(
                "{}",
                LedgerError::InsufficientAvailable {
                    account: account.clone(),
                    asset: asset.clone(),
                    amount,
                }
            );
        }
        balance.available -= amount;
        balance.held += amount;
    }

    fn release(&mut self, account: &AccountId, asset: &Asset, amount: i64) {
        let balance = self
            .balances
            .get_mut(&(account.clone(), asset.clone()))
            .unwrap_or_else(|| {
                panic!(
                    "{}",
                    LedgerError::InsufficientHeld {
                        account: account.clone(),
                        asset: asset.clone(),
                        amount,
                    }
                )
            });
        if balance.held < amount {
            panic!(
                "{}",
                LedgerError::InsufficientHeld {
                    account: account.clone(),
                    asset: asset.clone(),
                    amount,
                }
            );
        }
        balance.held -= amount;
        balance.available += amount;
    }

    pub fn apply_all(&mut self, events: &[Event]) {
        for e in events {
            self.apply(e);
        }
    }

    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::OrderAccepted(e) => {
                self.orders.insert(
                    e.order_id,
                    OrderRecord {
                        instrument: e.instrument.clone(),
                        order_id: e.order_id,
                        account_id: e.account_id.clone(),
                        side: e.side,
                        price: e.price,
                        qty: e.qty,
                        remaining: e.qty,
                        status: OrderStatus::Active,
                    },
                );
            }
            Event::OrderRested(_) => {
                // The record already exists from OrderAccepted; nothing to change.
            }
            Event::TradeOccurred(e) => {
                for order_id in [e.taker_order_id, e.maker_order_id] {
                    if let Some(record) = self.orders.get_mut(&order_id) {
                        let new_remaining = (record.remaining.0 - e.qty.0).max(0);
                        record.remaining = Qty(new_remaining);
                        if new_remaining == 0 && record.status == OrderStatus::Active {
                            record.status = OrderStatus::Filled;
                        }
                    }
                }
            }
            Event::OrderCanceled(e) => {
                if let Some(record) = self.orders.get_mut(&e.order_id) {
                    if record.status == OrderStatus::Active {
                        record.status = OrderStatus::Canceled;
                    }
                }
            }
            Event::OrderExpired(e) => {
                if let Some(record) = self.orders.get_mut(&e.order_id) {
                    record.status = OrderStatus::Expired;
                }
            }
            Event::OrderRejected(_) | Event::TopOfBookChanged(_) => {}
            Event::FundsCredited(e) => {
                self.credit(e.account_id.clone(), e.asset.clone(), e.amount);
            }
            Event::FundsReserved(e) => {
                self.reserve(&e.account_id, &e.asset, e.amount);
            }
            Event::FundsReleased(e) => {
                self.release(&e.account_id, &e.asset, e.amount);
            }
        }
    }
}
