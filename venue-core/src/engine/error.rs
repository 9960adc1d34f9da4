//! Fatal, programmer-bug-class errors. These are distinct from
//! `OrderRejected`: they represent internal invariant violations and are
//! never surfaced to a caller as a rejected command — raising one means
//! the book or ledger has already desynchronized and the operation aborts
//! loudly instead of limping on.

use crate::domain::types::{AccountId, Asset, OrderId};

#[derive(Debug, thiserror::Error)]
pub enum BookInvariantError {
    #[error("order {0} is indexed but its price level is missing")]
    IndexPointsAtMissingLevel(OrderId),
    #[error("price ladder desynchronized from level map at price {0}")]
    LadderDesync(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("reserve {amount} of {asset:?} for {account:?} exceeds available balance")]
    InsufficientAvailable {
        account: AccountId,
        asset: Asset,
        amount: i64,
    },
    #[error("release {amount} of {asset:?} for {account:?} exceeds held balance")]
    InsufficientHeld {
        account: AccountId,
        asset: Asset,
        amount: i64,
    },
}
