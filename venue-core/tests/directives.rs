//! Order-type directives beyond plain GTC matching: post-only and FOK.

mod common;

use crate::common::*;
use venue_core::prelude::*;

#[test]
fn post_only_rejects_when_it_would_cross_and_does_not_trade() {
    let mut e = engine();
    e.submit(limit(1, "a1", Side::Sell, 100, 1));

    let ev = e.submit(post_only(2, "po1", Side::Buy, 100, 1));
    assert_eq!(rejection_reason(&ev), Some(reject_reason::POST_ONLY_WOULD_CROSS));
    assert!(trades(&ev).is_empty());
    assert_eq!(e.book.best_ask(), Some(100));
}

#[test]
fn post_only_rests_when_it_does_not_cross() {
    let mut e = engine();
    e.submit(limit(1, "a1", Side::Sell, 100, 1));

    let ev = e.submit(post_only(2, "po1", Side::Buy, 90, 1));
    assert!(trades(&ev).is_empty());
    assert_eq!(e.book.best_bid(), Some(90));
    assert_eq!(e.book.best_ask(), Some(100));
}

#[test]
fn post_only_sell_checks_against_best_bid() {
    let mut e = engine();
    e.submit(limit(1, "b1", Side::Buy, 100, 1));

    let crossing = e.submit(post_only(2, "po1", Side::Sell, 100, 1));
    assert_eq!(rejection_reason(&crossing), Some(reject_reason::POST_ONLY_WOULD_CROSS));

    let resting = e.submit(post_only(3, "po2", Side::Sell, 110, 1));
    assert!(trades(&resting).is_empty());
    assert_eq!(e.book.best_ask(), Some(110));
}

#[test]
fn fok_non_fillable_is_a_no_op() {
    let mut e = engine();
    e.submit(limit(1, "a1", Side::Sell, 100, 1));
    e.submit(limit(2, "a2", Side::Sell, 100, 2));

    let ev = e.submit(limit_tif(3, "fok1", Side::Buy, 100, 4, TimeInForce::Fok));
    assert_eq!(ev.len(), 1);
    assert_eq!(rejection_reason(&ev), Some(reject_reason::FOK_NOT_FILLABLE));

    assert_eq!(e.book.best_ask(), Some(100));
    assert!(e.submit(cancel(1, "a1")).iter().all(|e| !matches!(e, Event::OrderRejected(_))));
    assert_eq!(e.book.best_ask(), Some(100)); // a2 still rests
}

// Exact boundary is fillable; one lot short rejects without mutation.
#[test]
fn fok_exact_boundary_fills_fully() {
    let mut e = engine();
    e.submit(limit(1, "a1", Side::Sell, 100, 2));
    e.submit(limit(2, "a2", Side::Sell, 100, 3));

    let ev = e.submit(limit_tif(3, "fok1", Side::Buy, 100, 5, TimeInForce::Fok));
    let t = trades(&ev);
    assert_eq!(t.iter().map(|x| x.qty.0).sum::<i64>(), 5);
    assert_eq!(e.book.best_ask(), None);
    assert_eq!(e.book.best_bid(), None); // FOK taker never rests
}

#[test]
fn fok_one_lot_short_rejects_with_no_book_mutation() {
    let mut e = engine();
    e.submit(limit(1, "a1", Side::Sell, 100, 2));
    e.submit(limit(2, "a2", Side::Sell, 100, 3));

    let ev = e.submit(limit_tif(3, "fok1", Side::Buy, 100, 6, TimeInForce::Fok));
    assert_eq!(rejection_reason(&ev), Some(reject_reason::FOK_NOT_FILLABLE));

    let a1 = e.state.order(OrderId(1)).unwrap();
    let a2 = e.state.order(OrderId(2)).unwrap();
    assert_eq!(a1.remaining, Qty(2));
    assert_eq!(a2.remaining, Qty(3));
    assert_eq!(a1.status, OrderStatus::Active);
    assert_eq!(a2.status, OrderStatus::Active);
}

#[test]
fn fok_respects_price_limit_not_just_total_depth() {
    let mut e = engine();
    // Total depth is 5, but 2 of those lots are priced above the FOK limit.
    e.submit(limit(1, "a1", Side::Sell, 100, 3));
    e.submit(limit(2, "a2", Side::Sell, 101, 2));

    let ev = e.submit(limit_tif(3, "fok1", Side::Buy, 100, 4, TimeInForce::Fok));
    assert_eq!(rejection_reason(&ev), Some(reject_reason::FOK_NOT_FILLABLE));
}
