//! Imbalance pricing against the prevailing order book.
//!
//! Two questions are answered at end of timeslot. First, what marginal price
//! would the market have required to cover the brokers' aggregate residual
//! imbalance. Second, per broker, what it would have cost to clear that
//! broker's imbalance alone. Both walk one side of the book in price order:
//! asks for a shortage, bids for a surplus.

use crate::config::EstimateMode;
use crate::domain::{Kwh, Money, OrderBook, OrderBookEntry, UnitPrice};
use rust_decimal::Decimal;

/// Why a walk could not be carried out (or not completed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkIssue {
    /// No order book was captured for the timeslot.
    MissingBook,
    /// The side needed for the imbalance sign holds no orders.
    EmptySide,
    /// The side ran out of quantity before the imbalance was covered.
    Exhausted,
}

/// Aggregate marginal price outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    pub price: UnitPrice,
    pub issue: Option<WalkIssue>,
}

impl PriceEstimate {
    fn zero_with(issue: Option<WalkIssue>) -> Self {
        PriceEstimate {
            price: UnitPrice::zero(),
            issue,
        }
    }
}

/// Per-broker clearing cost outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub cost: Money,
    pub issue: Option<WalkIssue>,
}

impl CostEstimate {
    fn zero_with(issue: Option<WalkIssue>) -> Self {
        CostEstimate {
            cost: Money::zero(),
            issue,
        }
    }
}

/// Seed for a walk: the book's clearing price when the auction settled,
/// otherwise the first limit price on the side (market orders carry no
/// price and are skipped).
fn seed_price(book: &OrderBook, side: &[OrderBookEntry]) -> UnitPrice {
    if let Some(clearing) = book.clearing_price {
        return clearing.per_kwh();
    }
    side.iter()
        .find_map(|entry| entry.limit_price)
        .map(|p| p.per_kwh())
        .unwrap_or_else(UnitPrice::zero)
}

/// Marginal price that covers the aggregate imbalance, in currency per kWh.
///
/// A settled clearing price answers directly. Otherwise the relevant side is
/// walked in order, each level's limit price replacing the running marginal
/// as its quantity is consumed; market orders consume quantity at the
/// running marginal without moving it.
pub fn aggregate_marginal_price(book: Option<&OrderBook>, total_imbalance: Kwh) -> PriceEstimate {
    if total_imbalance.is_zero() {
        return PriceEstimate::zero_with(None);
    }
    let Some(book) = book else {
        return PriceEstimate::zero_with(Some(WalkIssue::MissingBook));
    };
    if let Some(clearing) = book.clearing_price {
        return PriceEstimate {
            price: clearing.per_kwh(),
            issue: None,
        };
    }

    let side: &[OrderBookEntry] = if total_imbalance.is_negative() {
        &book.asks
    } else {
        &book.bids
    };
    if side.is_empty() {
        return PriceEstimate::zero_with(Some(WalkIssue::EmptySide));
    }

    let mut marginal = seed_price(book, side);
    let mut remaining = total_imbalance.abs().inner();
    let mut issue = None;

    for entry in side {
        if remaining <= Decimal::ZERO {
            break;
        }
        if let Some(price) = entry.limit_price {
            marginal = price.per_kwh();
        }
        remaining -= entry.mwh.to_kwh().abs().inner();
    }
    if remaining > Decimal::ZERO {
        issue = Some(WalkIssue::Exhausted);
    }

    PriceEstimate {
        price: marginal,
        issue,
    }
}

/// Cost of clearing one broker's imbalance alone, integrating the marginal
/// price over the consumed quantity. Asks are walked for a short broker,
/// bids for a long one. Quantity left uncovered when the side runs dry is
/// priced at the last marginal.
pub fn broker_clearing_cost(book: Option<&OrderBook>, imbalance: Kwh) -> CostEstimate {
    if imbalance.is_zero() {
        return CostEstimate::zero_with(None);
    }
    let Some(book) = book else {
        return CostEstimate::zero_with(Some(WalkIssue::MissingBook));
    };

    let side: &[OrderBookEntry] = if imbalance.is_negative() {
        &book.asks
    } else {
        &book.bids
    };
    if side.is_empty() {
        return CostEstimate::zero_with(Some(WalkIssue::EmptySide));
    }

    let mut marginal = seed_price(book, side);
    let mut need = imbalance.abs().inner();
    let mut cost = Money::zero();
    let mut issue = None;

    for entry in side {
        if need <= Decimal::ZERO {
            break;
        }
        if let Some(price) = entry.limit_price {
            marginal = price.per_kwh();
        }
        let available = entry.mwh.to_kwh().abs().inner();
        let take = available.min(need);
        cost += marginal.cost_for(Kwh::new(take));
        need -= take;
    }
    if need > Decimal::ZERO {
        cost += marginal.cost_for(Kwh::new(need));
        issue = Some(WalkIssue::Exhausted);
    }

    CostEstimate { cost, issue }
}

/// The legacy analyzer's per-broker estimate: walk asks only, marginal
/// seeded at zero, report `marginal x imbalance`. A long broker never enters
/// the loop and reports zero.
pub fn legacy_clearing_cost(book: Option<&OrderBook>, imbalance: Kwh) -> CostEstimate {
    let Some(book) = book else {
        return CostEstimate::zero_with(Some(WalkIssue::MissingBook));
    };

    let mut marginal = UnitPrice::zero();
    let mut remaining = imbalance.inner();
    let mut issue = None;

    for ask in &book.asks {
        if remaining >= Decimal::ZERO {
            break;
        }
        if let Some(price) = ask.limit_price {
            marginal = price.per_kwh();
        }
        remaining += ask.mwh.to_kwh().abs().inner();
    }
    if remaining < Decimal::ZERO {
        issue = Some(WalkIssue::Exhausted);
    }

    CostEstimate {
        cost: marginal.cost_for(imbalance),
        issue,
    }
}

/// Dispatch on the configured estimate mode.
pub fn broker_cost_for_mode(
    mode: EstimateMode,
    book: Option<&OrderBook>,
    imbalance: Kwh,
) -> CostEstimate {
    match mode {
        EstimateMode::Marginal => broker_clearing_cost(book, imbalance),
        EstimateMode::Legacy => legacy_clearing_cost(book, imbalance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mwh, MwhPrice, Timeslot};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn kwh(s: &str) -> Kwh {
        Kwh::new(dec(s))
    }

    fn ask(mwh: &str, price: &str) -> OrderBookEntry {
        OrderBookEntry::limit(Mwh::new(dec(mwh)), MwhPrice::new(dec(price)))
    }

    fn market(mwh: &str) -> OrderBookEntry {
        OrderBookEntry::market(Mwh::new(dec(mwh)))
    }

    fn book_with_asks(asks: Vec<OrderBookEntry>, clearing: Option<&str>) -> OrderBook {
        OrderBook::new(
            Timeslot::new(5),
            asks,
            Vec::new(),
            clearing.map(|c| MwhPrice::new(dec(c))),
        )
    }

    fn book_with_bids(bids: Vec<OrderBookEntry>, clearing: Option<&str>) -> OrderBook {
        OrderBook::new(
            Timeslot::new(5),
            Vec::new(),
            bids,
            clearing.map(|c| MwhPrice::new(dec(c))),
        )
    }

    #[test]
    fn test_zero_imbalance_skips_pricing() {
        let book = book_with_asks(vec![ask("1", "50")], None);
        let est = aggregate_marginal_price(Some(&book), Kwh::zero());
        assert_eq!(est.price, UnitPrice::zero());
        assert_eq!(est.issue, None);
    }

    #[test]
    fn test_missing_book() {
        let est = aggregate_marginal_price(None, kwh("-50"));
        assert_eq!(est.issue, Some(WalkIssue::MissingBook));
        assert_eq!(est.price, UnitPrice::zero());
    }

    #[test]
    fn test_empty_side_for_sign() {
        let book = book_with_asks(vec![ask("1", "50")], None);
        // Long imbalance needs bids; there are none.
        let est = aggregate_marginal_price(Some(&book), kwh("30"));
        assert_eq!(est.issue, Some(WalkIssue::EmptySide));
    }

    #[test]
    fn test_clearing_price_answers_directly() {
        // Long 30 kWh, auction cleared at 45/MWh: no walk needed.
        let book = book_with_bids(vec![ask("0.001", "999")], Some("45"));
        let est = aggregate_marginal_price(Some(&book), kwh("30"));
        assert_eq!(est.price, UnitPrice::new(dec("0.045")));
        assert_eq!(est.issue, None);
        assert_eq!(est.price.cost_for(kwh("30")), Money::new(dec("1.35")));
    }

    #[test]
    fn test_short_walk_marginal_price() {
        // Short 50 kWh against asks (0.02 @ 50), (0.05 @ 60).
        let book = book_with_asks(vec![ask("0.02", "50"), ask("0.05", "60")], None);
        let est = aggregate_marginal_price(Some(&book), kwh("-50"));
        assert_eq!(est.price, UnitPrice::new(dec("0.06")));
        assert_eq!(est.issue, None);
        assert_eq!(est.price.cost_for(kwh("-50")), Money::new(dec("-3")));
    }

    #[test]
    fn test_walk_accepts_negative_ask_quantities() {
        // Simulator logs carry sell-side quantity as negative MWh.
        let book = book_with_asks(vec![ask("-0.02", "50"), ask("-0.05", "60")], None);
        let est = aggregate_marginal_price(Some(&book), kwh("-50"));
        assert_eq!(est.price, UnitPrice::new(dec("0.06")));
    }

    #[test]
    fn test_exhausted_side_retains_last_price() {
        let book = book_with_asks(vec![ask("0.02", "50")], None);
        let est = aggregate_marginal_price(Some(&book), kwh("-50"));
        assert_eq!(est.issue, Some(WalkIssue::Exhausted));
        assert_eq!(est.price, UnitPrice::new(dec("0.05")));
    }

    #[test]
    fn test_market_orders_consume_without_repricing() {
        // Market order first; seed comes from the first priced ask.
        let book = book_with_asks(vec![market("0.04"), ask("0.05", "60")], None);
        let est = aggregate_marginal_price(Some(&book), kwh("-30"));
        // 30 kWh covered entirely by the market order at the seed price.
        assert_eq!(est.price, UnitPrice::new(dec("0.06")));

        let cost = broker_clearing_cost(Some(&book), kwh("-30"));
        // Seed 0.060; market order consumes 30 kWh at the seed.
        assert_eq!(cost.cost, Money::new(dec("1.8")));
        assert_eq!(cost.issue, None);
    }

    #[test]
    fn test_broker_cost_integrates_levels() {
        // 0.050*20 from the first level, 0.060*30 from the second.
        let book = book_with_asks(vec![ask("0.02", "50"), ask("0.05", "60")], None);
        let cost = broker_clearing_cost(Some(&book), kwh("-50"));
        assert_eq!(cost.cost, Money::new(dec("2.8")));
        assert_eq!(cost.issue, None);
    }

    #[test]
    fn test_broker_cost_long_walks_bids() {
        let book = book_with_bids(vec![ask("0.02", "45"), ask("0.05", "40")], None);
        let cost = broker_clearing_cost(Some(&book), kwh("30"));
        // Bids descending: 20 kWh at 0.045, then 10 kWh at 0.040.
        assert_eq!(cost.cost, Money::new(dec("1.3")));
    }

    #[test]
    fn test_broker_cost_exhaustion_prices_remainder_at_last_marginal() {
        let book = book_with_asks(vec![ask("0.02", "50")], None);
        let cost = broker_clearing_cost(Some(&book), kwh("-50"));
        // 20 kWh at 0.050 plus 30 uncovered kWh at the last marginal.
        assert_eq!(cost.cost, Money::new(dec("2.5")));
        assert_eq!(cost.issue, Some(WalkIssue::Exhausted));
    }

    #[test]
    fn test_broker_cost_zero_imbalance() {
        let book = book_with_asks(vec![ask("0.02", "50")], None);
        let cost = broker_clearing_cost(Some(&book), Kwh::zero());
        assert_eq!(cost.cost, Money::zero());
        assert_eq!(cost.issue, None);
    }

    #[test]
    fn test_legacy_reports_price_times_imbalance() {
        let book = book_with_asks(vec![ask("0.02", "50"), ask("0.05", "60")], None);
        let cost = legacy_clearing_cost(Some(&book), kwh("-50"));
        // Marginal lands at 0.060; legacy output keeps the imbalance sign.
        assert_eq!(cost.cost, Money::new(dec("-3")));
    }

    #[test]
    fn test_legacy_is_asymmetric() {
        let book = book_with_asks(vec![ask("0.02", "50")], None);
        let cost = legacy_clearing_cost(Some(&book), kwh("30"));
        assert_eq!(cost.cost, Money::zero());
        assert_eq!(cost.issue, None);
    }

    #[test]
    fn test_legacy_has_no_clearing_seed() {
        // All asks are market orders: legacy marginal stays at zero even
        // with a clearing price present.
        let book = book_with_asks(vec![market("0.1")], Some("45"));
        let cost = legacy_clearing_cost(Some(&book), kwh("-50"));
        assert_eq!(cost.cost, Money::zero());
    }

    #[test]
    fn test_mode_dispatch() {
        let book = book_with_asks(vec![ask("0.02", "50"), ask("0.05", "60")], None);
        let marginal = broker_cost_for_mode(EstimateMode::Marginal, Some(&book), kwh("-50"));
        let legacy = broker_cost_for_mode(EstimateMode::Legacy, Some(&book), kwh("-50"));
        assert_eq!(marginal.cost, Money::new(dec("2.8")));
        assert_eq!(legacy.cost, Money::new(dec("-3")));
    }
}
