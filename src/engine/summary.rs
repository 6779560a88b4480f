//! Materialization of per-timeslot output rows.

use crate::config::{BookSource, Config};
use crate::domain::{BrokerName, Kwh, LeadTime, Money, Mwh, Timeslot};
use crate::engine::books::OrderBookStore;
use crate::engine::clock::TimeslotClock;
use crate::engine::estimator::{self, WalkIssue};
use crate::engine::registry::BrokerRegistry;
use crate::engine::ring::AccumulatorRing;
use crate::engine::Diagnostics;
use std::collections::BTreeMap;

/// One broker's figures for one summarized timeslot.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSummary {
    pub broker: BrokerName,
    pub net_demand: Kwh,
    pub market_qty: Kwh,
    pub market_cost: Money,
    pub imbalance: Kwh,
    pub balancing_cost: Money,
    /// Imbalance priced flat at the aggregate marginal.
    pub market_imbalance_cost: Money,
    /// Estimated cost of clearing this broker's imbalance alone.
    pub est_clearing_cost: Money,
}

/// One output row: every broker's figures for a summarized timeslot, in
/// registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub game: String,
    pub timeslot: Timeslot,
    pub brokers: Vec<BrokerSummary>,
}

/// Market activity of one broker at one lead time, for the lead report.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadActivity {
    pub timeslot: Timeslot,
    pub broker: BrokerName,
    pub lead: LeadTime,
    pub mwh: Mwh,
    pub cost: Money,
}

/// Build the output row for timeslot `ts` from the accumulated ring state.
///
/// The aggregate marginal price is derived once from the current book; each
/// broker's clearing-cost estimate then replays its own walk, against the
/// current or previous book per configuration.
#[allow(clippy::too_many_arguments)]
pub fn summarize_timeslot(
    game: &str,
    ts: Timeslot,
    registry: &BrokerRegistry,
    ring: &AccumulatorRing,
    clock: &TimeslotClock,
    books: &OrderBookStore,
    total_imbalance: Kwh,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> SummaryRow {
    let aggregate = estimator::aggregate_marginal_price(books.current(), total_imbalance);
    if let Some(issue) = aggregate.issue {
        diagnostics.record_walk_issue(issue);
        tracing::warn!(
            timeslot = ts.as_i64(),
            total_imbalance = %total_imbalance,
            issue = ?issue,
            "aggregate imbalance pricing incomplete"
        );
    }

    let est_book = match config.book_source {
        BookSource::Current => books.current(),
        BookSource::Previous => books.previous(),
    };

    let mut brokers = Vec::with_capacity(registry.len());
    for (index, broker) in registry.iter() {
        let slot = ring.slot(clock, index, ts);
        let (net_demand, market_qty, market_cost, imbalance, balancing_cost) = match slot {
            Some(slot) => (
                slot.net_demand,
                slot.market_qty,
                slot.market_cost,
                slot.imbalance,
                slot.balancing_cost,
            ),
            None => (
                Kwh::zero(),
                Kwh::zero(),
                Money::zero(),
                Kwh::zero(),
                Money::zero(),
            ),
        };

        let estimate = estimator::broker_cost_for_mode(config.estimate_mode, est_book, imbalance);
        if let Some(issue) = estimate.issue {
            diagnostics.record_walk_issue(issue);
            if issue == WalkIssue::Exhausted {
                tracing::warn!(
                    timeslot = ts.as_i64(),
                    broker = %broker,
                    imbalance = %imbalance,
                    "order book exhausted while estimating clearing cost"
                );
            }
        }

        brokers.push(BrokerSummary {
            broker: broker.clone(),
            net_demand,
            market_qty,
            market_cost,
            imbalance,
            balancing_cost,
            market_imbalance_cost: aggregate.price.cost_for(imbalance),
            est_clearing_cost: estimate.cost,
        });
    }

    SummaryRow {
        game: game.to_string(),
        timeslot: ts,
        brokers,
    }
}

/// Fold the per-slot transaction lists for timeslot `ts` into one activity
/// record per (broker, lead time).
pub fn collect_lead_activity(
    ts: Timeslot,
    registry: &BrokerRegistry,
    ring: &AccumulatorRing,
    clock: &TimeslotClock,
) -> Vec<LeadActivity> {
    let mut activity = Vec::new();
    for (index, broker) in registry.iter() {
        let Some(slot) = ring.slot(clock, index, ts) else {
            continue;
        };
        let mut by_lead: BTreeMap<LeadTime, (Mwh, Money)> = BTreeMap::new();
        for txn in &slot.lead_txns {
            let entry = by_lead.entry(txn.lead).or_insert((Mwh::zero(), Money::zero()));
            entry.0 += txn.mwh;
            entry.1 += txn.price.cost_for(txn.mwh);
        }
        for (lead, (mwh, cost)) in by_lead {
            activity.push(LeadActivity {
                timeslot: ts,
                broker: broker.clone(),
                lead,
                mwh,
                cost,
            });
        }
    }
    activity
}
