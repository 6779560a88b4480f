//! Order-book snapshot for a single timeslot.

use crate::domain::{Mwh, MwhPrice, Timeslot};
use serde::{Deserialize, Serialize};

/// One standing order on either side of the book. A missing limit price
/// marks a market order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// Signed energy quantity in MWh. Walks only consume its magnitude, so
    /// both sign conventions for the sell side are accepted.
    pub mwh: Mwh,
    /// Limit price in currency per MWh; None for a market order.
    pub limit_price: Option<MwhPrice>,
}

impl OrderBookEntry {
    pub fn limit(mwh: Mwh, price: MwhPrice) -> Self {
        OrderBookEntry {
            mwh,
            limit_price: Some(price),
        }
    }

    pub fn market(mwh: Mwh) -> Self {
        OrderBookEntry {
            mwh,
            limit_price: None,
        }
    }

    pub fn is_market_order(&self) -> bool {
        self.limit_price.is_none()
    }
}

/// Snapshot of standing bids and asks for one timeslot. Replaced wholesale
/// each tick, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub timeslot: Timeslot,
    pub asks: Vec<OrderBookEntry>,
    pub bids: Vec<OrderBookEntry>,
    /// Uniform price the double auction settled at; absent when no trades
    /// occurred in the timeslot.
    pub clearing_price: Option<MwhPrice>,
}

impl OrderBook {
    /// Build a book with both sides put into walk order.
    pub fn new(
        timeslot: Timeslot,
        asks: Vec<OrderBookEntry>,
        bids: Vec<OrderBookEntry>,
        clearing_price: Option<MwhPrice>,
    ) -> Self {
        let mut book = OrderBook {
            timeslot,
            asks,
            bids,
            clearing_price,
        };
        book.normalize();
        book
    }

    /// Sort asks ascending and bids descending by limit price, market orders
    /// first on both sides. Stable, so equal-priced orders keep arrival order.
    pub fn normalize(&mut self) {
        self.asks
            .sort_by(|a, b| match (a.limit_price, b.limit_price) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(pa), Some(pb)) => pa.cmp(&pb),
            });
        self.bids
            .sort_by(|a, b| match (a.limit_price, b.limit_price) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(pa), Some(pb)) => pb.cmp(&pa),
            });
    }

    pub fn has_asks(&self) -> bool {
        !self.asks.is_empty()
    }

    pub fn has_bids(&self) -> bool {
        !self.bids.is_empty()
    }
}
