//! Retention of order books around the current timeslot.

use crate::domain::{OrderBook, Timeslot};

/// Holds the book for the current timeslot, a single-step pending book for
/// the next, and the previous timeslot's book for the legacy estimate path.
/// Books are replaced atomically; nothing is ever merged.
#[derive(Debug, Clone, Default)]
pub struct OrderBookStore {
    current: Option<OrderBook>,
    pending_next: Option<OrderBook>,
    previous: Option<OrderBook>,
}

impl OrderBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a book if it targets the current or next timeslot; anything
    /// else is ignored.
    pub fn observe(&mut self, book: OrderBook, current: Timeslot) {
        if book.timeslot == current {
            self.current = Some(book);
        } else if book.timeslot == current.plus(1) {
            self.pending_next = Some(book);
        } else {
            tracing::trace!(
                book_timeslot = book.timeslot.as_i64(),
                current = current.as_i64(),
                "ignoring order book outside the current window"
            );
        }
    }

    /// Shift at end of timeslot: the pending book becomes current, the old
    /// current becomes previous.
    pub fn advance(&mut self) {
        self.previous = self.current.take();
        self.current = self.pending_next.take();
    }

    pub fn current(&self) -> Option<&OrderBook> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&OrderBook> {
        self.previous.as_ref()
    }

    pub fn pending_next(&self) -> Option<&OrderBook> {
        self.pending_next.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(ts: i64) -> OrderBook {
        OrderBook::new(Timeslot::new(ts), Vec::new(), Vec::new(), None)
    }

    #[test]
    fn test_observe_routes_by_timeslot() {
        let mut store = OrderBookStore::new();
        store.observe(book(5), Timeslot::new(5));
        store.observe(book(6), Timeslot::new(5));
        store.observe(book(9), Timeslot::new(5));

        assert_eq!(store.current().map(|b| b.timeslot.as_i64()), Some(5));
        assert_eq!(store.pending_next().map(|b| b.timeslot.as_i64()), Some(6));
    }

    #[test]
    fn test_replacement_not_merge() {
        let mut store = OrderBookStore::new();
        store.observe(book(5), Timeslot::new(5));
        let replacement = OrderBook::new(
            Timeslot::new(5),
            vec![crate::domain::OrderBookEntry::market(
                crate::domain::Mwh::zero(),
            )],
            Vec::new(),
            None,
        );
        store.observe(replacement, Timeslot::new(5));
        assert_eq!(store.current().map(|b| b.asks.len()), Some(1));
    }

    #[test]
    fn test_advance_shifts_the_queue() {
        let mut store = OrderBookStore::new();
        store.observe(book(5), Timeslot::new(5));
        store.observe(book(6), Timeslot::new(5));

        store.advance();
        assert_eq!(store.previous().map(|b| b.timeslot.as_i64()), Some(5));
        assert_eq!(store.current().map(|b| b.timeslot.as_i64()), Some(6));
        assert!(store.pending_next().is_none());

        store.advance();
        assert_eq!(store.previous().map(|b| b.timeslot.as_i64()), Some(6));
        assert!(store.current().is_none());
    }
}
