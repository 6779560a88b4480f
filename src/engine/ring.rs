//! Fixed-capacity ring of per-broker accumulators.
//!
//! Market transactions settle up to a full trading horizon ahead of the
//! timeslot they are posted in, so each broker keeps one accumulator cell per
//! open timeslot. Cells are addressed `(t - first) mod capacity` and reused
//! after the summarizer clears them.

use crate::domain::{Kwh, LeadTime, Money, Mwh, MwhPrice, Timeslot};
use crate::engine::clock::TimeslotClock;
use thiserror::Error;

/// A market transaction retained in its target slot, tagged with the lead
/// time it was posted at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadTxn {
    pub lead: LeadTime,
    pub mwh: Mwh,
    pub price: MwhPrice,
}

/// Accumulated per-broker figures for one timeslot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrokerSlot {
    /// Algebraic sum of qualifying tariff flows, kWh.
    pub net_demand: Kwh,
    /// Signed balancing residual, kWh; negative means short.
    pub imbalance: Kwh,
    pub balancing_cost: Money,
    /// Wholesale volume, kWh (market MWh are converted on entry).
    pub market_qty: Kwh,
    pub market_cost: Money,
    /// Raw market transactions for this slot, by posting lead time.
    pub lead_txns: Vec<LeadTxn>,
}

impl BrokerSlot {
    pub fn add_demand(&mut self, kwh: Kwh) {
        self.net_demand += kwh;
    }

    /// Record a wholesale trade: volume in kWh, cost at the quoted per-MWh
    /// price, and the raw transaction for lead-time analytics.
    pub fn add_market_tx(&mut self, mwh: Mwh, price: MwhPrice, lead: LeadTime) {
        self.market_qty += mwh.to_kwh();
        self.market_cost += price.cost_for(mwh);
        self.lead_txns.push(LeadTxn { lead, mwh, price });
    }

    /// Reset every field to zero, making the cell reusable.
    pub fn clear(&mut self) {
        *self = BrokerSlot::default();
    }

    pub fn is_cleared(&self) -> bool {
        self.net_demand.is_zero()
            && self.imbalance.is_zero()
            && self.balancing_cost.is_zero()
            && self.market_qty.is_zero()
            && self.market_cost.is_zero()
            && self.lead_txns.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("clock has not started")]
    ClockNotStarted,
    #[error("target timeslot {target} outside window [{current}, {current}+{capacity})")]
    TargetOutOfRange {
        target: Timeslot,
        current: Timeslot,
        capacity: usize,
    },
}

/// One accumulator cell per (broker, open timeslot), stored flat and indexed
/// modulo capacity through the explicitly passed clock.
#[derive(Debug, Clone)]
pub struct AccumulatorRing {
    brokers: usize,
    capacity: usize,
    slots: Vec<BrokerSlot>,
}

impl AccumulatorRing {
    pub fn new(brokers: usize, capacity: usize) -> Self {
        AccumulatorRing {
            brokers,
            capacity,
            slots: vec![BrokerSlot::default(); brokers * capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn broker_count(&self) -> usize {
        self.brokers
    }

    fn flat_index(&self, clock: &TimeslotClock, broker: usize, t: Timeslot) -> Option<usize> {
        debug_assert!(broker < self.brokers);
        let rel = clock.relative_index(t, self.capacity)?;
        Some(broker * self.capacity + rel)
    }

    /// The cell for `broker` at timeslot `t`.
    pub fn slot(&self, clock: &TimeslotClock, broker: usize, t: Timeslot) -> Option<&BrokerSlot> {
        let idx = self.flat_index(clock, broker, t)?;
        self.slots.get(idx)
    }

    /// Mutable cell for `broker` in the clock's current timeslot.
    pub fn current_slot_mut(
        &mut self,
        clock: &TimeslotClock,
        broker: usize,
    ) -> Option<&mut BrokerSlot> {
        let current = clock.current()?;
        let idx = self.flat_index(clock, broker, current)?;
        self.slots.get_mut(idx)
    }

    /// Mutable cell for a settlement timeslot, which must lie inside the
    /// open window `[current, current + capacity)`.
    pub fn future_slot_mut(
        &mut self,
        clock: &TimeslotClock,
        broker: usize,
        target: Timeslot,
    ) -> Result<&mut BrokerSlot, RingError> {
        let current = clock.current().ok_or(RingError::ClockNotStarted)?;
        let offset = target.offset_from(current);
        if offset < 0 || offset >= self.capacity as i64 {
            return Err(RingError::TargetOutOfRange {
                target,
                current,
                capacity: self.capacity,
            });
        }
        let idx = self
            .flat_index(clock, broker, target)
            .ok_or(RingError::ClockNotStarted)?;
        Ok(&mut self.slots[idx])
    }

    /// Clear the cell at timeslot `t` for every broker.
    pub fn clear_at(&mut self, clock: &TimeslotClock, t: Timeslot) {
        for broker in 0..self.brokers {
            if let Some(idx) = self.flat_index(clock, broker, t) {
                self.slots[idx].clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn started_clock(first_enabled: i64, ahead: u32) -> TimeslotClock {
        let mut clock = TimeslotClock::new(ahead);
        clock.on_timeslot_update(Timeslot::new(first_enabled));
        clock
    }

    #[test]
    fn test_market_tx_converts_units() {
        let mut slot = BrokerSlot::default();
        slot.add_market_tx(
            Mwh::new(dec("0.1")),
            MwhPrice::new(dec("-40")),
            LeadTime(0),
        );
        assert_eq!(slot.market_qty, Kwh::new(dec("100")));
        assert_eq!(slot.market_cost, Money::new(dec("-4")));
        assert_eq!(slot.lead_txns.len(), 1);
    }

    #[test]
    fn test_future_write_lands_in_target_cell() {
        let clock = started_clock(6, 1); // current = 5
        let mut ring = AccumulatorRing::new(2, 25);

        let slot = ring
            .future_slot_mut(&clock, 0, Timeslot::new(8))
            .expect("target inside window");
        slot.add_market_tx(Mwh::new(dec("0.2")), MwhPrice::new(dec("-35")), LeadTime(3));

        let read = ring.slot(&clock, 0, Timeslot::new(8)).unwrap();
        assert_eq!(read.market_qty, Kwh::new(dec("200")));
        assert_eq!(read.market_cost, Money::new(dec("-7")));
        // The other broker's cell for the same timeslot is untouched.
        assert!(ring.slot(&clock, 1, Timeslot::new(8)).unwrap().is_cleared());
    }

    #[test]
    fn test_window_boundaries() {
        let clock = started_clock(6, 1); // current = 5
        let mut ring = AccumulatorRing::new(1, 24);

        assert!(ring.future_slot_mut(&clock, 0, Timeslot::new(5)).is_ok());
        assert!(ring
            .future_slot_mut(&clock, 0, Timeslot::new(5 + 23))
            .is_ok());
        assert_eq!(
            ring.future_slot_mut(&clock, 0, Timeslot::new(5 + 24)),
            Err(RingError::TargetOutOfRange {
                target: Timeslot::new(29),
                current: Timeslot::new(5),
                capacity: 24,
            })
        );
        assert!(matches!(
            ring.future_slot_mut(&clock, 0, Timeslot::new(4)),
            Err(RingError::TargetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_clear_at_is_idempotent_and_per_timeslot() {
        let clock = started_clock(6, 1);
        let mut ring = AccumulatorRing::new(1, 25);

        ring.current_slot_mut(&clock, 0)
            .unwrap()
            .add_demand(Kwh::new(dec("-100")));
        ring.future_slot_mut(&clock, 0, Timeslot::new(8))
            .unwrap()
            .add_demand(Kwh::new(dec("5")));

        ring.clear_at(&clock, Timeslot::new(5));
        assert!(ring.slot(&clock, 0, Timeslot::new(5)).unwrap().is_cleared());
        // Future accumulation survives the clear of the current cell.
        assert_eq!(
            ring.slot(&clock, 0, Timeslot::new(8)).unwrap().net_demand,
            Kwh::new(dec("5"))
        );

        ring.clear_at(&clock, Timeslot::new(5));
        assert!(ring.slot(&clock, 0, Timeslot::new(5)).unwrap().is_cleared());
    }

    #[test]
    fn test_cell_reuse_after_wrap() {
        let mut clock = started_clock(6, 1); // current = 5, capacity 4 for a tight wrap
        let mut ring = AccumulatorRing::new(1, 4);

        ring.current_slot_mut(&clock, 0)
            .unwrap()
            .add_demand(Kwh::new(dec("1")));
        ring.clear_at(&clock, Timeslot::new(5));

        // Advance 4 timeslots; ts 9 maps onto the cell ts 5 used.
        for fe in 7..=10 {
            clock.on_timeslot_update(Timeslot::new(fe));
        }
        assert_eq!(
            clock.relative_index(Timeslot::new(9), 4),
            clock.relative_index(Timeslot::new(5), 4)
        );
        assert!(ring.slot(&clock, 0, Timeslot::new(9)).unwrap().is_cleared());
    }

    #[test]
    fn test_before_clock_start() {
        let clock = TimeslotClock::new(1);
        let mut ring = AccumulatorRing::new(1, 24);
        assert!(ring.current_slot_mut(&clock, 0).is_none());
        assert_eq!(
            ring.future_slot_mut(&clock, 0, Timeslot::new(3)),
            Err(RingError::ClockNotStarted)
        );
    }
}
