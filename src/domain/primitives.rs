//! Domain primitives: Timeslot, LeadTime, BrokerName, TariffTxType.

use serde::{Deserialize, Serialize};

/// Name of the simulator's own broker, excluded from per-broker output.
pub const DEFAULT_BROKER: &str = "default broker";

/// Index of a simulated timeslot, the scheduling quantum for all events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timeslot(pub i64);

impl Timeslot {
    /// Create a Timeslot from its index.
    pub fn new(index: i64) -> Self {
        Timeslot(index)
    }

    /// Get the underlying index value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Signed distance from `other` to this timeslot.
    pub fn offset_from(&self, other: Timeslot) -> i64 {
        self.0 - other.0
    }

    /// The timeslot `n` steps ahead of this one.
    pub fn plus(&self, n: i64) -> Timeslot {
        Timeslot(self.0 + n)
    }
}

impl std::fmt::Display for Timeslot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Difference between a transaction's target timeslot and the timeslot in
/// which it was posted. Never negative for a retained transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeadTime(pub u32);

impl LeadTime {
    /// Lead time from `posted` to `target`, or None when the target lies in
    /// the past.
    pub fn between(target: Timeslot, posted: Timeslot) -> Option<Self> {
        u32::try_from(target.offset_from(posted)).ok().map(LeadTime)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LeadTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable broker identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrokerName(pub String);

impl BrokerName {
    pub fn new(name: impl Into<String>) -> Self {
        BrokerName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the simulator's own broker.
    pub fn is_default_broker(&self) -> bool {
        self.0 == DEFAULT_BROKER
    }
}

impl std::fmt::Display for BrokerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a tariff transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TariffTxType {
    Consume,
    Produce,
    Periodic,
    Publish,
    Refund,
    Revoke,
    Withdraw,
    Signup,
}

impl TariffTxType {
    /// Whether this transaction kind contributes to a broker's net demand.
    /// Signup is the one kind that does not.
    pub fn affects_net_demand(&self) -> bool {
        !matches!(self, TariffTxType::Signup)
    }
}
