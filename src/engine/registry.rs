//! Registry of retail brokers with a stable iteration order.

use crate::domain::BrokerName;
use std::collections::HashMap;

/// The retail brokers participating in a game, ordered lexicographically by
/// name. Every per-broker output column follows this order, so it is stable
/// across runs of the same log.
#[derive(Debug, Clone, Default)]
pub struct BrokerRegistry {
    names: Vec<BrokerName>,
    index: HashMap<String, usize>,
}

impl BrokerRegistry {
    /// Build a registry from competition participants. The simulator's own
    /// "default broker" is excluded; duplicates collapse.
    pub fn from_competitors(brokers: impl IntoIterator<Item = BrokerName>) -> Self {
        let mut names: Vec<BrokerName> = brokers
            .into_iter()
            .filter(|b| !b.is_default_broker())
            .collect();
        names.sort();
        names.dedup();

        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str().to_string(), i))
            .collect();

        BrokerRegistry { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a broker in iteration order, None for non-retail
    /// participants.
    pub fn index_of(&self, broker: &BrokerName) -> Option<usize> {
        self.index.get(broker.as_str()).copied()
    }

    pub fn get(&self, index: usize) -> Option<&BrokerName> {
        self.names.get(index)
    }

    pub fn names(&self) -> &[BrokerName] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BrokerName)> {
        self.names.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_BROKER;

    fn registry(names: &[&str]) -> BrokerRegistry {
        BrokerRegistry::from_competitors(names.iter().map(|n| BrokerName::new(*n)))
    }

    #[test]
    fn test_lexicographic_order() {
        let reg = registry(&["crocodile", "AgentUDE", "Maxon"]);
        let ordered: Vec<&str> = reg.names().iter().map(|n| n.as_str()).collect();
        assert_eq!(ordered, vec!["AgentUDE", "Maxon", "crocodile"]);
    }

    #[test]
    fn test_default_broker_excluded() {
        let reg = registry(&["Maxon", DEFAULT_BROKER]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.index_of(&BrokerName::new(DEFAULT_BROKER)), None);
    }

    #[test]
    fn test_index_lookup() {
        let reg = registry(&["B", "A", "C"]);
        assert_eq!(reg.index_of(&BrokerName::new("A")), Some(0));
        assert_eq!(reg.index_of(&BrokerName::new("C")), Some(2));
        assert_eq!(reg.index_of(&BrokerName::new("X")), None);
        assert_eq!(reg.get(1).map(|n| n.as_str()), Some("B"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let reg = registry(&["A", "A", "B"]);
        assert_eq!(reg.len(), 2);
    }
}
