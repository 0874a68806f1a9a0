use serde::{Deserialize, Serialize};

/// Discrete interaction risk tier, ordered Low < Moderate < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

/// Map an interaction probability to its risk tier.
///
/// Canonical thresholds: >= 0.85 high, >= 0.70 moderate, else low.
/// Total over all of [0, 1] and monotonic in the probability.
pub fn classify_severity(probability: f64) -> RiskTier {
    if probability >= 0.85 {
        RiskTier::High
    } else if probability >= 0.70 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values() {
        assert_eq!(classify_severity(0.85), RiskTier::High);
        assert_eq!(classify_severity(0.8499), RiskTier::Moderate);
        assert_eq!(classify_severity(0.70), RiskTier::Moderate);
        assert_eq!(classify_severity(0.6999), RiskTier::Low);
        assert_eq!(classify_severity(0.0), RiskTier::Low);
        assert_eq!(classify_severity(1.0), RiskTier::High);
    }

    #[test]
    fn monotonic_over_probability_sweep() {
        let mut previous = RiskTier::Low;
        for step in 0..=1000 {
            let tier = classify_severity(step as f64 / 1000.0);
            assert!(tier >= previous, "tier decreased at p={}", step as f64 / 1000.0);
            previous = tier;
        }
    }

    #[test]
    fn tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Moderate);
        assert!(RiskTier::Moderate < RiskTier::High);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskTier::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&RiskTier::Moderate).unwrap(), "\"moderate\"");
        assert_eq!(serde_json::to_string(&RiskTier::Low).unwrap(), "\"low\"");
    }
}
