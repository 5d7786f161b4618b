use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_approvals::ApprovalPolicy;

/// Tunable behavior of the lifecycle engine.
///
/// Everything amount-sensitive lives here so deployments can change the
/// routing thresholds and tax defaults without touching domain code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How approval steps are routed.
    pub approval_policy: ApprovalPolicy,
    /// PPN percentage applied when a purchase specifies no rates.
    pub default_ppn_rate: Decimal,
    /// Salvage value percentage for capitalized assets.
    pub salvage_percent: Decimal,
    /// Straight-line useful life for capitalized assets.
    pub useful_life_years: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            approval_policy: ApprovalPolicy::SimpleThreshold {
                escalation_threshold: Decimal::from(25_000_000),
            },
            default_ppn_rate: Decimal::from(11),
            salvage_percent: Decimal::from(10),
            useful_life_years: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_deployment() {
        let config = EngineConfig::default();
        assert_eq!(
            config.approval_policy,
            ApprovalPolicy::SimpleThreshold {
                escalation_threshold: Decimal::from(25_000_000)
            }
        );
        assert_eq!(config.default_ppn_rate, Decimal::from(11));
        assert_eq!(config.salvage_percent, Decimal::from(10));
    }

    #[test]
    fn config_parses_from_json() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "approval_policy": { "kind": "simple_threshold", "escalation_threshold": "50000000" },
                "default_ppn_rate": "12",
                "salvage_percent": "5",
                "useful_life_years": 8
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.approval_policy,
            ApprovalPolicy::SimpleThreshold {
                escalation_threshold: Decimal::from(50_000_000)
            }
        );
        assert_eq!(config.useful_life_years, 8);
    }
}
