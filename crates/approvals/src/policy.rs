use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::request::{ApprovalRequest, ApprovalStep};
use crate::role::ApproverRole;

/// Routing policy that decides which approval steps a purchase amount needs.
///
/// Policies are data, not trait objects: callers configure one per engine and
/// the variants are matched exhaustively wherever routing decisions happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Finance approves everything; amounts above the threshold also require
    /// a director.
    SimpleThreshold { escalation_threshold: Decimal },
    /// Ordered tiers, each adding an approver once the amount exceeds its
    /// bound. Finance is always the first step regardless of tiers.
    MultiTier { tiers: Vec<Tier> },
}

/// One tier of a [`ApprovalPolicy::MultiTier`] policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Amounts strictly above this bound require `approver`.
    pub above: Decimal,
    pub approver: ApproverRole,
}

impl ApprovalPolicy {
    /// Ordered approver roles for a purchase of `amount`.
    ///
    /// Always returns at least one step.
    pub fn initial_steps(&self, amount: Decimal) -> Vec<ApproverRole> {
        match self {
            ApprovalPolicy::SimpleThreshold {
                escalation_threshold,
            } => {
                if amount > *escalation_threshold {
                    vec![ApproverRole::Finance, ApproverRole::Director]
                } else {
                    vec![ApproverRole::Finance]
                }
            }
            ApprovalPolicy::MultiTier { tiers } => {
                let mut steps = vec![ApproverRole::Finance];
                let mut sorted: Vec<&Tier> = tiers.iter().collect();
                sorted.sort_by(|a, b| a.above.cmp(&b.above));
                for tier in sorted {
                    if amount > tier.above && !steps.contains(&tier.approver) {
                        steps.push(tier.approver);
                    }
                }
                steps
            }
        }
    }

    /// Whether `amount` requires director sign-off under this policy.
    pub fn requires_director(&self, amount: Decimal) -> bool {
        self.initial_steps(amount).contains(&ApproverRole::Director)
    }

    /// The step that must act next on `request`, if any.
    ///
    /// The single resolution surface for deciding who must approve now;
    /// callers never scan steps themselves.
    pub fn next_step<'a>(&self, request: &'a ApprovalRequest) -> Option<&'a ApprovalStep> {
        request.active_step()
    }

    /// The escalation threshold used for priority classification.
    ///
    /// For tiered policies this is the lowest bound that routes to a
    /// director, or zero when no tier does.
    pub fn escalation_threshold(&self) -> Decimal {
        match self {
            ApprovalPolicy::SimpleThreshold {
                escalation_threshold,
            } => *escalation_threshold,
            ApprovalPolicy::MultiTier { tiers } => tiers
                .iter()
                .filter(|t| t.approver == ApproverRole::Director)
                .map(|t| t.above)
                .min()
                .unwrap_or(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn simple_threshold_routes_finance_only_below_bound() {
        let policy = ApprovalPolicy::SimpleThreshold {
            escalation_threshold: dec!(25000000),
        };
        assert_eq!(
            policy.initial_steps(dec!(25000000)),
            vec![ApproverRole::Finance]
        );
    }

    #[test]
    fn simple_threshold_adds_director_above_bound() {
        let policy = ApprovalPolicy::SimpleThreshold {
            escalation_threshold: dec!(25000000),
        };
        assert_eq!(
            policy.initial_steps(dec!(25000001)),
            vec![ApproverRole::Finance, ApproverRole::Director]
        );
        assert!(policy.requires_director(dec!(30000000)));
    }

    #[test]
    fn next_step_resolves_the_active_step() {
        let policy = ApprovalPolicy::SimpleThreshold {
            escalation_threshold: dec!(25000000),
        };
        let request = ApprovalRequest::open(
            procur_core::AggregateId::new(),
            dec!(1000000),
            ApproverRole::Employee,
            &policy,
            chrono::Utc::now(),
        );
        let step = policy.next_step(&request).unwrap();
        assert_eq!(step.approver_role, ApproverRole::Finance);
    }

    #[test]
    fn multi_tier_orders_steps_by_bound_without_duplicates() {
        let policy = ApprovalPolicy::MultiTier {
            tiers: vec![
                Tier {
                    above: dec!(50000000),
                    approver: ApproverRole::Director,
                },
                Tier {
                    above: dec!(10000000),
                    approver: ApproverRole::Owner,
                },
                Tier {
                    above: dec!(20000000),
                    approver: ApproverRole::Owner,
                },
            ],
        };
        assert_eq!(
            policy.initial_steps(dec!(60000000)),
            vec![
                ApproverRole::Finance,
                ApproverRole::Owner,
                ApproverRole::Director,
            ]
        );
        assert_eq!(policy.escalation_threshold(), dec!(50000000));
    }
}
