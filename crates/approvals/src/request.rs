use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{AggregateId, AggregateRoot, DomainError, DomainResult};

use crate::policy::ApprovalPolicy;
use crate::role::ApproverRole;

/// Identifier of an approval request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalRequestId(AggregateId);

impl ApprovalRequestId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl std::fmt::Display for ApprovalRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle of one approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
    /// Never reached because an earlier step rejected the request.
    Skipped,
}

/// Lifecycle of the request as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Urgency classification derived from the purchase amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// High above the escalation threshold, urgent above twice the threshold.
    ///
    /// A zero threshold disables classification entirely.
    pub fn for_amount(amount: Decimal, escalation_threshold: Decimal) -> Self {
        if escalation_threshold <= Decimal::ZERO {
            Priority::Normal
        } else if amount > escalation_threshold * Decimal::TWO {
            Priority::Urgent
        } else if amount > escalation_threshold {
            Priority::High
        } else {
            Priority::Normal
        }
    }
}

/// One role-based step in the approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub step_order: u32,
    pub approver_role: ApproverRole,
    pub status: StepStatus,
    /// Whether this step is the one currently awaiting action.
    pub is_active: bool,
    pub comments: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    fn pending(step_order: u32, approver_role: ApproverRole, is_active: bool) -> Self {
        Self {
            step_order,
            approver_role,
            status: StepStatus::Pending,
            is_active,
            comments: None,
            acted_at: None,
        }
    }
}

/// What happened to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Submitted,
    Approved,
    Rejected,
    Escalated,
}

/// Immutable audit record appended on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub actor_role: ApproverRole,
    pub comments: Option<String>,
    pub at: DateTime<Utc>,
}

/// Result of an approve/reject call, for the caller to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The chain moved to the next policy-routed step.
    Advanced { next: ApproverRole },
    /// A director step was activated or added outside the original routing.
    Escalated,
    /// Every step approved; the request is terminal.
    FullyApproved,
    /// A step rejected; the request is terminal.
    Rejected,
}

/// An in-flight approval chain for one purchase.
///
/// Terminal requests (approved or rejected) refuse further transitions with
/// `InvalidState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    id: ApprovalRequestId,
    purchase_id: AggregateId,
    amount: Decimal,
    status: RequestStatus,
    priority: Priority,
    steps: Vec<ApprovalStep>,
    history: Vec<HistoryEntry>,
    reject_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    version: u64,
}

impl AggregateRoot for ApprovalRequest {
    type Id = ApprovalRequestId;

    fn id(&self) -> &ApprovalRequestId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl ApprovalRequest {
    /// Open a new request, routing steps per the policy.
    ///
    /// The first step starts active; the rest wait their turn.
    pub fn open(
        purchase_id: AggregateId,
        amount: Decimal,
        submitted_by: ApproverRole,
        policy: &ApprovalPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let steps: Vec<ApprovalStep> = policy
            .initial_steps(amount)
            .into_iter()
            .enumerate()
            .map(|(i, role)| ApprovalStep::pending(i as u32 + 1, role, i == 0))
            .collect();

        Self {
            id: ApprovalRequestId::new(),
            purchase_id,
            amount,
            status: RequestStatus::Pending,
            priority: Priority::for_amount(amount, policy.escalation_threshold()),
            steps,
            history: vec![HistoryEntry {
                action: HistoryAction::Submitted,
                actor_role: submitted_by,
                comments: None,
                at: now,
            }],
            reject_reason: None,
            completed_at: None,
            version: 0,
        }
    }

    pub fn purchase_id(&self) -> AggregateId {
        self.purchase_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn reject_reason(&self) -> Option<&str> {
        self.reject_reason.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The step currently awaiting action.
    ///
    /// Prefers the active pending step; falls back to the first pending step
    /// when the active flag was lost (imported data, partial writes).
    pub fn active_step(&self) -> Option<&ApprovalStep> {
        self.active_step_index().map(|i| &self.steps[i])
    }

    fn active_step_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.is_active && s.status == StepStatus::Pending)
            .or_else(|| {
                self.steps
                    .iter()
                    .position(|s| s.status == StepStatus::Pending)
            })
    }

    /// Approve the current step as `actor`.
    ///
    /// `escalate` lets a finance approver add (or activate) a director step
    /// even when the policy did not route one. When the chain is exhausted
    /// but the policy says the amount needs a director and no director step
    /// exists, one is inferred so legacy requests cannot get stuck.
    pub fn approve(
        &mut self,
        actor: ApproverRole,
        comments: Option<&str>,
        escalate: bool,
        policy: &ApprovalPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<ApprovalOutcome> {
        self.ensure_pending()?;

        let idx = match self.active_step_index() {
            Some(idx) => idx,
            None => {
                if policy.requires_director(self.amount) && !self.has_director_step() {
                    self.append_director_step()
                } else {
                    return Err(DomainError::invalid_state(
                        "approval request has no pending step",
                    ));
                }
            }
        };

        let assigned = self.steps[idx].approver_role;
        if !actor.may_act_for(assigned) {
            return Err(DomainError::not_authorized(format!(
                "step {} is assigned to {assigned}, not {actor}",
                self.steps[idx].step_order
            )));
        }

        {
            let step = &mut self.steps[idx];
            step.status = StepStatus::Approved;
            step.is_active = false;
            step.comments = comments.map(str::to_owned);
            step.acted_at = Some(now);
        }
        self.record(HistoryAction::Approved, actor, comments, now);

        // A finance approver pushes the decision up to a director when asked
        // to escalate or when the amount demands director sign-off. That is
        // the "approved and escalated" path, distinct from full approval.
        let wants_director = assigned == ApproverRole::Finance
            && (escalate || policy.requires_director(self.amount));

        match self.active_step_index() {
            Some(next_idx) => {
                self.steps[next_idx].is_active = true;
                let next = self.steps[next_idx].approver_role;
                if wants_director && next == ApproverRole::Director {
                    self.record(HistoryAction::Escalated, actor, comments, now);
                    Ok(ApprovalOutcome::Escalated)
                } else {
                    Ok(ApprovalOutcome::Advanced { next })
                }
            }
            None if escalate && assigned == ApproverRole::Finance => {
                self.append_director_step();
                self.record(HistoryAction::Escalated, actor, comments, now);
                Ok(ApprovalOutcome::Escalated)
            }
            None => {
                self.status = RequestStatus::Approved;
                self.completed_at = Some(now);
                Ok(ApprovalOutcome::FullyApproved)
            }
        }
    }

    /// Reject the current step as `actor`. Requires a non-empty comment.
    ///
    /// Rejection is terminal: remaining steps are skipped and the request can
    /// never be approved afterwards.
    pub fn reject(
        &mut self,
        actor: ApproverRole,
        comments: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<ApprovalOutcome> {
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(DomainError::validation("rejection requires a comment"));
        }
        self.ensure_pending()?;

        let idx = self.active_step_index().ok_or_else(|| {
            DomainError::invalid_state("approval request has no pending step")
        })?;

        let assigned = self.steps[idx].approver_role;
        if !actor.may_act_for(assigned) {
            return Err(DomainError::not_authorized(format!(
                "step {} is assigned to {assigned}, not {actor}",
                self.steps[idx].step_order
            )));
        }

        {
            let step = &mut self.steps[idx];
            step.status = StepStatus::Rejected;
            step.is_active = false;
            step.comments = Some(comments.to_owned());
            step.acted_at = Some(now);
        }
        for step in &mut self.steps {
            if step.status == StepStatus::Pending {
                step.status = StepStatus::Skipped;
                step.is_active = false;
            }
        }

        self.status = RequestStatus::Rejected;
        self.reject_reason = Some(comments.to_owned());
        self.completed_at = Some(now);
        self.record(HistoryAction::Rejected, actor, Some(comments), now);
        Ok(ApprovalOutcome::Rejected)
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if self.status != RequestStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "approval request is already {}",
                self.status
            )));
        }
        Ok(())
    }

    fn has_director_step(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.approver_role == ApproverRole::Director)
    }

    /// Append a pending director step after the existing chain.
    fn append_director_step(&mut self) -> usize {
        let next_order = self.steps.iter().map(|s| s.step_order).max().unwrap_or(0) + 1;
        self.steps.push(ApprovalStep::pending(
            next_order,
            ApproverRole::Director,
            true,
        ));
        self.steps.len() - 1
    }

    fn record(
        &mut self,
        action: HistoryAction,
        actor_role: ApproverRole,
        comments: Option<&str>,
        at: DateTime<Utc>,
    ) {
        self.history.push(HistoryEntry {
            action,
            actor_role,
            comments: comments.map(str::to_owned),
            at,
        });
        self.version += 1;
    }
}
