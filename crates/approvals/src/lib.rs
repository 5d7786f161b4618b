//! Approval workflow engine.
//!
//! An [`ApprovalRequest`] is an ordered chain of role-based steps driven by an
//! [`ApprovalPolicy`]. Approvals advance the chain, rejections terminate it,
//! and finance approvers can escalate to a director step that the policy did
//! not originally route.

pub mod policy;
pub mod request;
pub mod role;

pub use policy::{ApprovalPolicy, Tier};
pub use request::{
    ApprovalOutcome, ApprovalRequest, ApprovalRequestId, ApprovalStep, HistoryAction,
    HistoryEntry, Priority, RequestStatus, StepStatus,
};
pub use role::ApproverRole;
