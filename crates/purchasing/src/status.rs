use serde::{Deserialize, Serialize};

/// Lifecycle of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Draft,
    PendingApproval,
    Approved,
    /// All items fully received.
    Completed,
    Cancelled,
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PurchaseStatus::Draft => "draft",
            PurchaseStatus::PendingApproval => "pending_approval",
            PurchaseStatus::Approved => "approved",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Where the order stands with the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    NotStarted,
    Pending,
    Approved,
    Rejected,
}

/// How the order will be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    BankTransfer,
    Check,
}
