//! Best-effort notifications.

use serde::{Deserialize, Serialize};

use procur_approvals::ApproverRole;

/// A workflow notification addressed to everyone holding a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_role: ApproverRole,
    pub subject: String,
    pub body: String,
}

/// Delivers workflow notifications.
///
/// Delivery is best-effort: the engine logs failures and carries on, so a
/// down mail server can never block an approval.
pub trait NotificationSender: Send + Sync {
    fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}
