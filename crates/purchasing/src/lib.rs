//! Purchase order aggregate and its lifecycle.
//!
//! All mutation goes through transition methods on [`Purchase`]; there is no
//! way to put an order into a state the state machine does not allow.

pub mod item;
pub mod order;
pub mod status;

pub use item::{PurchaseItem, PurchaseItemDraft, PurchaseItemId};
pub use order::{Purchase, PurchaseId};
pub use status::{ApprovalState, PaymentMethod, PurchaseStatus};
