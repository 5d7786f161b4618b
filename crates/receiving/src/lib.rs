//! Goods receipt recording and reconciliation.
//!
//! Planning is pure: given a purchase, its prior receipts and a requested
//! delivery, [`plan_receipt`] decides what can still be received. Quantities
//! above the remaining balance are clamped, never rejected: warehouse staff
//! record what actually arrived.

pub mod plan;
pub mod receipt;

pub use plan::{
    plan_receipt, received_per_item, remaining_quantities, DroppedItem, ReceiptDraftItem,
    ReceiptPlan, ReceiptPlanOutcome,
};
pub use receipt::{ItemCondition, Receipt, ReceiptId, ReceiptItem, ReceiptStatus};
