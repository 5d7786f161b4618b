//! Purchase order lifecycle orchestration.
//!
//! [`PurchaseLifecycle`] wires the domain crates (purchasing, approvals,
//! receiving, assets, tax) to pluggable stores and collaborators. All
//! persistence goes through the store traits; the in-memory implementations
//! in [`memory`] back the tests and local development.

pub mod codes;
pub mod config;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod memory;
pub mod notify;
pub mod store;

pub use codes::{document_code, GR_PREFIX, PO_PREFIX};
pub use config::EngineConfig;
pub use error::EngineError;
pub use journal::{
    journal_for_payment, journal_for_purchase, JournalAccount, JournalLine, JournalPoster,
    JournalRequest,
};
pub use lifecycle::{
    CreatePurchase, CreateReceipt, CreateReceiptOutcome, PurchaseLifecycle, UpdatePurchase,
};
pub use notify::{Notification, NotificationSender};
pub use store::{
    ApprovalStore, AssetStore, PurchaseStore, ReceiptStore, SequenceStore, StoreError,
};
