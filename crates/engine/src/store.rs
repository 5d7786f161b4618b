//! Persistence contracts.
//!
//! The engine is storage-agnostic: callers plug in whatever backs these
//! traits. Saves take an [`ExpectedVersion`] so concurrent writers to the
//! same aggregate lose deterministically instead of clobbering each other.

use thiserror::Error;

use procur_approvals::ApprovalRequest;
use procur_assets::Asset;
use procur_core::ExpectedVersion;
use procur_purchasing::{Purchase, PurchaseId};
use procur_receiving::Receipt;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Purchase order persistence.
pub trait PurchaseStore: Send + Sync {
    fn get(&self, id: PurchaseId) -> Result<Option<Purchase>, StoreError>;

    /// Persist the purchase. `expected` is the version the caller loaded;
    /// a mismatch means another writer got there first.
    fn save(&self, purchase: &Purchase, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn delete(&self, id: PurchaseId) -> Result<(), StoreError>;
}

/// Goods receipt persistence. Receipts are append-only.
pub trait ReceiptStore: Send + Sync {
    fn insert(&self, receipt: &Receipt) -> Result<(), StoreError>;

    fn list_for_purchase(&self, purchase_id: PurchaseId) -> Result<Vec<Receipt>, StoreError>;
}

/// Fixed asset persistence. Assets are append-only.
pub trait AssetStore: Send + Sync {
    fn insert(&self, asset: &Asset) -> Result<(), StoreError>;

    fn list_for_purchase(&self, purchase_id: PurchaseId) -> Result<Vec<Asset>, StoreError>;
}

/// Approval request persistence, keyed by the purchase it gates.
pub trait ApprovalStore: Send + Sync {
    fn get_for_purchase(
        &self,
        purchase_id: PurchaseId,
    ) -> Result<Option<ApprovalRequest>, StoreError>;

    fn save(
        &self,
        request: &ApprovalRequest,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;
}

/// Monotonic per-bucket counters for document codes.
///
/// Buckets are `(prefix, year, month)`; the first call for a bucket returns 1.
pub trait SequenceStore: Send + Sync {
    fn next(&self, prefix: &str, year: i32, month: u32) -> Result<u32, StoreError>;
}
