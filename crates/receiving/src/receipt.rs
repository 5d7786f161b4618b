use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procur_core::{AggregateId, AggregateRoot, UserId};
use procur_purchasing::{PurchaseId, PurchaseItemId};

/// Identifier of a goods receipt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(AggregateId);

impl ReceiptId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Whether this receipt closed out the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Partial,
    Complete,
}

/// Physical condition of the goods as recorded at the dock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    #[default]
    Good,
    Damaged,
    Defective,
}

/// One received line, tied back to the purchase item it fulfils.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub purchase_item_id: PurchaseItemId,
    pub quantity_received: i64,
    #[serde(default)]
    pub condition: ItemCondition,
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Whether the goods should become a fixed asset.
    #[serde(default)]
    pub capitalize_asset: bool,
}

/// A recorded goods receipt.
///
/// Receipts are immutable once recorded; corrections are made with a new
/// receipt, never by editing an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    id: ReceiptId,
    /// Document code, e.g. `GR/2026/08/0042`.
    code: String,
    purchase_id: PurchaseId,
    status: ReceiptStatus,
    items: Vec<ReceiptItem>,
    received_by: UserId,
    receipt_date: DateTime<Utc>,
    notes: Option<String>,
    version: u64,
}

impl AggregateRoot for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &ReceiptId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Receipt {
    pub fn record(
        code: String,
        purchase_id: PurchaseId,
        status: ReceiptStatus,
        items: Vec<ReceiptItem>,
        received_by: UserId,
        receipt_date: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            code,
            purchase_id,
            status,
            items,
            received_by,
            receipt_date,
            notes,
            version: 0,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn purchase_id(&self) -> PurchaseId {
        self.purchase_id
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn items(&self) -> &[ReceiptItem] {
        &self.items
    }

    pub fn received_by(&self) -> UserId {
        self.received_by
    }

    pub fn receipt_date(&self) -> DateTime<Utc> {
        self.receipt_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}
