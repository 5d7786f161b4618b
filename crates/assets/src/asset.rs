use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{AggregateId, AggregateRoot};
use procur_purchasing::{PurchaseId, PurchaseItemId};
use procur_receiving::ReceiptId;

/// Identifier of a fixed asset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(AggregateId);

impl AssetId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A capitalized fixed asset, traced back to the purchase line and receipt
/// that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    /// `<product name> (<purchase code>)`, so the register reads back to the
    /// originating order.
    name: String,
    serial_number: Option<String>,
    purchase_id: PurchaseId,
    purchase_item_id: PurchaseItemId,
    receipt_id: ReceiptId,
    /// Acquisition cost: unit price times quantity received.
    purchase_price: Decimal,
    salvage_value: Decimal,
    useful_life_years: u32,
    /// Mentions the receipt code; also used for duplicate detection.
    notes: String,
    acquired_at: DateTime<Utc>,
    version: u64,
}

impl AggregateRoot for Asset {
    type Id = AssetId;

    fn id(&self) -> &AssetId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Asset {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        serial_number: Option<String>,
        purchase_id: PurchaseId,
        purchase_item_id: PurchaseItemId,
        receipt_id: ReceiptId,
        purchase_price: Decimal,
        salvage_value: Decimal,
        useful_life_years: u32,
        notes: String,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssetId::new(),
            name,
            serial_number,
            purchase_id,
            purchase_item_id,
            receipt_id,
            purchase_price,
            salvage_value,
            useful_life_years,
            notes,
            acquired_at,
            version: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn purchase_id(&self) -> PurchaseId {
        self.purchase_id
    }

    pub fn purchase_item_id(&self) -> PurchaseItemId {
        self.purchase_item_id
    }

    pub fn receipt_id(&self) -> ReceiptId {
        self.receipt_id
    }

    pub fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }

    pub fn salvage_value(&self) -> Decimal {
        self.salvage_value
    }

    pub fn useful_life_years(&self) -> u32 {
        self.useful_life_years
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Straight-line annual depreciation over the useful life.
    pub fn annual_depreciation(&self) -> Decimal {
        if self.useful_life_years == 0 {
            return Decimal::ZERO;
        }
        (self.purchase_price - self.salvage_value) / Decimal::from(self.useful_life_years)
    }

    /// Straight-line monthly depreciation.
    pub fn monthly_depreciation(&self) -> Decimal {
        self.annual_depreciation() / Decimal::from(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset(purchase_price: Decimal, salvage_value: Decimal, life: u32) -> Asset {
        Asset::new(
            "Printer (PO/2026/08/0001)".to_owned(),
            None,
            PurchaseId::new(),
            PurchaseItemId::new(),
            ReceiptId::new(),
            purchase_price,
            salvage_value,
            life,
            "Auto-capitalized from receipt GR/2026/08/0001".to_owned(),
            Utc::now(),
        )
    }

    #[test]
    fn straight_line_depreciation_spreads_the_depreciable_base() {
        let asset = asset(dec!(10000000), dec!(1000000), 5);
        assert_eq!(asset.annual_depreciation(), dec!(1800000));
        assert_eq!(asset.monthly_depreciation(), dec!(150000));
    }

    #[test]
    fn zero_useful_life_depreciates_nothing() {
        let asset = asset(dec!(10000000), dec!(1000000), 0);
        assert_eq!(asset.annual_depreciation(), dec!(0));
    }
}
