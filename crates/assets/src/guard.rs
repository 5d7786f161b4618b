use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::AggregateRoot;
use procur_purchasing::{Purchase, PurchaseItemId};
use procur_receiving::Receipt;

use crate::asset::Asset;

/// A receipt line that was flagged for capitalization but produced no asset
/// because one already exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAsset {
    pub purchase_item_id: PurchaseItemId,
    pub reason: String,
}

/// A receipt line whose asset could not be created. Collected, never fatal:
/// one bad line must not block the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetError {
    pub purchase_item_id: PurchaseItemId,
    pub message: String,
}

/// What a capitalization run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapitalizationReport {
    pub created: Vec<Asset>,
    pub skipped: Vec<SkippedAsset>,
    pub errors: Vec<AssetError>,
}

/// Creates assets from flagged receipt lines, exactly once per line.
///
/// Duplicate detection uses two signals: a matching serial number on any
/// existing asset, or a matching computed name whose notes reference the same
/// receipt code. Either one means the asset was already capitalized and the
/// line is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalizationGuard {
    /// Salvage value as a percentage of the acquisition cost.
    pub salvage_percent: Decimal,
    pub useful_life_years: u32,
}

impl CapitalizationGuard {
    pub fn new(salvage_percent: Decimal, useful_life_years: u32) -> Self {
        Self {
            salvage_percent,
            useful_life_years,
        }
    }

    /// Capitalize the flagged lines of `receipt`, skipping anything that
    /// `existing` already covers.
    pub fn capitalize(
        &self,
        purchase: &Purchase,
        receipt: &Receipt,
        existing: &[Asset],
        now: DateTime<Utc>,
    ) -> CapitalizationReport {
        let mut report = CapitalizationReport::default();

        for line in receipt.items().iter().filter(|l| l.capitalize_asset) {
            let Some(item) = purchase.item(line.purchase_item_id) else {
                report.errors.push(AssetError {
                    purchase_item_id: line.purchase_item_id,
                    message: format!(
                        "purchase item {} not found on purchase {}",
                        line.purchase_item_id,
                        purchase.code()
                    ),
                });
                continue;
            };

            let purchase_price = item.unit_price() * Decimal::from(line.quantity_received);
            if purchase_price <= Decimal::ZERO {
                report.errors.push(AssetError {
                    purchase_item_id: line.purchase_item_id,
                    message: format!(
                        "cannot capitalize {} with zero acquisition cost",
                        item.product_name()
                    ),
                });
                continue;
            }

            let name = format!("{} ({})", item.product_name(), purchase.code());
            let serial = line
                .serial_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());

            if let Some(reason) = duplicate_reason(&name, serial, receipt.code(), existing)
                .or_else(|| duplicate_reason(&name, serial, receipt.code(), &report.created))
            {
                report.skipped.push(SkippedAsset {
                    purchase_item_id: line.purchase_item_id,
                    reason,
                });
                continue;
            }

            let salvage_value = purchase_price * self.salvage_percent / Decimal::ONE_HUNDRED;
            report.created.push(Asset::new(
                name,
                serial.map(str::to_owned),
                purchase.id().to_owned(),
                line.purchase_item_id,
                receipt.id().to_owned(),
                purchase_price,
                salvage_value,
                self.useful_life_years,
                format!("Auto-capitalized from receipt {}", receipt.code()),
                now,
            ));
        }

        report
    }
}

fn duplicate_reason(
    name: &str,
    serial: Option<&str>,
    receipt_code: &str,
    assets: &[Asset],
) -> Option<String> {
    if let Some(serial) = serial {
        if assets.iter().any(|a| a.serial_number() == Some(serial)) {
            return Some(format!("asset with serial number {serial} already exists"));
        }
    }
    if assets
        .iter()
        .any(|a| a.name() == name && a.notes().contains(receipt_code))
    {
        return Some(format!(
            "asset {name} was already capitalized from receipt {receipt_code}"
        ));
    }
    None
}
