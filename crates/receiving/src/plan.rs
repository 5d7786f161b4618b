//! Pure reconciliation of deliveries against a purchase.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use procur_core::{DomainError, DomainResult};
use procur_purchasing::{Purchase, PurchaseItemId};

use crate::receipt::{ItemCondition, Receipt, ReceiptItem};

/// Requested delivery line, as entered at the dock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraftItem {
    pub purchase_item_id: PurchaseItemId,
    pub quantity_received: i64,
    #[serde(default)]
    pub condition: ItemCondition,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub capitalize_asset: bool,
}

/// A requested line that could not be received at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedItem {
    pub purchase_item_id: PurchaseItemId,
    pub requested: i64,
}

/// What a delivery will actually record.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptPlan {
    /// Lines to record, with quantities clamped to the remaining balance.
    pub accepted: Vec<ReceiptItem>,
    /// Lines whose items had no remaining balance.
    pub dropped: Vec<DroppedItem>,
    /// Whether every purchase item is fully received once this plan lands.
    pub fully_received_after: bool,
}

/// Outcome of planning a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptPlanOutcome {
    Planned(ReceiptPlan),
    /// Every requested line was already fully received. Not an error; the
    /// caller reports it and records nothing.
    NothingToReceive,
}

/// Total quantity received per purchase item across `receipts`.
pub fn received_per_item(receipts: &[Receipt]) -> HashMap<PurchaseItemId, i64> {
    let mut totals = HashMap::new();
    for receipt in receipts {
        for item in receipt.items() {
            *totals.entry(item.purchase_item_id).or_insert(0) += item.quantity_received;
        }
    }
    totals
}

/// Remaining receivable quantity per purchase item, floored at zero.
pub fn remaining_quantities(
    purchase: &Purchase,
    receipts: &[Receipt],
) -> HashMap<PurchaseItemId, i64> {
    let received = received_per_item(receipts);
    purchase
        .items()
        .iter()
        .map(|item| {
            let got = received.get(&item.id()).copied().unwrap_or(0);
            (item.id(), (item.quantity() - got).max(0))
        })
        .collect()
}

/// Plan a delivery against what is still receivable.
///
/// Quantities above an item's remaining balance are clamped; lines against
/// fully-received items are dropped. Unknown item references and non-positive
/// quantities are caller errors.
pub fn plan_receipt(
    purchase: &Purchase,
    prior_receipts: &[Receipt],
    requested: &[ReceiptDraftItem],
) -> DomainResult<ReceiptPlanOutcome> {
    if requested.is_empty() {
        return Err(DomainError::validation(
            "a receipt must have at least one item",
        ));
    }

    let mut remaining = remaining_quantities(purchase, prior_receipts);

    let mut accepted = Vec::new();
    let mut dropped = Vec::new();
    for draft in requested {
        if draft.quantity_received <= 0 {
            return Err(DomainError::validation(format!(
                "quantity_received must be positive (got {})",
                draft.quantity_received
            )));
        }
        let balance = remaining.get_mut(&draft.purchase_item_id).ok_or_else(|| {
            DomainError::validation(format!(
                "purchase item {} does not belong to purchase {}",
                draft.purchase_item_id,
                purchase.code()
            ))
        })?;

        let quantity = draft.quantity_received.min(*balance);
        if quantity == 0 {
            dropped.push(DroppedItem {
                purchase_item_id: draft.purchase_item_id,
                requested: draft.quantity_received,
            });
            continue;
        }
        *balance -= quantity;
        accepted.push(ReceiptItem {
            purchase_item_id: draft.purchase_item_id,
            quantity_received: quantity,
            condition: draft.condition,
            serial_number: draft.serial_number.clone(),
            capitalize_asset: draft.capitalize_asset,
        });
    }

    if accepted.is_empty() {
        return Ok(ReceiptPlanOutcome::NothingToReceive);
    }

    let fully_received_after = remaining.values().all(|&qty| qty == 0);
    Ok(ReceiptPlanOutcome::Planned(ReceiptPlan {
        accepted,
        dropped,
        fully_received_after,
    }))
}
