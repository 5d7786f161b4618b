use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{AccountId, AggregateId, DomainError, DomainResult, Entity, ProductId};
use procur_tax::LineInput;

/// Identifier of one line item on a purchase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseItemId(AggregateId);

impl PurchaseItemId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl std::fmt::Display for PurchaseItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Caller-supplied fields for a new line item, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItemDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    /// Expense account override; inventory is assumed when absent.
    #[serde(default)]
    pub expense_account: Option<AccountId>,
}

/// A validated line item.
///
/// `product_name` is a snapshot taken at ordering time so later catalog
/// renames do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    id: PurchaseItemId,
    product_id: ProductId,
    product_name: String,
    quantity: i64,
    unit_price: Decimal,
    discount: Decimal,
    expense_account: Option<AccountId>,
    line_subtotal: Decimal,
}

impl Entity for PurchaseItem {
    type Id = PurchaseItemId;

    fn id(&self) -> &PurchaseItemId {
        &self.id
    }
}

impl PurchaseItem {
    pub fn new(draft: PurchaseItemDraft) -> DomainResult<Self> {
        if draft.product_name.trim().is_empty() {
            return Err(DomainError::validation("product_name must not be empty"));
        }
        if draft.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {})",
                draft.quantity
            )));
        }
        if draft.unit_price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "unit_price must not be negative (got {})",
                draft.unit_price
            )));
        }
        if draft.discount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "discount must not be negative (got {})",
                draft.discount
            )));
        }

        let line_subtotal = LineInput {
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            discount: draft.discount,
        }
        .subtotal();

        Ok(Self {
            id: PurchaseItemId::new(),
            product_id: draft.product_id,
            product_name: draft.product_name,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            discount: draft.discount,
            expense_account: draft.expense_account,
            line_subtotal,
        })
    }

    pub fn id(&self) -> PurchaseItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn expense_account(&self) -> Option<AccountId> {
        self.expense_account
    }

    pub fn line_subtotal(&self) -> Decimal {
        self.line_subtotal
    }

    /// View of this item as calculator input.
    pub fn as_line_input(&self) -> LineInput {
        LineInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft(quantity: i64, unit_price: Decimal) -> PurchaseItemDraft {
        PurchaseItemDraft {
            product_id: ProductId::new(),
            product_name: "Laptop".to_owned(),
            quantity,
            unit_price,
            discount: Decimal::ZERO,
            expense_account: None,
        }
    }

    #[test]
    fn valid_draft_computes_line_subtotal() {
        let item = PurchaseItem::new(draft(3, dec!(100000))).unwrap();
        assert_eq!(item.line_subtotal(), dec!(300000));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = PurchaseItem::new(draft(0, dec!(100))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        let err = PurchaseItem::new(draft(1, dec!(-1))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_product_name_is_rejected() {
        let mut d = draft(1, dec!(100));
        d.product_name = "  ".to_owned();
        let err = PurchaseItem::new(d).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
