use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{AccountId, AggregateId, AggregateRoot, DomainError, DomainResult, UserId, VendorId};
use procur_tax::{compute_totals, LineInput, TaxRates, Totals};

use crate::item::{PurchaseItem, PurchaseItemDraft, PurchaseItemId};
use crate::status::{ApprovalState, PaymentMethod, PurchaseStatus};

/// Identifier of a purchase order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(AggregateId);

impl PurchaseId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }

    pub fn as_aggregate_id(&self) -> AggregateId {
        self.0
    }
}

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A purchase order.
///
/// State machine: Draft -> PendingApproval -> Approved -> Completed, with
/// Cancelled reachable from Draft and PendingApproval. Totals are derived
/// state and recomputed whenever items or rates change; they are never set
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    /// Document code, e.g. `PO/2026/08/0042`.
    code: String,
    vendor_id: VendorId,
    status: PurchaseStatus,
    approval_state: ApprovalState,
    payment_method: PaymentMethod,
    /// Bank or credit account the purchase settles against, when known.
    settlement_account: Option<AccountId>,
    order_date: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    discount_rate: Decimal,
    rates: TaxRates,
    totals: Totals,
    paid_amount: Decimal,
    notes: Option<String>,
    items: Vec<PurchaseItem>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl AggregateRoot for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &PurchaseId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Purchase {
    /// Create an empty draft order.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        code: String,
        vendor_id: VendorId,
        payment_method: PaymentMethod,
        order_date: DateTime<Utc>,
        due_date: Option<DateTime<Utc>>,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PurchaseId::new(),
            code,
            vendor_id,
            status: PurchaseStatus::Draft,
            approval_state: ApprovalState::NotStarted,
            payment_method,
            settlement_account: None,
            order_date,
            due_date,
            discount_rate: Decimal::ZERO,
            rates: TaxRates::default(),
            totals: Totals::default(),
            paid_amount: Decimal::ZERO,
            notes: None,
            items: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn approval_state(&self) -> ApprovalState {
        self.approval_state
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn settlement_account(&self) -> Option<AccountId> {
        self.settlement_account
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn discount_rate(&self) -> Decimal {
        self.discount_rate
    }

    pub fn rates(&self) -> &TaxRates {
        &self.rates
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn total_amount(&self) -> Decimal {
        self.totals.total_amount
    }

    pub fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    /// What is still owed: `total_amount - paid_amount`.
    ///
    /// Derived, so `paid + outstanding == total` holds by construction.
    pub fn outstanding_amount(&self) -> Decimal {
        self.totals.total_amount - self.paid_amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    pub fn item(&self, id: PurchaseItemId) -> Option<&PurchaseItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the line items. Draft only.
    pub fn set_items(
        &mut self,
        drafts: Vec<PurchaseItemDraft>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::Draft, "replace items")?;
        let items = drafts
            .into_iter()
            .map(PurchaseItem::new)
            .collect::<DomainResult<Vec<_>>>()?;
        self.items = items;
        self.recompute()?;
        self.touch(now);
        Ok(())
    }

    /// Change the order-level discount and tax rates. Draft only.
    pub fn set_rates(
        &mut self,
        discount_rate: Decimal,
        rates: TaxRates,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::Draft, "change rates")?;
        self.discount_rate = discount_rate;
        self.rates = rates;
        self.recompute()?;
        self.touch(now);
        Ok(())
    }

    /// Edit header fields. Draft only.
    #[allow(clippy::too_many_arguments)]
    pub fn update_details(
        &mut self,
        vendor_id: VendorId,
        payment_method: PaymentMethod,
        settlement_account: Option<AccountId>,
        due_date: Option<DateTime<Utc>>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::Draft, "edit")?;
        self.vendor_id = vendor_id;
        self.payment_method = payment_method;
        self.settlement_account = settlement_account;
        self.due_date = due_date;
        self.notes = notes;
        self.touch(now);
        Ok(())
    }

    /// Hand the draft to the approval workflow.
    pub fn submit_for_approval(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::Draft, "submit")?;
        if self.items.is_empty() {
            return Err(DomainError::validation(
                "cannot submit a purchase without items",
            ));
        }
        self.status = PurchaseStatus::PendingApproval;
        self.approval_state = ApprovalState::Pending;
        self.touch(now);
        Ok(())
    }

    /// The approval workflow fully approved the order.
    pub fn mark_approved(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::PendingApproval, "approve")?;
        self.status = PurchaseStatus::Approved;
        self.approval_state = ApprovalState::Approved;
        self.touch(now);
        Ok(())
    }

    /// The approval workflow rejected the order. Terminal.
    pub fn mark_rejected(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::PendingApproval, "reject")?;
        self.status = PurchaseStatus::Cancelled;
        self.approval_state = ApprovalState::Rejected;
        self.touch(now);
        Ok(())
    }

    /// Withdraw the order before it is approved.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            PurchaseStatus::Draft | PurchaseStatus::PendingApproval => {
                self.status = PurchaseStatus::Cancelled;
                self.touch(now);
                Ok(())
            }
            other => Err(DomainError::invalid_state(format!(
                "cannot cancel a {other} purchase"
            ))),
        }
    }

    /// Note that goods arrived against this order.
    ///
    /// Always bumps the version, even for partial deliveries, so concurrent
    /// receipts against the same purchase serialize on the save. Completes
    /// the order when the delivery closed it out.
    pub fn note_goods_received(
        &mut self,
        fully_received: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(PurchaseStatus::Approved, "receive goods against")?;
        if fully_received {
            self.status = PurchaseStatus::Completed;
        }
        self.touch(now);
        Ok(())
    }

    /// Record a settlement against the outstanding amount.
    pub fn record_payment(&mut self, amount: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            PurchaseStatus::Approved | PurchaseStatus::Completed => {}
            other => {
                return Err(DomainError::invalid_state(format!(
                    "cannot record a payment on a {other} purchase"
                )));
            }
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "payment amount must be positive (got {amount})"
            )));
        }
        let outstanding = self.outstanding_amount();
        if amount > outstanding {
            return Err(DomainError::validation(format!(
                "payment of {amount} exceeds the outstanding amount of {outstanding}"
            )));
        }
        self.paid_amount += amount;
        self.touch(now);
        Ok(())
    }

    fn recompute(&mut self) -> DomainResult<()> {
        let lines: Vec<LineInput> = self.items.iter().map(PurchaseItem::as_line_input).collect();
        self.totals = compute_totals(&lines, self.discount_rate, &self.rates)?;
        Ok(())
    }

    fn ensure_status(&self, expected: PurchaseStatus, action: &str) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_state(format!(
                "cannot {action} a {} purchase (must be {expected})",
                self.status
            )));
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procur_core::ProductId;
    use rust_decimal_macros::dec;

    fn draft_item(quantity: i64, unit_price: Decimal) -> PurchaseItemDraft {
        PurchaseItemDraft {
            product_id: ProductId::new(),
            product_name: "Office chair".to_owned(),
            quantity,
            unit_price,
            discount: Decimal::ZERO,
            expense_account: None,
        }
    }

    fn draft_purchase() -> Purchase {
        Purchase::create(
            "PO/2026/08/0001".to_owned(),
            VendorId::new(),
            PaymentMethod::BankTransfer,
            Utc::now(),
            None,
            UserId::new(),
            Utc::now(),
        )
    }

    fn approved_purchase() -> Purchase {
        let mut purchase = draft_purchase();
        purchase
            .set_items(vec![draft_item(2, dec!(100000))], Utc::now())
            .unwrap();
        purchase
            .set_rates(Decimal::ZERO, TaxRates::ppn(dec!(11)), Utc::now())
            .unwrap();
        purchase.submit_for_approval(Utc::now()).unwrap();
        purchase.mark_approved(Utc::now()).unwrap();
        purchase
    }

    #[test]
    fn set_items_recomputes_totals() {
        let mut purchase = draft_purchase();
        purchase
            .set_rates(Decimal::ZERO, TaxRates::ppn(dec!(11)), Utc::now())
            .unwrap();
        purchase
            .set_items(vec![draft_item(2, dec!(100000))], Utc::now())
            .unwrap();
        assert_eq!(purchase.total_amount(), dec!(222000));
        assert_eq!(purchase.outstanding_amount(), dec!(222000));
    }

    #[test]
    fn submit_requires_items() {
        let mut purchase = draft_purchase();
        let err = purchase.submit_for_approval(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn items_are_frozen_after_submission() {
        let mut purchase = draft_purchase();
        purchase
            .set_items(vec![draft_item(1, dec!(5000))], Utc::now())
            .unwrap();
        purchase.submit_for_approval(Utc::now()).unwrap();

        let err = purchase
            .set_items(vec![draft_item(2, dec!(5000))], Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn rejection_cancels_the_order() {
        let mut purchase = draft_purchase();
        purchase
            .set_items(vec![draft_item(1, dec!(5000))], Utc::now())
            .unwrap();
        purchase.submit_for_approval(Utc::now()).unwrap();
        purchase.mark_rejected(Utc::now()).unwrap();

        assert_eq!(purchase.status(), PurchaseStatus::Cancelled);
        assert_eq!(purchase.approval_state(), ApprovalState::Rejected);
    }

    #[test]
    fn approved_orders_cannot_be_cancelled() {
        let mut purchase = approved_purchase();
        let err = purchase.cancel(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn full_reception_completes_the_order() {
        let mut purchase = approved_purchase();
        let before = purchase.version();
        purchase.note_goods_received(false, Utc::now()).unwrap();
        assert_eq!(purchase.status(), PurchaseStatus::Approved);
        assert_eq!(purchase.version(), before + 1);

        purchase.note_goods_received(true, Utc::now()).unwrap();
        assert_eq!(purchase.status(), PurchaseStatus::Completed);
    }

    #[test]
    fn payments_accumulate_up_to_the_total() {
        let mut purchase = approved_purchase();
        purchase.record_payment(dec!(100000), Utc::now()).unwrap();
        purchase.record_payment(dec!(122000), Utc::now()).unwrap();

        assert_eq!(purchase.paid_amount(), dec!(222000));
        assert_eq!(purchase.outstanding_amount(), dec!(0));

        let err = purchase.record_payment(dec!(1), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn payments_require_an_approved_order() {
        let mut purchase = draft_purchase();
        let err = purchase.record_payment(dec!(1), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn transitions_bump_the_version() {
        let mut purchase = draft_purchase();
        let v0 = purchase.version();
        purchase
            .set_items(vec![draft_item(1, dec!(5000))], Utc::now())
            .unwrap();
        purchase.submit_for_approval(Utc::now()).unwrap();
        assert_eq!(purchase.version(), v0 + 2);
    }
}
