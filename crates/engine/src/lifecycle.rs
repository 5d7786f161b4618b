//! The lifecycle orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use procur_approvals::{ApprovalOutcome, ApprovalRequest, ApproverRole};
use procur_assets::{Asset, AssetError, CapitalizationGuard};
use procur_core::{AccountId, AggregateRoot, DomainError, ExpectedVersion, UserId, VendorId};
use procur_purchasing::{
    PaymentMethod, Purchase, PurchaseId, PurchaseItemDraft, PurchaseItemId, PurchaseStatus,
};
use procur_receiving::{
    plan_receipt, remaining_quantities, DroppedItem, Receipt, ReceiptDraftItem,
    ReceiptPlanOutcome, ReceiptStatus,
};
use procur_tax::{compute_totals, LineInput, TaxRates, Totals};

use crate::codes::{document_code, GR_PREFIX, PO_PREFIX};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::journal::{journal_for_payment, journal_for_purchase, JournalPoster, JournalRequest};
use crate::notify::{Notification, NotificationSender};
use crate::store::{ApprovalStore, AssetStore, PurchaseStore, ReceiptStore, SequenceStore};

/// Fields for a new purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub vendor_id: VendorId,
    pub payment_method: PaymentMethod,
    /// Bank or credit account the purchase settles against.
    pub settlement_account: Option<AccountId>,
    pub order_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub items: Vec<PurchaseItemDraft>,
    pub discount_rate: Decimal,
    /// Tax rates; the configured default PPN applies when absent.
    pub rates: Option<TaxRates>,
    pub notes: Option<String>,
    pub created_by: UserId,
}

/// Replacement fields for a draft purchase.
#[derive(Debug, Clone)]
pub struct UpdatePurchase {
    pub vendor_id: VendorId,
    pub payment_method: PaymentMethod,
    pub settlement_account: Option<AccountId>,
    pub due_date: Option<DateTime<Utc>>,
    pub items: Vec<PurchaseItemDraft>,
    pub discount_rate: Decimal,
    pub rates: Option<TaxRates>,
    pub notes: Option<String>,
}

/// A delivery to record.
#[derive(Debug, Clone)]
pub struct CreateReceipt {
    pub purchase_id: PurchaseId,
    pub items: Vec<ReceiptDraftItem>,
    pub received_by: UserId,
    pub receipt_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// What recording a delivery produced.
#[derive(Debug, Clone)]
pub enum CreateReceiptOutcome {
    Received {
        receipt: Receipt,
        /// Assets capitalized from flagged lines.
        assets_created: Vec<Asset>,
        /// Per-line capitalization failures. The receipt itself stands.
        asset_errors: Vec<AssetError>,
        /// Requested lines that were already fully received.
        dropped: Vec<DroppedItem>,
    },
    /// Nothing left to receive; no receipt was recorded.
    NothingToReceive,
}

/// Orchestrates purchases, approvals, receipts and capitalization over
/// pluggable stores.
///
/// Every mutation re-reads the aggregate and saves with the loaded version,
/// so two writers racing on the same purchase cannot both win.
pub struct PurchaseLifecycle {
    config: EngineConfig,
    purchases: Arc<dyn PurchaseStore>,
    receipts: Arc<dyn ReceiptStore>,
    assets: Arc<dyn AssetStore>,
    approvals: Arc<dyn ApprovalStore>,
    sequences: Arc<dyn SequenceStore>,
    journal: Arc<dyn JournalPoster>,
    notifier: Arc<dyn NotificationSender>,
}

impl PurchaseLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        purchases: Arc<dyn PurchaseStore>,
        receipts: Arc<dyn ReceiptStore>,
        assets: Arc<dyn AssetStore>,
        approvals: Arc<dyn ApprovalStore>,
        sequences: Arc<dyn SequenceStore>,
        journal: Arc<dyn JournalPoster>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            config,
            purchases,
            receipts,
            assets,
            approvals,
            sequences,
            journal,
            notifier,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Price a set of lines without touching any purchase.
    pub fn preview_totals(
        &self,
        items: &[LineInput],
        discount_rate: Decimal,
        rates: Option<TaxRates>,
    ) -> Result<Totals, EngineError> {
        let rates = rates.unwrap_or_else(|| TaxRates::ppn(self.config.default_ppn_rate));
        Ok(compute_totals(items, discount_rate, &rates)?)
    }

    /// Create a draft purchase with a fresh `PO/<year>/<month>/<seq>` code.
    pub fn create_purchase(&self, cmd: CreatePurchase) -> Result<Purchase, EngineError> {
        let now = Utc::now();
        let sequence =
            self.sequences
                .next(PO_PREFIX, cmd.order_date.year(), cmd.order_date.month())?;
        let code = document_code(PO_PREFIX, cmd.order_date, sequence);

        let mut purchase = Purchase::create(
            code,
            cmd.vendor_id,
            cmd.payment_method,
            cmd.order_date,
            cmd.due_date,
            cmd.created_by,
            now,
        );
        purchase.update_details(
            cmd.vendor_id,
            cmd.payment_method,
            cmd.settlement_account,
            cmd.due_date,
            cmd.notes,
            now,
        )?;
        let rates = cmd
            .rates
            .unwrap_or_else(|| TaxRates::ppn(self.config.default_ppn_rate));
        purchase.set_rates(cmd.discount_rate, rates, now)?;
        purchase.set_items(cmd.items, now)?;

        self.purchases.save(&purchase, ExpectedVersion::Any)?;
        tracing::info!(
            "created purchase {} totaling {}",
            purchase.code(),
            purchase.total_amount()
        );
        Ok(purchase)
    }

    /// Rework a draft purchase.
    pub fn update_purchase(
        &self,
        id: PurchaseId,
        cmd: UpdatePurchase,
    ) -> Result<Purchase, EngineError> {
        let now = Utc::now();
        let mut purchase = self.load_purchase(id)?;
        let loaded = purchase.version();

        purchase.update_details(
            cmd.vendor_id,
            cmd.payment_method,
            cmd.settlement_account,
            cmd.due_date,
            cmd.notes,
            now,
        )?;
        let rates = cmd
            .rates
            .unwrap_or_else(|| TaxRates::ppn(self.config.default_ppn_rate));
        purchase.set_rates(cmd.discount_rate, rates, now)?;
        purchase.set_items(cmd.items, now)?;

        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;
        Ok(purchase)
    }

    /// Remove a purchase. Only admins may remove anything past draft.
    pub fn delete_purchase(&self, id: PurchaseId, actor: ApproverRole) -> Result<(), EngineError> {
        let purchase = self.load_purchase(id)?;
        match purchase.status() {
            PurchaseStatus::Draft | PurchaseStatus::Cancelled => {}
            other => {
                if actor != ApproverRole::Admin {
                    return Err(DomainError::not_authorized(format!(
                        "only admins may delete a {other} purchase"
                    ))
                    .into());
                }
                tracing::warn!(
                    "deleting {} purchase {}; receipts and journals may reference it",
                    other,
                    purchase.code()
                );
            }
        }
        self.purchases.delete(id)?;
        Ok(())
    }

    /// Submit a draft for approval and open its approval request.
    ///
    /// Only the requesting side (employee, owner) or an admin may submit;
    /// approvers do not submit their own work.
    pub fn submit_for_approval(
        &self,
        id: PurchaseId,
        submitted_by: ApproverRole,
    ) -> Result<ApprovalRequest, EngineError> {
        match submitted_by {
            ApproverRole::Employee | ApproverRole::Owner | ApproverRole::Admin => {}
            other => {
                return Err(DomainError::not_authorized(format!(
                    "{other} may not submit purchases for approval"
                ))
                .into());
            }
        }
        let now = Utc::now();
        let mut purchase = self.load_purchase(id)?;
        let loaded = purchase.version();
        purchase.submit_for_approval(now)?;

        let request = ApprovalRequest::open(
            id.as_aggregate_id(),
            purchase.total_amount(),
            submitted_by,
            &self.config.approval_policy,
            now,
        );

        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;
        self.approvals.save(&request, ExpectedVersion::Any)?;

        if let Some(step) = request.active_step() {
            self.notify(
                step.approver_role,
                format!("Approval needed: {}", purchase.code()),
                format!(
                    "Purchase {} ({}) awaits your approval.",
                    purchase.code(),
                    purchase.total_amount()
                ),
            );
        }
        tracing::info!(
            "submitted purchase {} for approval ({} steps, {:?} priority)",
            purchase.code(),
            request.steps().len(),
            request.priority()
        );
        Ok(request)
    }

    /// Approve the current step of a purchase's approval request.
    ///
    /// `escalate` lets a finance approver force a director step.
    pub fn approve(
        &self,
        purchase_id: PurchaseId,
        actor: ApproverRole,
        comments: Option<&str>,
        escalate: bool,
    ) -> Result<ApprovalOutcome, EngineError> {
        let now = Utc::now();
        let mut request = self.load_request(purchase_id)?;
        let loaded = request.version();

        let outcome = request.approve(
            actor,
            comments,
            escalate,
            &self.config.approval_policy,
            now,
        )?;
        self.approvals
            .save(&request, ExpectedVersion::Exact(loaded))?;

        match outcome {
            ApprovalOutcome::FullyApproved => {
                let mut purchase = self.load_purchase(purchase_id)?;
                let loaded = purchase.version();
                purchase.mark_approved(now)?;
                self.purchases
                    .save(&purchase, ExpectedVersion::Exact(loaded))?;

                self.post_journal(journal_for_purchase(&purchase, now));

                self.notify(
                    ApproverRole::Employee,
                    format!("Purchase {} approved", purchase.code()),
                    format!("Purchase {} is approved and ready for goods receipt.", purchase.code()),
                );
                tracing::info!("purchase {} fully approved", purchase.code());
            }
            ApprovalOutcome::Advanced { next } => {
                self.notify(
                    next,
                    "Approval needed".to_owned(),
                    format!("An approval request now awaits the {next} role."),
                );
            }
            ApprovalOutcome::Escalated => {
                self.notify(
                    ApproverRole::Director,
                    "Approval escalated".to_owned(),
                    "A finance approver escalated a purchase for director sign-off.".to_owned(),
                );
            }
            ApprovalOutcome::Rejected => {}
        }
        Ok(outcome)
    }

    /// Reject the current step; cancels the purchase.
    pub fn reject(
        &self,
        purchase_id: PurchaseId,
        actor: ApproverRole,
        comments: &str,
    ) -> Result<(), EngineError> {
        let now = Utc::now();
        let mut request = self.load_request(purchase_id)?;
        let loaded = request.version();
        request.reject(actor, comments, now)?;
        self.approvals
            .save(&request, ExpectedVersion::Exact(loaded))?;

        let mut purchase = self.load_purchase(purchase_id)?;
        let loaded = purchase.version();
        purchase.mark_rejected(now)?;
        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;

        self.notify(
            ApproverRole::Employee,
            format!("Purchase {} rejected", purchase.code()),
            format!("Rejected: {comments}"),
        );
        tracing::info!("purchase {} rejected", purchase.code());
        Ok(())
    }

    /// Withdraw a purchase before approval.
    pub fn cancel_purchase(&self, id: PurchaseId) -> Result<Purchase, EngineError> {
        let mut purchase = self.load_purchase(id)?;
        let loaded = purchase.version();
        purchase.cancel(Utc::now())?;
        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;
        Ok(purchase)
    }

    /// Record a delivery against an approved purchase.
    ///
    /// The purchase is saved first with its loaded version; a racer that read
    /// the same remaining balances loses that save and records nothing. If
    /// the receipt itself then fails to persist, the purchase is restored so
    /// the goods stay receivable on retry.
    pub fn create_receipt(
        &self,
        cmd: CreateReceipt,
    ) -> Result<CreateReceiptOutcome, EngineError> {
        let now = Utc::now();
        let mut purchase = self.load_purchase(cmd.purchase_id)?;
        let loaded = purchase.version();

        match purchase.status() {
            PurchaseStatus::Approved => {}
            PurchaseStatus::Completed => {
                tracing::info!(
                    "purchase {} is already fully received; nothing to record",
                    purchase.code()
                );
                return Ok(CreateReceiptOutcome::NothingToReceive);
            }
            other => {
                return Err(DomainError::invalid_state(format!(
                    "cannot receive goods against a {other} purchase"
                ))
                .into());
            }
        }

        let prior = self.receipts.list_for_purchase(cmd.purchase_id)?;
        let plan = match plan_receipt(&purchase, &prior, &cmd.items)? {
            ReceiptPlanOutcome::Planned(plan) => plan,
            ReceiptPlanOutcome::NothingToReceive => {
                tracing::info!(
                    "every requested line on {} is already fully received",
                    purchase.code()
                );
                return Ok(CreateReceiptOutcome::NothingToReceive);
            }
        };

        let sequence = self.sequences.next(
            GR_PREFIX,
            cmd.receipt_date.year(),
            cmd.receipt_date.month(),
        )?;
        let code = document_code(GR_PREFIX, cmd.receipt_date, sequence);
        let status = if plan.fully_received_after {
            ReceiptStatus::Complete
        } else {
            ReceiptStatus::Partial
        };
        let receipt = Receipt::record(
            code,
            cmd.purchase_id,
            status,
            plan.accepted,
            cmd.received_by,
            cmd.receipt_date,
            cmd.notes,
        );

        let snapshot = purchase.clone();
        purchase.note_goods_received(plan.fully_received_after, now)?;
        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;
        if let Err(err) = self.receipts.insert(&receipt) {
            // Put the purchase back the way the failed delivery found it,
            // otherwise a completed-but-unrecorded order can never be
            // received on retry.
            tracing::warn!(
                "receipt {} against {} failed to persist, restoring the purchase: {err}",
                receipt.code(),
                purchase.code()
            );
            self.purchases
                .save(&snapshot, ExpectedVersion::Exact(purchase.version()))?;
            return Err(err.into());
        }

        let existing = self.assets.list_for_purchase(cmd.purchase_id)?;
        let guard =
            CapitalizationGuard::new(self.config.salvage_percent, self.config.useful_life_years);
        let report = guard.capitalize(&purchase, &receipt, &existing, now);
        for asset in &report.created {
            self.assets.insert(asset)?;
        }
        for skipped in &report.skipped {
            tracing::info!("skipped capitalization: {}", skipped.reason);
        }
        for error in &report.errors {
            tracing::warn!(
                "asset creation failed for item {}: {}",
                error.purchase_item_id,
                error.message
            );
        }

        tracing::info!(
            "recorded receipt {} against {} ({:?}, {} assets)",
            receipt.code(),
            purchase.code(),
            receipt.status(),
            report.created.len()
        );
        Ok(CreateReceiptOutcome::Received {
            receipt,
            assets_created: report.created,
            asset_errors: report.errors,
            dropped: plan.dropped,
        })
    }

    /// Remaining receivable quantity per purchase item.
    pub fn remaining_quantities(
        &self,
        id: PurchaseId,
    ) -> Result<HashMap<PurchaseItemId, i64>, EngineError> {
        let purchase = self.load_purchase(id)?;
        let receipts = self.receipts.list_for_purchase(id)?;
        Ok(remaining_quantities(&purchase, &receipts))
    }

    /// Record a settlement against an approved or completed purchase.
    pub fn record_payment(
        &self,
        id: PurchaseId,
        amount: Decimal,
    ) -> Result<Purchase, EngineError> {
        let now = Utc::now();
        let mut purchase = self.load_purchase(id)?;
        let loaded = purchase.version();
        purchase.record_payment(amount, now)?;
        self.purchases
            .save(&purchase, ExpectedVersion::Exact(loaded))?;
        self.post_journal(journal_for_payment(&purchase, amount, now));
        tracing::info!(
            "recorded payment of {amount} on {}; {} outstanding",
            purchase.code(),
            purchase.outstanding_amount()
        );
        Ok(purchase)
    }

    fn load_purchase(&self, id: PurchaseId) -> Result<Purchase, EngineError> {
        self.purchases
            .get(id)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    fn load_request(&self, purchase_id: PurchaseId) -> Result<ApprovalRequest, EngineError> {
        self.approvals
            .get_for_purchase(purchase_id)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Fire-and-forget: the posting service owns its own retries, so a
    /// failure is logged and never rolls back the state transition.
    fn post_journal(&self, entry: JournalRequest) {
        if let Err(err) = self.journal.post(&entry) {
            tracing::warn!("journal posting failed for {}: {err}", entry.reference);
        }
    }

    fn notify(&self, recipient_role: ApproverRole, subject: String, body: String) {
        let notification = Notification {
            recipient_role,
            subject,
            body,
        };
        if let Err(err) = self.notifier.send(&notification) {
            tracing::warn!("notification delivery failed: {err:?}");
        }
    }
}
