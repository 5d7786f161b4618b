//! Journal entry construction for approved purchases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{AccountId, AggregateRoot};
use procur_purchasing::{PaymentMethod, Purchase, PurchaseId};

use crate::store::StoreError;

/// Ledger account a journal line posts to.
///
/// Resolution to chart-of-accounts codes happens in the accounting system;
/// the engine only names the roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAccount {
    Inventory,
    /// Expense account override on the purchase line.
    Expense(AccountId),
    /// Input VAT (PPN) receivable.
    PpnInput,
    AccountsPayable,
    Cash,
    /// Withheld income tax (PPh) owed to the tax office.
    TaxPayable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account: JournalAccount,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl JournalLine {
    fn debit(account: JournalAccount, amount: Decimal) -> Self {
        Self {
            account,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    fn credit(account: JournalAccount, amount: Decimal) -> Self {
        Self {
            account,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// A balanced journal entry ready for the accounting system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRequest {
    pub purchase_id: PurchaseId,
    /// Document code of the purchase, for the ledger reference column.
    pub reference: String,
    pub lines: Vec<JournalLine>,
    pub posted_at: DateTime<Utc>,
}

impl JournalRequest {
    /// Total debits equal total credits.
    pub fn is_balanced(&self) -> bool {
        let debits: Decimal = self.lines.iter().map(|l| l.debit).sum();
        let credits: Decimal = self.lines.iter().map(|l| l.credit).sum();
        debits == credits
    }
}

/// Receives journal entries. Implemented by the accounting integration.
pub trait JournalPoster: Send + Sync {
    fn post(&self, request: &JournalRequest) -> Result<(), StoreError>;
}

/// Build the journal entry for an approved purchase.
///
/// Debits the goods (inventory, or the line's expense account) at their
/// discounted value plus input PPN; credits withheld PPh and the settlement
/// account (cash or payable). The entry always balances: the last goods line
/// absorbs any division remainder.
pub fn journal_for_purchase(purchase: &Purchase, now: DateTime<Utc>) -> JournalRequest {
    let totals = purchase.totals();
    let hundred = Decimal::ONE_HUNDRED;
    let discount_factor = (hundred - purchase.discount_rate().min(hundred)) / hundred;

    let mut lines = Vec::new();
    let items = purchase.items();
    let mut allocated = Decimal::ZERO;
    for (idx, item) in items.iter().enumerate() {
        let amount = if idx + 1 == items.len() {
            totals.after_discount - allocated
        } else {
            item.line_subtotal() * discount_factor
        };
        allocated += amount;
        let account = item
            .expense_account()
            .map(JournalAccount::Expense)
            .unwrap_or(JournalAccount::Inventory);
        lines.push(JournalLine::debit(account, amount));
    }

    if totals.tax_additions > Decimal::ZERO {
        lines.push(JournalLine::debit(
            JournalAccount::PpnInput,
            totals.tax_additions,
        ));
    }
    if totals.tax_deductions > Decimal::ZERO {
        lines.push(JournalLine::credit(
            JournalAccount::TaxPayable,
            totals.tax_deductions,
        ));
    }

    // Withholding at the cap can consume the entire payable; a zero-amount
    // settlement line would be ledger noise.
    if totals.total_amount > Decimal::ZERO {
        let settlement = match purchase.payment_method() {
            PaymentMethod::Cash => JournalAccount::Cash,
            _ => JournalAccount::AccountsPayable,
        };
        lines.push(JournalLine::credit(settlement, totals.total_amount));
    }

    JournalRequest {
        purchase_id: *purchase.id(),
        reference: purchase.code().to_owned(),
        lines,
        posted_at: now,
    }
}

/// Build the journal entry for a payment: the open payable clears against
/// cash.
pub fn journal_for_payment(
    purchase: &Purchase,
    amount: Decimal,
    now: DateTime<Utc>,
) -> JournalRequest {
    JournalRequest {
        purchase_id: *purchase.id(),
        reference: purchase.code().to_owned(),
        lines: vec![
            JournalLine::debit(JournalAccount::AccountsPayable, amount),
            JournalLine::credit(JournalAccount::Cash, amount),
        ],
        posted_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use procur_core::{ProductId, UserId, VendorId};
    use procur_purchasing::PurchaseItemDraft;
    use procur_tax::TaxRates;

    fn item(name: &str, price: Decimal, expense: Option<AccountId>) -> PurchaseItemDraft {
        PurchaseItemDraft {
            product_id: ProductId::new(),
            product_name: name.to_owned(),
            quantity: 1,
            unit_price: price,
            discount: dec!(0),
            expense_account: expense,
        }
    }

    fn purchase(method: PaymentMethod, drafts: Vec<PurchaseItemDraft>) -> Purchase {
        let mut purchase = Purchase::create(
            "PO/2026/08/0009".to_owned(),
            VendorId::new(),
            method,
            Utc::now(),
            None,
            UserId::new(),
            Utc::now(),
        );
        purchase.set_items(drafts, Utc::now()).unwrap();
        purchase
            .set_rates(
                dec!(10),
                TaxRates {
                    ppn_rate: dec!(11),
                    pph23_rate: dec!(2),
                    ..TaxRates::default()
                },
                Utc::now(),
            )
            .unwrap();
        purchase
    }

    #[test]
    fn entry_balances_with_discount_and_withholding() {
        let purchase = purchase(
            PaymentMethod::Credit,
            vec![
                item("Cable", dec!(70000), None),
                item("Switch", dec!(30000), None),
            ],
        );
        let entry = journal_for_purchase(&purchase, Utc::now());
        assert!(entry.is_balanced());

        let goods: Decimal = entry
            .lines
            .iter()
            .filter(|l| l.account == JournalAccount::Inventory)
            .map(|l| l.debit)
            .sum();
        assert_eq!(goods, purchase.totals().after_discount);
    }

    #[test]
    fn cash_purchases_credit_cash_instead_of_payable() {
        let purchase = purchase(PaymentMethod::Cash, vec![item("Paper", dec!(50000), None)]);
        let entry = journal_for_purchase(&purchase, Utc::now());
        assert!(entry
            .lines
            .iter()
            .any(|l| l.account == JournalAccount::Cash && l.credit > Decimal::ZERO));
    }

    #[test]
    fn payment_entry_clears_payable_against_cash() {
        let purchase = purchase(PaymentMethod::Credit, vec![item("Toner", dec!(90000), None)]);
        let entry = journal_for_payment(&purchase, dec!(50000), Utc::now());
        assert!(entry.is_balanced());
        assert_eq!(entry.lines[0].account, JournalAccount::AccountsPayable);
        assert_eq!(entry.lines[0].debit, dec!(50000));
    }

    #[test]
    fn entry_balances_when_withholding_consumes_the_whole_payable() {
        let mut purchase = Purchase::create(
            "PO/2026/08/0011".to_owned(),
            VendorId::new(),
            PaymentMethod::Credit,
            Utc::now(),
            None,
            UserId::new(),
            Utc::now(),
        );
        purchase
            .set_items(vec![item("Consulting", dec!(1000000), None)], Utc::now())
            .unwrap();
        // Deductions exactly match additions + 100: the whole payable is
        // withheld and the total is zero.
        purchase
            .set_rates(
                dec!(0),
                TaxRates {
                    ppn_rate: dec!(11),
                    pph21_rate: dec!(100),
                    pph23_rate: dec!(11),
                    ..TaxRates::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(purchase.total_amount(), dec!(0));

        let entry = journal_for_purchase(&purchase, Utc::now());
        assert!(entry.is_balanced());
        // No settlement line: there is nothing left to pay.
        assert!(!entry.lines.iter().any(|l| matches!(
            l.account,
            JournalAccount::Cash | JournalAccount::AccountsPayable
        )));
    }

    #[test]
    fn expense_override_routes_the_goods_line() {
        let account = AccountId::new();
        let purchase = purchase(
            PaymentMethod::Credit,
            vec![item("Subscription", dec!(50000), Some(account))],
        );
        let entry = journal_for_purchase(&purchase, Utc::now());
        assert!(entry
            .lines
            .iter()
            .any(|l| l.account == JournalAccount::Expense(account)));
        assert!(entry.is_balanced());
    }
}
