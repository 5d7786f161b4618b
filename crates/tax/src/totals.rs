//! Deterministic layered totals computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{DomainError, DomainResult, ValueObject};

use crate::rates::{validate_percent, TaxRates};

/// One purchase line as the calculator sees it.
///
/// Intentionally decoupled from the `Purchase` aggregate so the calculator can
/// price unsaved form input as well as persisted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
}

impl LineInput {
    /// Net line amount: `quantity * unit_price - discount`, floored at zero.
    ///
    /// Negative quantities, prices and discounts are treated as zero so the
    /// calculator never fails on partially-filled forms.
    pub fn subtotal(&self) -> Decimal {
        let quantity = Decimal::from(self.quantity.max(0));
        let unit_price = self.unit_price.max(Decimal::ZERO);
        let gross = quantity * unit_price;
        // A line discount can never exceed the gross line amount.
        let discount = self.discount.max(Decimal::ZERO).min(gross);
        gross - discount
    }
}

/// Computed monetary breakdown of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of net line amounts before the order-level discount.
    pub line_subtotal: Decimal,
    /// Line subtotal after the order-level discount percentage.
    pub after_discount: Decimal,
    /// PPN + other tax additions on the discounted subtotal.
    pub tax_additions: Decimal,
    /// PPh 21 + PPh 23 + other deductions on the discounted subtotal.
    pub tax_deductions: Decimal,
    /// Final payable amount, never negative.
    pub total_amount: Decimal,
}

impl ValueObject for Totals {}

/// Compute the layered totals for a set of line items.
///
/// Evaluation order is fixed:
/// 1. line subtotal (per-line discounts applied),
/// 2. order-level discount percentage,
/// 3. tax additions on the discounted subtotal,
/// 4. tax deductions on the discounted subtotal,
/// 5. final total = after-discount + additions - deductions.
///
/// Combined deductions may withhold at most the whole payable amount: a
/// deduction rate above the addition rate plus 100 is a `Validation` error,
/// so the final total is exact and never floors below zero.
///
/// Pure and idempotent; invariant under reordering of `items`.
pub fn compute_totals(
    items: &[LineInput],
    discount_rate: Decimal,
    rates: &TaxRates,
) -> DomainResult<Totals> {
    let discount_rate = validate_percent("discount_rate", discount_rate)?;
    let rates = rates.validated()?;
    if rates.deduction_rate() > rates.addition_rate() + Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(format!(
            "combined deduction rate {} withholds more than the payable amount \
             (addition rate {} + 100)",
            rates.deduction_rate(),
            rates.addition_rate()
        )));
    }

    let line_subtotal: Decimal = items.iter().map(LineInput::subtotal).sum();

    let hundred = Decimal::ONE_HUNDRED;
    let after_discount = line_subtotal * (hundred - discount_rate) / hundred;
    let tax_additions = after_discount * rates.addition_rate() / hundred;
    let tax_deductions = after_discount * rates.deduction_rate() / hundred;
    let total_amount = (after_discount + tax_additions - tax_deductions).max(Decimal::ZERO);

    Ok(Totals {
        line_subtotal,
        after_discount,
        tax_additions,
        tax_deductions,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i64, unit_price: Decimal, discount: Decimal) -> LineInput {
        LineInput {
            quantity,
            unit_price,
            discount,
        }
    }

    #[test]
    fn ppn_only_purchase_matches_manual_calculation() {
        // 2 x 100_000, no discounts, PPN 11%.
        let items = vec![line(2, dec!(100000), Decimal::ZERO)];
        let totals =
            compute_totals(&items, Decimal::ZERO, &TaxRates::ppn(dec!(11))).unwrap();

        assert_eq!(totals.line_subtotal, dec!(200000));
        assert_eq!(totals.after_discount, dec!(200000));
        assert_eq!(totals.tax_additions, dec!(22000));
        assert_eq!(totals.tax_deductions, dec!(0));
        assert_eq!(totals.total_amount, dec!(222000));
    }

    #[test]
    fn order_discount_applies_before_taxes() {
        let items = vec![line(1, dec!(1000), Decimal::ZERO)];
        let rates = TaxRates::ppn(dec!(10));
        let totals = compute_totals(&items, dec!(10), &rates).unwrap();

        assert_eq!(totals.after_discount, dec!(900));
        assert_eq!(totals.tax_additions, dec!(90));
        assert_eq!(totals.total_amount, dec!(990));
    }

    #[test]
    fn deductions_reduce_the_final_total() {
        let items = vec![line(1, dec!(10000), Decimal::ZERO)];
        let rates = TaxRates {
            ppn_rate: dec!(11),
            pph23_rate: dec!(2),
            ..TaxRates::default()
        };
        let totals = compute_totals(&items, Decimal::ZERO, &rates).unwrap();

        assert_eq!(totals.tax_additions, dec!(1100));
        assert_eq!(totals.tax_deductions, dec!(200));
        assert_eq!(totals.total_amount, dec!(10900));
    }

    #[test]
    fn line_discount_never_exceeds_line_gross() {
        let items = vec![line(1, dec!(100), dec!(500))];
        let totals = compute_totals(&items, Decimal::ZERO, &TaxRates::default()).unwrap();
        assert_eq!(totals.line_subtotal, dec!(0));
        assert_eq!(totals.total_amount, dec!(0));
    }

    #[test]
    fn negative_line_values_are_treated_as_zero() {
        let items = vec![line(-3, dec!(-50), dec!(-10))];
        let totals = compute_totals(&items, Decimal::ZERO, &TaxRates::default()).unwrap();
        assert_eq!(totals.total_amount, dec!(0));
    }

    #[test]
    fn negative_discount_rate_is_a_validation_error() {
        let items = vec![line(1, dec!(100), Decimal::ZERO)];
        let err = compute_totals(&items, dec!(-5), &TaxRates::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deductions_beyond_the_payable_amount_are_rejected() {
        let items = vec![line(1, dec!(1000000), Decimal::ZERO)];
        // Each rate is individually valid, but together they withhold twice
        // the payable amount.
        let rates = TaxRates {
            pph21_rate: dec!(100),
            pph23_rate: dec!(100),
            ..TaxRates::default()
        };
        let err = compute_totals(&items, Decimal::ZERO, &rates).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deductions_at_the_cap_zero_the_total_exactly() {
        let items = vec![line(1, dec!(1000000), Decimal::ZERO)];
        let rates = TaxRates {
            ppn_rate: dec!(11),
            pph21_rate: dec!(100),
            pph23_rate: dec!(11),
            ..TaxRates::default()
        };
        let totals = compute_totals(&items, Decimal::ZERO, &rates).unwrap();
        assert_eq!(totals.tax_additions, dec!(110000));
        assert_eq!(totals.tax_deductions, dec!(1110000));
        assert_eq!(totals.total_amount, dec!(0));
    }

    #[test]
    fn empty_item_list_yields_zero_totals() {
        let totals = compute_totals(&[], Decimal::ZERO, &TaxRates::ppn(dec!(11))).unwrap();
        assert_eq!(totals, Totals::default());
    }

    fn arb_line() -> impl Strategy<Value = LineInput> {
        (1i64..100, 0i64..10_000_000, 0i64..10_000).prop_map(|(qty, price, disc)| LineInput {
            quantity: qty,
            unit_price: Decimal::from(price),
            discount: Decimal::from(disc),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: identical inputs always produce identical totals.
        #[test]
        fn compute_is_idempotent(
            items in prop::collection::vec(arb_line(), 0..12),
            discount in 0i64..=100,
            ppn in 0i64..=100,
        ) {
            let rates = TaxRates::ppn(Decimal::from(ppn));
            let a = compute_totals(&items, Decimal::from(discount), &rates).unwrap();
            let b = compute_totals(&items, Decimal::from(discount), &rates).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Property: line-item order does not affect the result.
        #[test]
        fn compute_is_invariant_under_reordering(
            items in prop::collection::vec(arb_line(), 0..12),
            discount in 0i64..=100,
            ppn in 0i64..=100,
        ) {
            let rates = TaxRates::ppn(Decimal::from(ppn));
            let forward = compute_totals(&items, Decimal::from(discount), &rates).unwrap();
            let mut reversed = items.clone();
            reversed.reverse();
            let backward = compute_totals(&reversed, Decimal::from(discount), &rates).unwrap();
            prop_assert_eq!(forward, backward);
        }

        /// Property: the final total is never negative.
        #[test]
        fn total_is_never_negative(
            items in prop::collection::vec(arb_line(), 0..12),
            discount in 0i64..=100,
            pph in 0i64..=100,
        ) {
            let rates = TaxRates {
                pph21_rate: Decimal::from(pph),
                ..TaxRates::default()
            };
            let totals = compute_totals(&items, Decimal::from(discount), &rates).unwrap();
            prop_assert!(totals.total_amount >= Decimal::ZERO);
        }
    }
}
