//! Tax rate configuration for a purchase.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use procur_core::{DomainError, DomainResult, ValueObject};

/// Percentage rate set applied on top of the discounted subtotal.
///
/// PPN and "other additions" increase the payable amount; PPh 21/23 and
/// "other deductions" are withheld from it. All rates are percentages in
/// `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxRates {
    pub ppn_rate: Decimal,
    pub other_tax_additions: Decimal,
    pub pph21_rate: Decimal,
    pub pph23_rate: Decimal,
    pub other_tax_deductions: Decimal,
}

impl ValueObject for TaxRates {}

impl TaxRates {
    /// PPN-only rate set (the common case).
    pub fn ppn(ppn_rate: Decimal) -> Self {
        Self {
            ppn_rate,
            ..Self::default()
        }
    }

    /// Validate and normalize the rate set.
    ///
    /// Negative rates are caller errors and fail validation; rates above 100
    /// are clamped to 100 rather than rejected.
    pub fn validated(&self) -> DomainResult<Self> {
        Ok(Self {
            ppn_rate: validate_percent("ppn_rate", self.ppn_rate)?,
            other_tax_additions: validate_percent("other_tax_additions", self.other_tax_additions)?,
            pph21_rate: validate_percent("pph21_rate", self.pph21_rate)?,
            pph23_rate: validate_percent("pph23_rate", self.pph23_rate)?,
            other_tax_deductions: validate_percent(
                "other_tax_deductions",
                self.other_tax_deductions,
            )?,
        })
    }

    /// Combined addition rate (PPN + other additions), as a percentage.
    pub fn addition_rate(&self) -> Decimal {
        self.ppn_rate + self.other_tax_additions
    }

    /// Combined deduction rate (PPh 21 + PPh 23 + other deductions), as a percentage.
    pub fn deduction_rate(&self) -> Decimal {
        self.pph21_rate + self.pph23_rate + self.other_tax_deductions
    }
}

/// Validate a single percentage: reject negatives, clamp the upper bound.
pub(crate) fn validate_percent(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    Ok(value.min(Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_rate_fails_validation() {
        let rates = TaxRates::ppn(dec!(-1));
        let err = rates.validated().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rate_above_hundred_clamps() {
        let rates = TaxRates::ppn(dec!(250)).validated().unwrap();
        assert_eq!(rates.ppn_rate, dec!(100));
    }

    #[test]
    fn combined_rates_sum_components() {
        let rates = TaxRates {
            ppn_rate: dec!(11),
            other_tax_additions: dec!(1),
            pph21_rate: dec!(2),
            pph23_rate: dec!(3),
            other_tax_deductions: dec!(0.5),
        };
        assert_eq!(rates.addition_rate(), dec!(12));
        assert_eq!(rates.deduction_rate(), dec!(5.5));
    }
}
