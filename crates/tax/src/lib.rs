//! Tax & totals calculator.
//!
//! Pure, stateless, deterministic: the same line items, discount rate and tax
//! rates always produce the same `Totals`. The evaluation order (line
//! subtotal, order discount, tax additions, tax deductions) is a contract —
//! reordering it changes the legal/tax meaning of the result.

pub mod rates;
pub mod totals;

pub use rates::TaxRates;
pub use totals::{compute_totals, LineInput, Totals};
