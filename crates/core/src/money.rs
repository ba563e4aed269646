//! Monetary amounts.
//!
//! Balances and amounts are exact decimals; no floating point is involved in
//! any ledger arithmetic.

use rust_decimal::Decimal;

/// A signed monetary value (balances may be negative on overdraft accounts).
pub type Money = Decimal;

/// Whether `amount` is usable as a deposit, withdrawal or transfer amount.
pub fn is_positive_amount(amount: Money) -> bool {
    amount > Decimal::ZERO
}
