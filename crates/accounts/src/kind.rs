use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerly_core::Money;

use crate::account::LedgerError;

/// Account variant; decides the withdrawal floor.
///
/// - `Basic` and `Savings` may never go below zero.
/// - `Checking` may go down to `-overdraft_limit` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccountKind {
    Basic,
    Savings {
        /// Interest rate per application, e.g. `0.05` for 5%.
        rate: Decimal,
    },
    Checking {
        overdraft_limit: Decimal,
    },
}

impl AccountKind {
    pub fn savings(rate: Decimal) -> Self {
        Self::Savings { rate }
    }

    pub fn checking(overdraft_limit: Decimal) -> Self {
        Self::Checking { overdraft_limit }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Basic => "basic",
            AccountKind::Savings { .. } => "savings",
            AccountKind::Checking { .. } => "checking",
        }
    }

    /// Reject parameters that would make the floor meaningless.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self {
            AccountKind::Basic => Ok(()),
            AccountKind::Savings { rate } if *rate < Decimal::ZERO => Err(
                LedgerError::InvalidAccountKind(format!("negative interest rate {rate}")),
            ),
            AccountKind::Checking { overdraft_limit } if *overdraft_limit < Decimal::ZERO => {
                Err(LedgerError::InvalidAccountKind(format!(
                    "negative overdraft limit {overdraft_limit}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Lowest balance this kind of account may hold.
    pub fn floor(&self) -> Money {
        match self {
            AccountKind::Basic | AccountKind::Savings { .. } => Decimal::ZERO,
            AccountKind::Checking { overdraft_limit } => -*overdraft_limit,
        }
    }

    /// Withdrawal policy: the balance after withdrawing `amount`, or the
    /// kind-specific refusal.
    ///
    /// `amount` is assumed positive; the account checks that first.
    pub fn authorize_withdrawal(&self, balance: Money, amount: Money) -> Result<Money, LedgerError> {
        let next = balance.checked_sub(amount).ok_or(LedgerError::BalanceOverflow)?;
        if next >= self.floor() {
            return Ok(next);
        }

        Err(match self {
            AccountKind::Checking { overdraft_limit } => LedgerError::OverdraftExceeded {
                limit: *overdraft_limit,
                balance,
                requested: amount,
            },
            AccountKind::Basic | AccountKind::Savings { .. } => LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            },
        })
    }
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountKind::Basic => write!(f, "basic"),
            AccountKind::Savings { rate } => write!(f, "savings (rate {rate})"),
            AccountKind::Checking { overdraft_limit } => {
                write!(f, "checking (overdraft limit {overdraft_limit})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn basic_and_savings_floor_is_zero() {
        assert_eq!(AccountKind::Basic.floor(), Decimal::ZERO);
        assert_eq!(AccountKind::savings(Decimal::new(5, 2)).floor(), Decimal::ZERO);
    }

    #[test]
    fn checking_floor_is_negative_limit() {
        assert_eq!(AccountKind::checking(dec(500)).floor(), dec(-500));
    }

    #[test]
    fn landing_exactly_on_the_floor_is_allowed() {
        assert_eq!(AccountKind::Basic.authorize_withdrawal(dec(100), dec(100)), Ok(dec(0)));
        assert_eq!(
            AccountKind::checking(dec(500)).authorize_withdrawal(dec(100), dec(600)),
            Ok(dec(-500))
        );
    }

    #[test]
    fn refusal_depends_on_kind() {
        assert!(matches!(
            AccountKind::Basic.authorize_withdrawal(dec(10), dec(11)),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            AccountKind::savings(Decimal::ONE).authorize_withdrawal(dec(10), dec(11)),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            AccountKind::checking(dec(5)).authorize_withdrawal(dec(10), dec(16)),
            Err(LedgerError::OverdraftExceeded { .. })
        ));
    }

    #[test]
    fn negative_parameters_are_rejected() {
        assert!(AccountKind::savings(dec(-1)).validate().is_err());
        assert!(AccountKind::checking(dec(-1)).validate().is_err());
        assert!(AccountKind::checking(Decimal::ZERO).validate().is_ok());
        assert!(AccountKind::Basic.validate().is_ok());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(AccountKind::checking(dec(500))).unwrap();
        assert_eq!(json["type"], "checking");
        assert_eq!(json["overdraft_limit"], "500");

        let back: AccountKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, AccountKind::checking(dec(500)));
    }
}
