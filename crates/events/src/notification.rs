//! Balance-change notifications handed to external notifiers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerly_core::AccountId;

/// Direction of a committed balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
}

/// Published once per committed deposit, withdrawal, interest credit or
/// transfer leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNotification {
    pub account_id: AccountId,
    /// Username of the account owner.
    pub owner: String,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub resulting_balance: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_serialize_as_exact_strings() {
        let n = AccountNotification {
            account_id: AccountId::new(),
            owner: "alice".to_string(),
            kind: MovementKind::Deposit,
            amount: Decimal::new(1050, 2),
            resulting_balance: Decimal::new(-30050, 2),
            occurred_at: Utc::now(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["amount"], "10.50");
        assert_eq!(json["resulting_balance"], "-300.50");
        assert_eq!(json["kind"], "deposit");
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&MovementKind::Withdrawal).unwrap();
        assert_eq!(json, "\"withdrawal\"");
    }
}
