use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerly_core::{Money, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

/// One committed balance change (immutable).
///
/// `amount` is always positive; the direction is carried by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    amount: Money,
    resulting_balance: Money,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn record(kind: TransactionKind, amount: Money, resulting_balance: Money) -> Self {
        Self {
            id: TransactionId::new(),
            kind,
            amount,
            resulting_balance,
            timestamp: Utc::now(),
        }
    }

    /// Rebuild a transaction from persisted fields.
    ///
    /// No validation happens here; [`crate::Account::from_parts`] replays the
    /// whole history before accepting it.
    pub fn from_parts(
        id: TransactionId,
        kind: TransactionKind,
        amount: Money,
        resulting_balance: Money,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            resulting_balance,
            timestamp,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn resulting_balance(&self) -> Money {
        self.resulting_balance
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Amount with the sign it contributes to the balance.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdrawal => -self.amount,
        }
    }
}

impl core::fmt::Display for Transaction {
    /// `2024-05-01T10:00:00Z - DEPOSIT: 100.00, Balance: 100.00`
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} - {}: {}, Balance: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.kind.as_str().to_uppercase(),
            display_money(self.amount),
            display_money(self.resulting_balance),
        )
    }
}

fn display_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}
