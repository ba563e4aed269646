use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use ledgerly_core::{AccountId, Money, TransactionId, is_positive_amount};

use crate::kind::AccountKind;
use crate::transaction::{Transaction, TransactionKind};

/// Decimal places interest credits are rounded to.
pub const INTEREST_SCALE: u32 = 2;

/// Ledger error (expected, recoverable outcomes).
///
/// A rejected operation never changes the account: no balance update and no
/// transaction record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be positive")]
    InvalidAmount,

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("overdraft limit {limit} exceeded: balance {balance}, requested {requested}")]
    OverdraftExceeded {
        limit: Decimal,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("invalid account kind: {0}")]
    InvalidAccountKind(String),

    #[error("interest can only be applied to savings accounts")]
    InterestNotApplicable,

    #[error("balance arithmetic overflow")]
    BalanceOverflow,
}

/// History replay failure: the stored history does not explain the balance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("transaction {0} has a non-positive amount")]
    NonPositiveAmount(TransactionId),

    #[error("transaction {0} does not reproduce its resulting balance")]
    BalanceMismatch(TransactionId),

    #[error("transaction {0} takes the balance below the account floor")]
    FloorViolated(TransactionId),

    #[error("transaction {0} appears more than once")]
    DuplicateTransaction(TransactionId),

    #[error("history replays to {replayed} but the balance is {balance}")]
    FinalBalanceMismatch { replayed: Decimal, balance: Decimal },
}

/// Failure to rebuild an account from persisted parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error(transparent)]
    Kind(#[from] LedgerError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// A bank account: balance, kind-specific policy and append-only history.
///
/// # Invariants
/// - `balance >= kind.floor()` after every committed mutation.
/// - Replaying `history` from zero reproduces every `resulting_balance` and
///   ends at `balance`.
/// - Balance update and history append happen together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    kind: AccountKind,
    balance: Money,
    history: Vec<Transaction>,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Open a fresh account with a zero balance.
    pub fn open(kind: AccountKind) -> Result<Self, LedgerError> {
        kind.validate()?;
        Ok(Self {
            id: AccountId::new(),
            kind,
            balance: Decimal::ZERO,
            history: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Rebuild a persisted account, replaying its history first.
    pub fn from_parts(
        id: AccountId,
        kind: AccountKind,
        balance: Money,
        history: Vec<Transaction>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RestoreError> {
        kind.validate()?;
        let account = Self {
            id,
            kind,
            balance,
            history,
            created_at,
        };
        account.replay()?;
        Ok(account)
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.history.last()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lowest balance this account may hold.
    pub fn floor(&self) -> Money {
        self.kind.floor()
    }

    /// Balance after depositing `amount`, without changing anything.
    pub fn preview_deposit(&self, amount: Money) -> Result<Money, LedgerError> {
        if !is_positive_amount(amount) {
            return Err(LedgerError::InvalidAmount);
        }
        self.balance.checked_add(amount).ok_or(LedgerError::BalanceOverflow)
    }

    /// Balance after withdrawing `amount`, without changing anything.
    pub fn preview_withdraw(&self, amount: Money) -> Result<Money, LedgerError> {
        if !is_positive_amount(amount) {
            return Err(LedgerError::InvalidAmount);
        }
        self.kind.authorize_withdrawal(self.balance, amount)
    }

    pub fn deposit(&mut self, amount: Money) -> Result<Money, LedgerError> {
        let next = self.preview_deposit(amount)?;
        self.commit(TransactionKind::Deposit, amount, next);
        Ok(next)
    }

    pub fn withdraw(&mut self, amount: Money) -> Result<Money, LedgerError> {
        let next = self.preview_withdraw(amount)?;
        self.commit(TransactionKind::Withdrawal, amount, next);
        Ok(next)
    }

    /// Credit savings interest rounded to [`INTEREST_SCALE`] places.
    ///
    /// Returns `Ok(None)` when the interest is not positive; nothing is
    /// recorded in that case.
    pub fn apply_interest(&mut self) -> Result<Option<Money>, LedgerError> {
        self.apply_interest_with_scale(INTEREST_SCALE)
    }

    pub fn apply_interest_with_scale(&mut self, scale: u32) -> Result<Option<Money>, LedgerError> {
        let AccountKind::Savings { rate } = self.kind else {
            return Err(LedgerError::InterestNotApplicable);
        };

        let interest = self
            .balance
            .checked_mul(rate)
            .ok_or(LedgerError::BalanceOverflow)?
            .round_dp(scale);

        if !is_positive_amount(interest) {
            return Ok(None);
        }
        self.deposit(interest).map(Some)
    }

    /// Check the history invariants against the current balance.
    pub fn replay(&self) -> Result<(), ReplayError> {
        let floor = self.floor();
        let mut seen = HashSet::with_capacity(self.history.len());
        let mut running = Decimal::ZERO;

        for tx in &self.history {
            if !seen.insert(tx.id()) {
                return Err(ReplayError::DuplicateTransaction(tx.id()));
            }
            if !is_positive_amount(tx.amount()) {
                return Err(ReplayError::NonPositiveAmount(tx.id()));
            }
            running = running
                .checked_add(tx.signed_amount())
                .ok_or(ReplayError::BalanceMismatch(tx.id()))?;
            if running != tx.resulting_balance() {
                return Err(ReplayError::BalanceMismatch(tx.id()));
            }
            if running < floor {
                return Err(ReplayError::FloorViolated(tx.id()));
            }
        }

        if running != self.balance {
            return Err(ReplayError::FinalBalanceMismatch {
                replayed: running,
                balance: self.balance,
            });
        }
        Ok(())
    }

    fn commit(&mut self, kind: TransactionKind, amount: Money, next: Money) {
        self.history.push(Transaction::record(kind, amount, next));
        self.balance = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn open(kind: AccountKind) -> Account {
        Account::open(kind).unwrap()
    }

    #[test]
    fn deposit_records_resulting_balance() {
        let mut account = open(AccountKind::Basic);

        assert_eq!(account.deposit(dec(100)), Ok(dec(100)));
        assert_eq!(account.deposit(dec(50)), Ok(dec(150)));

        let last = account.last_transaction().unwrap();
        assert_eq!(last.kind(), TransactionKind::Deposit);
        assert_eq!(last.amount(), dec(50));
        assert_eq!(last.resulting_balance(), dec(150));
        assert_eq!(account.history().len(), 2);
    }

    #[test]
    fn non_positive_amounts_change_nothing() {
        let mut account = open(AccountKind::Basic);
        account.deposit(dec(10)).unwrap();
        let before = account.clone();

        assert_eq!(account.deposit(Decimal::ZERO), Err(LedgerError::InvalidAmount));
        assert_eq!(account.deposit(dec(-5)), Err(LedgerError::InvalidAmount));
        assert_eq!(account.withdraw(Decimal::ZERO), Err(LedgerError::InvalidAmount));
        assert_eq!(account.withdraw(dec(-5)), Err(LedgerError::InvalidAmount));

        assert_eq!(account, before);
    }

    #[test]
    fn basic_account_cannot_go_negative() {
        let mut account = open(AccountKind::Basic);
        account.deposit(dec(100)).unwrap();
        let before = account.clone();

        let err = account.withdraw(dec(101)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(account, before);

        assert_eq!(account.withdraw(dec(100)), Ok(dec(0)));
    }

    #[test]
    fn checking_overdraft_scenario() {
        let mut account = open(AccountKind::checking(dec(500)));

        assert_eq!(account.deposit(dec(100)), Ok(dec(100)));
        assert_eq!(account.withdraw(dec(400)), Ok(dec(-300)));

        let err = account.withdraw(dec(300)).unwrap_err();
        assert!(matches!(err, LedgerError::OverdraftExceeded { .. }));
        assert_eq!(account.balance(), dec(-300));
        assert_eq!(account.history().len(), 2);
    }

    #[test]
    fn checking_limit_is_inclusive() {
        let mut account = open(AccountKind::checking(dec(500)));

        assert_eq!(account.withdraw(dec(500)), Ok(dec(-500)));
        assert!(matches!(
            account.withdraw(Decimal::new(1, 2)),
            Err(LedgerError::OverdraftExceeded { .. })
        ));
        assert_eq!(account.balance(), dec(-500));
    }

    #[test]
    fn savings_interest_scenario() {
        let mut account = open(AccountKind::savings(Decimal::new(5, 2)));
        account.deposit(dec(1000)).unwrap();

        assert_eq!(account.apply_interest(), Ok(Some(dec(1050))));

        let last = account.last_transaction().unwrap();
        assert_eq!(last.kind(), TransactionKind::Deposit);
        assert_eq!(last.amount(), dec(50));
        assert_eq!(account.balance(), dec(1050));
    }

    #[test]
    fn zero_interest_is_a_no_op() {
        let mut account = open(AccountKind::savings(Decimal::new(5, 2)));
        assert_eq!(account.apply_interest(), Ok(None));
        assert!(account.history().is_empty());

        let mut zero_rate = open(AccountKind::savings(Decimal::ZERO));
        zero_rate.deposit(dec(100)).unwrap();
        assert_eq!(zero_rate.apply_interest(), Ok(None));
        assert_eq!(zero_rate.history().len(), 1);
    }

    #[test]
    fn interest_is_rounded_to_cents() {
        let mut account = open(AccountKind::savings(Decimal::new(333, 4)));
        account.deposit(Decimal::new(1001, 1)).unwrap();

        // 100.1 * 0.0333 = 3.33333
        assert_eq!(account.apply_interest(), Ok(Some(Decimal::new(10343, 2))));
    }

    #[test]
    fn interest_only_for_savings() {
        let mut account = open(AccountKind::Basic);
        account.deposit(dec(100)).unwrap();
        assert_eq!(account.apply_interest(), Err(LedgerError::InterestNotApplicable));
        assert_eq!(account.history().len(), 1);
    }

    #[test]
    fn open_rejects_invalid_kind() {
        assert!(matches!(
            Account::open(AccountKind::checking(dec(-10))),
            Err(LedgerError::InvalidAccountKind(_))
        ));
    }

    #[test]
    fn overflow_is_rejected_without_change() {
        let mut account = open(AccountKind::Basic);
        account.deposit(Decimal::MAX).unwrap();
        let before = account.clone();

        assert_eq!(account.deposit(dec(1)), Err(LedgerError::BalanceOverflow));
        assert_eq!(account, before);
    }

    #[test]
    fn from_parts_accepts_a_consistent_history() {
        let mut account = open(AccountKind::checking(dec(50)));
        account.deposit(dec(20)).unwrap();
        account.withdraw(dec(60)).unwrap();

        let restored = Account::from_parts(
            account.id(),
            account.kind(),
            account.balance(),
            account.history().to_vec(),
            account.created_at(),
        )
        .unwrap();
        assert_eq!(restored, account);
    }

    #[test]
    fn from_parts_rejects_a_tampered_balance() {
        let mut account = open(AccountKind::Basic);
        account.deposit(dec(20)).unwrap();

        let err = Account::from_parts(
            account.id(),
            account.kind(),
            dec(25),
            account.history().to_vec(),
            account.created_at(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RestoreError::Replay(ReplayError::FinalBalanceMismatch { .. })
        ));
    }

    #[test]
    fn from_parts_rejects_history_below_floor() {
        let tx = Transaction::from_parts(
            TransactionId::new(),
            TransactionKind::Withdrawal,
            dec(10),
            dec(-10),
            Utc::now(),
        );
        let err = Account::from_parts(AccountId::new(), AccountKind::Basic, dec(-10), vec![tx], Utc::now())
            .unwrap_err();
        assert!(matches!(err, RestoreError::Replay(ReplayError::FloorViolated(_))));
    }

    #[test]
    fn from_parts_rejects_duplicate_transactions() {
        let tx = Transaction::from_parts(
            TransactionId::new(),
            TransactionKind::Deposit,
            dec(10),
            dec(10),
            Utc::now(),
        );
        let second = Transaction::from_parts(tx.id(), TransactionKind::Deposit, dec(10), dec(20), Utc::now());

        let err = Account::from_parts(AccountId::new(), AccountKind::Basic, dec(20), vec![tx, second], Utc::now())
            .unwrap_err();
        assert!(matches!(err, RestoreError::Replay(ReplayError::DuplicateTransaction(_))));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(i64),
        Withdraw(i64),
        Interest,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50i64..10_000).prop_map(Op::Deposit),
            (-50i64..10_000).prop_map(Op::Withdraw),
            Just(Op::Interest),
        ]
    }

    fn kind_strategy() -> impl Strategy<Value = AccountKind> {
        prop_oneof![
            Just(AccountKind::Basic),
            (0i64..20).prop_map(|r| AccountKind::savings(Decimal::new(r, 2))),
            (0i64..5_000).prop_map(|l| AccountKind::checking(Decimal::from(l))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of operations is attempted, the
        /// history replays to the balance and the floor is never crossed.
        #[test]
        fn history_always_replays_to_balance(
            kind in kind_strategy(),
            ops in prop::collection::vec(op_strategy(), 0..40)
        ) {
            let mut account = Account::open(kind).unwrap();

            for op in ops {
                let before = account.clone();
                let result = match op {
                    Op::Deposit(cents) => account.deposit(Decimal::new(cents, 2)).map(Some),
                    Op::Withdraw(cents) => account.withdraw(Decimal::new(cents, 2)).map(Some),
                    Op::Interest => account.apply_interest(),
                };

                match result {
                    Ok(Some(_)) => prop_assert_eq!(account.history().len(), before.history().len() + 1),
                    Ok(None) | Err(_) => prop_assert_eq!(&account, &before),
                }
                prop_assert!(account.balance() >= account.floor());
            }

            prop_assert!(account.replay().is_ok());
        }

        /// Property: a checking account accepts a withdrawal landing exactly
        /// on `-limit` and refuses one cent more.
        #[test]
        fn checking_floor_is_exact(limit in 0i64..100_000, start in 0i64..100_000) {
            let mut account = Account::open(AccountKind::checking(Decimal::new(limit, 2))).unwrap();
            if start > 0 {
                account.deposit(Decimal::new(start, 2)).unwrap();
            }

            let too_much = Decimal::new(start + limit + 1, 2);
            let before = account.clone();
            let refused = matches!(
                account.withdraw(too_much),
                Err(LedgerError::OverdraftExceeded { .. })
            );
            prop_assert!(refused);
            prop_assert_eq!(&account, &before);

            let exact = Decimal::new(start + limit, 2);
            if exact > Decimal::ZERO {
                prop_assert_eq!(account.withdraw(exact), Ok(-Decimal::new(limit, 2)));
            }
        }
    }
}
