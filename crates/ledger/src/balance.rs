//! Balance engine: pure running-balance computation.
//!
//! This is the ground truth for every stored balance. The ledger store keeps
//! balances incrementally; [`recompute_balance`] folds the full history and
//! must always agree with it.

use rust_decimal::Decimal;

use tally_core::{Amount, DomainError, DomainResult};

use crate::transaction::{Transaction, TransactionKind};

/// `+amount` for a debit, `-amount` for a credit.
pub fn signed_amount(kind: TransactionKind, amount: Amount) -> Decimal {
    match kind {
        TransactionKind::Debit => amount.value(),
        TransactionKind::Credit => -amount.value(),
    }
}

/// Anything that moves a running balance by a signed amount.
pub trait SignedEntry {
    fn signed_amount(&self) -> Decimal;
}

impl SignedEntry for Transaction {
    fn signed_amount(&self) -> Decimal {
        Transaction::signed_amount(self)
    }
}

impl SignedEntry for (TransactionKind, Amount) {
    fn signed_amount(&self) -> Decimal {
        signed_amount(self.0, self.1)
    }
}

impl<T: SignedEntry + ?Sized> SignedEntry for &T {
    fn signed_amount(&self) -> Decimal {
        (**self).signed_amount()
    }
}

/// Result of folding a history from its opening balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReplay {
    pub opening_balance: Decimal,
    pub final_balance: Decimal,
    /// Running balance after each entry, in input order.
    pub balances_after: Vec<Decimal>,
}

/// Fold signed amounts left to right starting from `opening_balance`.
///
/// Entries are assumed pre-validated (positive amounts within the magnitude
/// limit).
pub fn recompute_balance<I>(opening_balance: Decimal, entries: I) -> BalanceReplay
where
    I: IntoIterator,
    I::Item: SignedEntry,
{
    let mut running = opening_balance;
    let balances_after = entries
        .into_iter()
        .map(|entry| {
            running += entry.signed_amount();
            running
        })
        .collect();

    BalanceReplay {
        opening_balance,
        final_balance: running,
        balances_after,
    }
}

impl BalanceReplay {
    /// Check stored derived values against this replay.
    ///
    /// `stored_after` must list the stored `balance_after` values in the same
    /// order the replay was computed over.
    pub fn verify<I>(&self, stored_balance: Decimal, stored_after: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut stored_count = 0usize;
        for (idx, stored) in stored_after.into_iter().enumerate() {
            stored_count += 1;
            match self.balances_after.get(idx) {
                Some(expected) if *expected == stored => {}
                Some(expected) => {
                    return Err(DomainError::consistency(format!(
                        "balance after entry {idx} is {stored}, recompute gives {expected}"
                    )));
                }
                None => {
                    return Err(DomainError::consistency(format!(
                        "stored history has more entries than the replay ({})",
                        self.balances_after.len()
                    )));
                }
            }
        }

        if stored_count != self.balances_after.len() {
            return Err(DomainError::consistency(format!(
                "stored history has {stored_count} entries, replay has {}",
                self.balances_after.len()
            )));
        }

        if stored_balance != self.final_balance {
            return Err(DomainError::consistency(format!(
                "stored balance is {stored_balance}, recompute gives {}",
                self.final_balance
            )));
        }

        Ok(())
    }
}
