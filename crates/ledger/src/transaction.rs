use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::{Amount, CustomerId, DomainError, Entity, TransactionId};

/// Direction of a transaction.
///
/// A debit raises what the customer owes; a credit (e.g. a payment) lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" => Ok(TransactionKind::Debit),
            "credit" => Ok(TransactionKind::Credit),
            other => Err(DomainError::validation(format!(
                "kind must be one of: debit, credit (got '{other}')"
            ))),
        }
    }
}

/// A recorded transaction (immutable once recorded).
///
/// `balance_after` is derived: the customer's running balance right after this
/// transaction, in insertion order. `date` is caller-supplied metadata and
/// never reorders history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: TransactionId,
    customer_id: CustomerId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Amount,
    date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
    balance_after: Decimal,
    recorded_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: TransactionId,
        customer_id: CustomerId,
        kind: TransactionKind,
        amount: Amount,
        date: NaiveDate,
        description: Option<String>,
        balance_after: Decimal,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            kind,
            amount,
            date,
            description,
            balance_after,
            recorded_at,
        }
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn balance_after(&self) -> Decimal {
        self.balance_after
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Amount with the sign implied by the kind (+ for debit, - for credit).
    pub fn signed_amount(&self) -> Decimal {
        crate::balance::signed_amount(self.kind, self.amount)
    }

    /// Overwrite the derived running balance (recompute repair only).
    pub(crate) fn restate_balance_after(&mut self, balance_after: Decimal) {
        self.balance_after = balance_after;
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
