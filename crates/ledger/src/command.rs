//! Typed, already-validated ledger commands.
//!
//! Commands carry the processing timestamp explicitly; the ledger never reads
//! a clock on its own.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::{Amount, CustomerId, TransactionId};

use crate::customer::CustomerProfile;
use crate::transaction::TransactionKind;

/// Command: CreateCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub customer_id: CustomerId,
    pub profile: CustomerProfile,
    pub opening_balance: Decimal,
    pub occurred_at: DateTime<Utc>,
}

impl CreateCustomer {
    pub fn new(profile: CustomerProfile, opening_balance: Decimal, occurred_at: DateTime<Utc>) -> Self {
        Self {
            customer_id: CustomerId::new(),
            profile,
            opening_balance,
            occurred_at,
        }
    }
}

/// Command: RecordTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransaction {
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub kind: TransactionKind,
    pub amount: Amount,
    /// Calendar date of the transaction; `None` means the processing date.
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl RecordTransaction {
    pub fn new(
        customer_id: CustomerId,
        kind: TransactionKind,
        amount: Amount,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            customer_id,
            kind,
            amount,
            date: None,
            description: None,
            occurred_at,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The effective transaction date.
    pub fn effective_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| self.occurred_at.date_naive())
    }
}
