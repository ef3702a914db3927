use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::{CustomerId, DomainError, DomainResult, Entity};

/// Descriptive customer fields (everything except balances).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trim every field; blank optional fields become `None`.
    ///
    /// Fails if the name is empty after trimming.
    pub fn normalized(self) -> DomainResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            name,
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            address: non_blank(self.address),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A customer and its derived balance state.
///
/// `balance` always equals `opening_balance` plus the signed sum of the
/// customer's transactions in insertion order. Only the ledger store mutates
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: CustomerId,
    #[serde(flatten)]
    profile: CustomerProfile,
    opening_balance: Decimal,
    balance: Decimal,
    last_transaction_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Customer {
    pub(crate) fn new(
        id: CustomerId,
        profile: CustomerProfile,
        opening_balance: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile,
            opening_balance,
            balance: opening_balance,
            last_transaction_date: created_at.date_naive(),
            created_at,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn profile(&self) -> &CustomerProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn last_transaction_date(&self) -> NaiveDate {
        self.last_transaction_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move to `new_balance` after a transaction processed on `processed_on`.
    ///
    /// `processed_on` is the processing date, not the transaction's own date.
    pub(crate) fn apply(&mut self, new_balance: Decimal, processed_on: NaiveDate) {
        self.balance = new_balance;
        self.last_transaction_date = processed_on;
    }

    /// Overwrite the derived balance (recompute repair only).
    pub(crate) fn restate_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
