//! Parse-and-validate boundary for form-style input.
//!
//! Forms hold raw strings exactly as a UI would deliver them. `parse` turns a
//! form into a typed command or a `Validation` error; nothing untyped reaches
//! the store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use tally_core::money::{ensure_within_limit, parse_decimal};
use tally_core::{Amount, CustomerId, DomainError, DomainResult, TransactionId};

use crate::command::{CreateCustomer, RecordTransaction};
use crate::customer::CustomerProfile;
use crate::transaction::TransactionKind;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Numeric fields come as strings from a form and as numbers from JSON
/// callers. Either way `parse` sees the raw text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl RawNumber {
    fn into_text(self) -> String {
        match self {
            RawNumber::Text(text) => text,
            RawNumber::Signed(n) => n.to_string(),
            RawNumber::Unsigned(n) => n.to_string(),
            RawNumber::Float(n) => n.to_string(),
        }
    }
}

fn number_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawNumber::deserialize(deserializer).map(RawNumber::into_text)
}

fn optional_number_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawNumber>::deserialize(deserializer).map(|raw| raw.map(RawNumber::into_text))
}

/// Raw "new customer" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Blank or absent means zero.
    #[serde(deserialize_with = "optional_number_text")]
    pub opening_balance: Option<String>,
}

impl CustomerForm {
    pub fn parse(&self, occurred_at: DateTime<Utc>) -> DomainResult<CreateCustomer> {
        let profile = CustomerProfile {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            notes: self.notes.clone(),
        }
        .normalized()?;

        if let Some(email) = profile.email.as_deref() {
            if !email.contains('@') {
                return Err(DomainError::validation(format!(
                    "email '{email}' is not an address"
                )));
            }
        }

        let opening_balance = match self.opening_balance.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => ensure_within_limit(
                parse_decimal(raw, "opening balance")?,
                "opening balance",
            )?,
        };

        Ok(CreateCustomer::new(profile, opening_balance, occurred_at))
    }
}

/// Raw "record transaction" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionForm {
    pub customer_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "number_text")]
    pub amount: String,
    /// `YYYY-MM-DD`; blank or absent means the processing date.
    pub date: Option<String>,
    pub description: Option<String>,
}

impl TransactionForm {
    pub fn parse(&self, occurred_at: DateTime<Utc>) -> DomainResult<RecordTransaction> {
        let customer_id: CustomerId = self
            .customer_id
            .parse()
            .map_err(|e: DomainError| DomainError::validation(e.to_string()))?;
        let kind: TransactionKind = self.kind.parse()?;
        let amount: Amount = self.amount.parse()?;

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
                DomainError::validation(format!("date '{raw}' is not YYYY-MM-DD: {e}"))
            })?),
        };

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(RecordTransaction {
            transaction_id: TransactionId::new(),
            customer_id,
            kind,
            amount,
            date,
            description,
            occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    fn transaction_form(customer_id: CustomerId) -> TransactionForm {
        TransactionForm {
            customer_id: customer_id.to_string(),
            kind: "debit".to_string(),
            amount: "50.00".to_string(),
            date: None,
            description: None,
        }
    }

    #[test]
    fn customer_form_defaults_opening_balance_to_zero() {
        let form = CustomerForm {
            name: "Ada".to_string(),
            opening_balance: Some("  ".to_string()),
            ..CustomerForm::default()
        };
        let cmd = form.parse(now()).unwrap();
        assert_eq!(cmd.opening_balance, Decimal::ZERO);
        assert_eq!(cmd.profile.name, "Ada");
        assert_eq!(cmd.occurred_at, now());
    }

    #[test]
    fn customer_form_accepts_negative_opening_balance() {
        let form = CustomerForm {
            name: "Ada".to_string(),
            opening_balance: Some("-12.75".to_string()),
            ..CustomerForm::default()
        };
        assert_eq!(form.parse(now()).unwrap().opening_balance, dec!(-12.75));
    }

    #[test]
    fn customer_form_rejects_bad_input() {
        let empty_name = CustomerForm::default();
        assert!(matches!(empty_name.parse(now()), Err(DomainError::Validation(_))));

        let bad_balance = CustomerForm {
            name: "Ada".to_string(),
            opening_balance: Some("lots".to_string()),
            ..CustomerForm::default()
        };
        assert!(matches!(bad_balance.parse(now()), Err(DomainError::Validation(_))));

        let bad_email = CustomerForm {
            name: "Ada".to_string(),
            email: Some("ada.example.com".to_string()),
            ..CustomerForm::default()
        };
        assert!(matches!(bad_email.parse(now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn transaction_form_parses_into_command() {
        let customer_id = CustomerId::new();
        let form = TransactionForm {
            kind: "Credit".to_string(),
            date: Some("2024-01-31".to_string()),
            description: Some("  cash payment ".to_string()),
            ..transaction_form(customer_id)
        };

        let cmd = form.parse(now()).unwrap();
        assert_eq!(cmd.customer_id, customer_id);
        assert_eq!(cmd.kind, TransactionKind::Credit);
        assert_eq!(cmd.amount.value(), dec!(50.00));
        assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(cmd.description.as_deref(), Some("cash payment"));
    }

    #[test]
    fn missing_date_falls_back_to_processing_date() {
        let cmd = transaction_form(CustomerId::new()).parse(now()).unwrap();
        assert_eq!(cmd.date, None);
        assert_eq!(cmd.effective_date(), now().date_naive());
    }

    #[test]
    fn transaction_form_rejects_non_positive_or_garbled_amounts() {
        for raw in ["0", "-5", "0.00", "abc", ""] {
            let form = TransactionForm {
                amount: raw.to_string(),
                ..transaction_form(CustomerId::new())
            };
            assert!(
                matches!(form.parse(now()), Err(DomainError::Validation(_))),
                "amount {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn transaction_form_rejects_bad_ids_kinds_and_dates() {
        let base = transaction_form(CustomerId::new());

        let bad_id = TransactionForm {
            customer_id: "nope".to_string(),
            ..base.clone()
        };
        assert!(matches!(bad_id.parse(now()), Err(DomainError::Validation(_))));

        let bad_kind = TransactionForm {
            kind: "refund".to_string(),
            ..base.clone()
        };
        assert!(matches!(bad_kind.parse(now()), Err(DomainError::Validation(_))));

        let bad_date = TransactionForm {
            date: Some("31/01/2024".to_string()),
            ..base
        };
        assert!(matches!(bad_date.parse(now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn numeric_json_fields_read_as_text() {
        let id = CustomerId::new();
        let form: TransactionForm = serde_json::from_value(serde_json::json!({
            "customerId": id.to_string(),
            "type": "credit",
            "amount": 12.5,
        }))
        .unwrap();
        assert_eq!(form.amount, "12.5");
        assert_eq!(form.parse(now()).unwrap().amount.value(), dec!(12.5));

        let form: TransactionForm = serde_json::from_value(serde_json::json!({
            "customerId": id.to_string(),
            "type": "debit",
            "amount": 0,
        }))
        .unwrap();
        assert!(matches!(form.parse(now()), Err(DomainError::Validation(_))));

        let form: CustomerForm =
            serde_json::from_value(serde_json::json!({ "name": "Ada", "openingBalance": -40 }))
                .unwrap();
        assert_eq!(form.parse(now()).unwrap().opening_balance, dec!(-40));

        let form: CustomerForm =
            serde_json::from_value(serde_json::json!({ "name": "Ada", "openingBalance": null }))
                .unwrap();
        assert_eq!(form.opening_balance, None);
    }
}
