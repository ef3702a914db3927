use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_ledger::{Customer, CustomerForm, DeletedCustomer, ReconcileReport, Transaction, TransactionForm};

// -------------------------
// Request DTOs
// -------------------------

/// One line of the `tally` protocol: `{"op": "...", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateCustomer(CustomerForm),
    RecordTransaction(TransactionForm),
    DeleteCustomer(CustomerRef),
    ListCustomers(SearchRequest),
    TransactionHistory(CustomerRef),
    Customer(CustomerRef),
    Summary,
    Export(ExportRequest),
    Reconcile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub customer_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Write the document to this file as well as returning it.
    pub path: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// A recorded transaction together with the customer it moved.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedResponse {
    pub transaction: Transaction,
    pub customer: Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub customer_id: String,
    pub removed_transactions: usize,
}

impl From<DeletedCustomer> for DeletedResponse {
    fn from(deleted: DeletedCustomer) -> Self {
        Self {
            customer_id: deleted.customer.id_typed().to_string(),
            removed_transactions: deleted.removed_transactions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub checked: usize,
    pub repaired: Vec<String>,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(report: ReconcileReport) -> Self {
        Self {
            checked: report.checked,
            repaired: report.repaired.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Row shown in the customer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListItem {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub balance: Decimal,
    pub last_transaction_date: chrono::NaiveDate,
}

impl From<&Customer> for CustomerListItem {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id_typed().to_string(),
            name: c.name().to_string(),
            phone: c.profile().phone.clone(),
            email: c.profile().email.clone(),
            balance: c.balance(),
            last_transaction_date: c.last_transaction_date(),
        }
    }
}
