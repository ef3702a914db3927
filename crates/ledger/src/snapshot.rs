//! Export document: a whole-ledger snapshot taken on request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::transaction::Transaction;

/// `{ "customers": [...], "transactions": [...], "exportDate": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
    pub export_date: DateTime<Utc>,
}

impl LedgerExport {
    /// Whether two exports carry the same ledger content (export time ignored).
    pub fn same_content(&self, other: &LedgerExport) -> bool {
        self.customers == other.customers && self.transactions == other.transactions
    }
}
