//! Customer ledger (per-customer running balances).
//!
//! Pure domain logic only: no IO, no persistence concerns. The
//! [`LedgerStore`] owns customers and their append-only transaction history;
//! the [`balance`] module is the recompute ground truth it is checked against.

pub mod balance;
pub mod command;
pub mod customer;
pub mod input;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod transaction;

pub use balance::{BalanceReplay, SignedEntry, recompute_balance, signed_amount};
pub use command::{CreateCustomer, RecordTransaction};
pub use customer::{Customer, CustomerProfile};
pub use input::{CustomerForm, TransactionForm};
pub use query::CustomerQuery;
pub use snapshot::LedgerExport;
pub use store::{DeletedCustomer, LedgerStore, LedgerSummary, ReconcileReport};
pub use transaction::{Transaction, TransactionKind};
