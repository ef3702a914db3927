//! Persistent ledger: a [`LedgerStore`] bound to a [`KeyValueStore`].
//!
//! Save contract:
//! - every successful mutation is written before it becomes visible;
//! - a rejected mutation performs no write;
//! - a failed write leaves the in-memory ledger unchanged.
//!
//! Mutations run against a working copy which replaces the live ledger only
//! after the save succeeded. The layout persists both collections whole, so
//! the copy costs no more than the serialization that follows it.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use tally_core::{CustomerId, DomainError, DomainResult};
use tally_ledger::{
    CreateCustomer, Customer, DeletedCustomer, LedgerExport, LedgerStore, ReconcileReport,
    RecordTransaction, Transaction,
};

use crate::storage::file::write_replacing;
use crate::storage::{JsonStore, KeyValueStore, StorageError};

pub const CUSTOMERS_KEY: &str = "customers";
pub const TRANSACTIONS_KEY: &str = "transactions";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Verify the touched customer against a full recompute after each
    /// mutation (repairing and logging on divergence).
    pub verify_on_write: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            verify_on_write: true,
        }
    }
}

#[derive(Debug)]
pub struct PersistentLedger<S> {
    ledger: LedgerStore,
    storage: S,
    options: LedgerOptions,
}

impl<S> PersistentLedger<S>
where
    S: KeyValueStore,
{
    /// Load the ledger from `storage` (missing keys mean an empty ledger).
    ///
    /// If loading had to repair diverged balances, the repaired state is
    /// written back immediately.
    pub fn open(storage: S, options: LedgerOptions) -> Result<Self, LedgerError> {
        let customers: Vec<Customer> = storage.get_json(CUSTOMERS_KEY)?.unwrap_or_default();
        let transactions: Vec<Transaction> =
            storage.get_json(TRANSACTIONS_KEY)?.unwrap_or_default();

        let (ledger, report) = LedgerStore::from_parts(customers, transactions)?;
        tracing::info!(
            customers = ledger.customer_count(),
            transactions = ledger.transaction_count(),
            "ledger loaded"
        );

        let opened = Self {
            ledger,
            storage,
            options,
        };
        if !report.is_clean() {
            opened.flush()?;
        }
        Ok(opened)
    }

    /// Read-only view of the current ledger.
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn create_customer(&mut self, cmd: CreateCustomer) -> Result<Customer, LedgerError> {
        let customer = self.mutate(|ledger| {
            let customer = ledger.create_customer(cmd)?;
            Ok((customer.id_typed(), customer))
        })?;

        tracing::info!(
            customer_id = %customer.id_typed(),
            opening_balance = %customer.opening_balance(),
            "customer created"
        );
        Ok(customer)
    }

    pub fn record_transaction(&mut self, cmd: RecordTransaction) -> Result<Transaction, LedgerError> {
        let transaction = self.mutate(|ledger| {
            let transaction = ledger.record_transaction(cmd)?;
            Ok((transaction.customer_id(), transaction))
        })?;

        tracing::info!(
            transaction_id = %transaction.id_typed(),
            customer_id = %transaction.customer_id(),
            kind = %transaction.kind(),
            amount = %transaction.amount(),
            balance_after = %transaction.balance_after(),
            "transaction recorded"
        );
        Ok(transaction)
    }

    pub fn delete_customer(&mut self, customer_id: CustomerId) -> Result<DeletedCustomer, LedgerError> {
        let mut working = self.ledger.clone();
        let deleted = working.delete_customer(customer_id)?;
        self.commit(working)?;

        tracing::info!(
            customer_id = %customer_id,
            removed_transactions = deleted.removed_transactions,
            "customer deleted"
        );
        Ok(deleted)
    }

    /// Verify every customer; persist only if something was repaired.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, LedgerError> {
        let mut working = self.ledger.clone();
        let report = working.reconcile();
        if !report.is_clean() {
            self.commit(working)?;
        }
        Ok(report)
    }

    /// Snapshot for export (no write).
    pub fn export_snapshot(&self, export_date: DateTime<Utc>) -> LedgerExport {
        self.ledger.export(export_date)
    }

    /// Write the export document whole to `path`.
    pub fn write_export(
        &self,
        path: &Path,
        export_date: DateTime<Utc>,
    ) -> Result<LedgerExport, LedgerError> {
        let export = self.export_snapshot(export_date);
        let raw = serde_json::to_vec_pretty(&export).map_err(StorageError::from)?;
        write_replacing(path, &raw)?;

        tracing::info!(
            path = %path.display(),
            customers = export.customers.len(),
            transactions = export.transactions.len(),
            "ledger exported"
        );
        Ok(export)
    }

    /// Replace the whole ledger with a validated export document.
    pub fn import_snapshot(&mut self, export: LedgerExport) -> Result<ReconcileReport, LedgerError> {
        let (working, report) = LedgerStore::from_export(export)?;
        self.commit(working)?;

        tracing::info!(
            customers = self.ledger.customer_count(),
            transactions = self.ledger.transaction_count(),
            repaired = report.repaired.len(),
            "ledger imported"
        );
        Ok(report)
    }

    /// Write the current ledger to storage.
    pub fn flush(&self) -> Result<(), LedgerError> {
        save(&self.storage, &self.ledger)
    }

    /// Apply `op` to a working copy, verify the touched customer, save, then
    /// swap the copy in.
    fn mutate<T, F>(&mut self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut LedgerStore) -> DomainResult<(CustomerId, T)>,
    {
        let mut working = self.ledger.clone();
        let (touched, output) = op(&mut working)?;

        if self.options.verify_on_write {
            working.repair_customer(touched)?;
        }

        self.commit(working)?;
        Ok(output)
    }

    fn commit(&mut self, working: LedgerStore) -> Result<(), LedgerError> {
        save(&self.storage, &working)?;
        self.ledger = working;
        Ok(())
    }
}

fn save<S: KeyValueStore>(storage: &S, ledger: &LedgerStore) -> Result<(), LedgerError> {
    let customers = serde_json::to_string(ledger.customers()).map_err(StorageError::from)?;
    let transactions = serde_json::to_string(ledger.transactions()).map_err(StorageError::from)?;

    // Transactions land first. A save torn between the two keys then leaves at
    // worst a customer with a stale balance (repaired on open), never an
    // orphaned transaction.
    storage.put_many(&[(TRANSACTIONS_KEY, transactions), (CUSTOMERS_KEY, customers)])?;
    tracing::debug!(
        customers = ledger.customer_count(),
        transactions = ledger.transaction_count(),
        "ledger saved"
    );
    Ok(())
}
