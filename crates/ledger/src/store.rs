//! Ledger store: canonical customer + transaction collections.
//!
//! Balances are maintained incrementally (one addition per recorded
//! transaction). That is only sound because history is append-only: there is
//! no edit, void or insert-in-the-middle operation. The balance engine's full
//! recompute is used to verify and, on divergence, repair.
//!
//! Every mutation validates before it touches state, so a failed call leaves
//! both collections unchanged.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::entity::first_duplicate_id;
use tally_core::money::ensure_within_limit;
use tally_core::{CustomerId, DomainError, DomainResult, Entity, TransactionId};

use crate::balance::{BalanceReplay, recompute_balance};
use crate::command::{CreateCustomer, RecordTransaction};
use crate::customer::Customer;
use crate::snapshot::LedgerExport;
use crate::transaction::Transaction;

/// Outcome of a cascading customer deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCustomer {
    pub customer: Customer,
    pub removed_transactions: usize,
}

/// Outcome of [`LedgerStore::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    /// Customers whose stored balances diverged and were rewritten.
    pub repaired: Vec<CustomerId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty()
    }
}

/// Ledger-wide totals for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub customer_count: usize,
    pub transaction_count: usize,
    /// Sum of positive balances (owed to us).
    pub total_receivable: Decimal,
    /// Sum of the magnitudes of negative balances (we owe).
    pub total_payable: Decimal,
    pub net_balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStore {
    customers: Vec<Customer>,
    transactions: Vec<Transaction>,
    /// Customer id -> position in `customers`.
    index: HashMap<CustomerId, usize>,
    transaction_ids: HashSet<TransactionId>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted collections.
    ///
    /// Duplicate ids, orphaned transactions, blank names and out-of-range
    /// opening balances are rejected. Balances that disagree with a full recompute are repaired
    /// (and reported).
    pub fn from_parts(
        customers: Vec<Customer>,
        transactions: Vec<Transaction>,
    ) -> DomainResult<(Self, ReconcileReport)> {
        if let Some(id) = first_duplicate_id(&customers) {
            return Err(DomainError::consistency(format!("duplicate customer id {id}")));
        }
        if let Some(id) = first_duplicate_id(&transactions) {
            return Err(DomainError::consistency(format!(
                "duplicate transaction id {id}"
            )));
        }
        for customer in &customers {
            let invalid = |e: DomainError| {
                DomainError::consistency(format!("customer {}: {e}", customer.id_typed()))
            };
            customer.profile().clone().normalized().map_err(invalid)?;
            ensure_within_limit(customer.opening_balance(), "opening balance").map_err(invalid)?;
        }

        let mut store = Self {
            customers,
            transactions,
            index: HashMap::new(),
            transaction_ids: HashSet::new(),
        };
        store.rebuild_indexes();

        if let Some(orphan) = store
            .transactions
            .iter()
            .find(|t| !store.index.contains_key(&t.customer_id()))
        {
            return Err(DomainError::consistency(format!(
                "transaction {} references missing customer {}",
                orphan.id_typed(),
                orphan.customer_id()
            )));
        }

        let report = store.reconcile();
        Ok((store, report))
    }

    /// Rebuild a store from an export document.
    pub fn from_export(export: LedgerExport) -> DomainResult<(Self, ReconcileReport)> {
        Self::from_parts(export.customers, export.transactions)
    }

    pub fn into_parts(self) -> (Vec<Customer>, Vec<Transaction>) {
        (self.customers, self.transactions)
    }

    /// Snapshot the whole ledger for export.
    pub fn export(&self, export_date: chrono::DateTime<chrono::Utc>) -> LedgerExport {
        LedgerExport {
            customers: self.customers.clone(),
            transactions: self.transactions.clone(),
            export_date,
        }
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Create a customer whose balance starts at the opening balance.
    pub fn create_customer(&mut self, cmd: CreateCustomer) -> DomainResult<Customer> {
        let profile = cmd.profile.normalized()?;
        let opening_balance = ensure_within_limit(cmd.opening_balance, "opening balance")?;

        if self.index.contains_key(&cmd.customer_id) {
            return Err(DomainError::validation(format!(
                "customer {} already exists",
                cmd.customer_id
            )));
        }

        let customer = Customer::new(cmd.customer_id, profile, opening_balance, cmd.occurred_at);
        self.index.insert(cmd.customer_id, self.customers.len());
        self.customers.push(customer.clone());
        Ok(customer)
    }

    /// Append a transaction and move the customer's balance by its signed
    /// amount.
    ///
    /// The customer's `last_transaction_date` becomes the processing date
    /// (`occurred_at`), not the transaction's own `date`.
    pub fn record_transaction(&mut self, cmd: RecordTransaction) -> DomainResult<Transaction> {
        let position = self.position(cmd.customer_id)?;

        if self.transaction_ids.contains(&cmd.transaction_id) {
            return Err(DomainError::validation(format!(
                "transaction {} already exists",
                cmd.transaction_id
            )));
        }

        let signed = crate::balance::signed_amount(cmd.kind, cmd.amount);
        let balance_after = self.customers[position]
            .balance()
            .checked_add(signed)
            .ok_or_else(|| DomainError::validation("balance out of range"))?;

        let transaction = Transaction::new(
            cmd.transaction_id,
            cmd.customer_id,
            cmd.kind,
            cmd.amount,
            cmd.effective_date(),
            cmd.description,
            balance_after,
            cmd.occurred_at,
        );

        self.customers[position].apply(balance_after, cmd.occurred_at.date_naive());
        self.transaction_ids.insert(cmd.transaction_id);
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Remove a customer and every transaction that references it.
    pub fn delete_customer(&mut self, customer_id: CustomerId) -> DomainResult<DeletedCustomer> {
        let position = self.position(customer_id)?;

        let before = self.transactions.len();
        self.transactions.retain(|t| t.customer_id() != customer_id);
        let removed_transactions = before - self.transactions.len();
        let customer = self.customers.remove(position);
        self.rebuild_indexes();

        Ok(DeletedCustomer {
            customer,
            removed_transactions,
        })
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Customers matching `predicate`, in creation order.
    ///
    /// Lazy and non-mutating; call again to restart.
    pub fn list_customers<P>(&self, predicate: P) -> impl Iterator<Item = &Customer> + Clone
    where
        P: Fn(&Customer) -> bool + Clone,
    {
        self.customers.iter().filter(move |c| predicate(*c))
    }

    /// A customer's transactions in insertion order.
    ///
    /// Empty when the customer has no transactions (or does not exist).
    pub fn transaction_history(
        &self,
        customer_id: CustomerId,
    ) -> impl Iterator<Item = &Transaction> + Clone {
        self.transactions
            .iter()
            .filter(move |t| t.customer_id() == customer_id)
    }

    pub fn customer(&self, customer_id: CustomerId) -> Option<&Customer> {
        self.index.get(&customer_id).map(|&i| &self.customers[i])
    }

    pub fn transaction(&self, transaction_id: TransactionId) -> Option<&Transaction> {
        if !self.transaction_ids.contains(&transaction_id) {
            return None;
        }
        self.transactions
            .iter()
            .find(|t| t.id_typed() == transaction_id)
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut total_receivable = Decimal::ZERO;
        let mut total_payable = Decimal::ZERO;
        for customer in &self.customers {
            let balance = customer.balance();
            if balance > Decimal::ZERO {
                total_receivable += balance;
            } else {
                total_payable += -balance;
            }
        }

        LedgerSummary {
            customer_count: self.customers.len(),
            transaction_count: self.transactions.len(),
            total_receivable,
            total_payable,
            net_balance: total_receivable - total_payable,
        }
    }

    // ---------------------------------------------------------------------
    // Consistency
    // ---------------------------------------------------------------------

    /// Full recompute of one customer's history.
    pub fn replay(&self, customer_id: CustomerId) -> DomainResult<BalanceReplay> {
        let customer = self
            .customer(customer_id)
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id}")))?;
        Ok(recompute_balance(
            customer.opening_balance(),
            self.transaction_history(customer_id),
        ))
    }

    /// Compare the stored balance and every stored `balance_after` with a
    /// full recompute.
    pub fn verify_customer(&self, customer_id: CustomerId) -> DomainResult<()> {
        let replay = self.replay(customer_id)?;
        let customer = &self.customers[self.position(customer_id)?];
        replay
            .verify(
                customer.balance(),
                self.transaction_history(customer_id).map(Transaction::balance_after),
            )
            .map_err(|e| DomainError::consistency(format!("customer {customer_id}: {e}")))
    }

    /// Verify one customer; on divergence log it and rewrite the derived
    /// values from the recompute. Returns whether a repair happened.
    pub fn repair_customer(&mut self, customer_id: CustomerId) -> DomainResult<bool> {
        match self.verify_customer(customer_id) {
            Ok(()) => Ok(false),
            Err(DomainError::Consistency(detail)) => {
                tracing::warn!(
                    customer_id = %customer_id,
                    detail = %detail,
                    "incremental balance diverged from recompute; repairing"
                );
                let replay = self.replay(customer_id)?;
                let mut after = replay.balances_after.iter();
                for transaction in self
                    .transactions
                    .iter_mut()
                    .filter(|t| t.customer_id() == customer_id)
                {
                    if let Some(value) = after.next() {
                        transaction.restate_balance_after(*value);
                    }
                }
                let position = self.position(customer_id)?;
                self.customers[position].restate_balance(replay.final_balance);
                Ok(true)
            }
            Err(other) => Err(other),
        }
    }

    /// Verify every customer, repairing any divergence.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let ids: Vec<CustomerId> = self.customers.iter().map(|c| *c.id()).collect();
        let mut report = ReconcileReport {
            checked: ids.len(),
            repaired: Vec::new(),
        };

        for id in ids {
            // Ids come from the store itself, so only Consistency can occur
            // and repair_customer absorbs it.
            if let Ok(true) = self.repair_customer(id) {
                report.repaired.push(id);
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                repaired = report.repaired.len(),
                checked = report.checked,
                "reconcile repaired diverged customers"
            );
        }
        report
    }

    fn position(&self, customer_id: CustomerId) -> DomainResult<usize> {
        self.index
            .get(&customer_id)
            .copied()
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id}")))
    }

    fn rebuild_indexes(&mut self) {
        self.index = self
            .customers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id_typed(), i))
            .collect();
        self.transaction_ids = self.transactions.iter().map(|t| t.id_typed()).collect();
    }

    #[cfg(test)]
    pub(crate) fn corrupt_balance_for_test(&mut self, customer_id: CustomerId, balance: Decimal) {
        let position = self.index[&customer_id];
        self.customers[position].restate_balance(balance);
    }
}
