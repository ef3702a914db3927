//! Ledger operations as the presentation layer calls them.
//!
//! Every method takes raw form input, stamps it with the service clock,
//! and either persists the result or leaves state untouched.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use tally_core::CustomerId;
use tally_infra::{KeyValueStore, LedgerOptions, PersistentLedger};
use tally_ledger::{Customer, CustomerForm, CustomerQuery, LedgerExport, LedgerSummary, Transaction, TransactionForm};

use crate::dto::{
    CustomerListItem, DeletedResponse, ExportRequest, ReconcileResponse, RecordedResponse, Request,
};
use crate::errors::ServiceError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Source of processing timestamps.
pub type Clock = fn() -> DateTime<Utc>;

pub struct LedgerService<S> {
    ledger: PersistentLedger<S>,
    clock: Clock,
}

impl<S> LedgerService<S>
where
    S: KeyValueStore,
{
    pub fn open(storage: S, options: LedgerOptions) -> ServiceResult<Self> {
        let ledger = PersistentLedger::open(storage, options)?;
        Ok(Self {
            ledger,
            clock: Utc::now,
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ledger(&self) -> &PersistentLedger<S> {
        &self.ledger
    }

    pub fn create_customer(&mut self, form: &CustomerForm) -> ServiceResult<Customer> {
        let cmd = form.parse((self.clock)())?;
        Ok(self.ledger.create_customer(cmd)?)
    }

    pub fn record_transaction(&mut self, form: &TransactionForm) -> ServiceResult<RecordedResponse> {
        let cmd = form.parse((self.clock)())?;
        let transaction = self.ledger.record_transaction(cmd)?;
        let customer = self.customer_by_id(transaction.customer_id())?.clone();
        Ok(RecordedResponse {
            transaction,
            customer,
        })
    }

    pub fn delete_customer(&mut self, customer_id: &str) -> ServiceResult<DeletedResponse> {
        let id = parse_customer_id(customer_id)?;
        Ok(self.ledger.delete_customer(id)?.into())
    }

    /// Customers whose name, phone or email contains `search`
    /// (case-insensitive). A blank search lists everyone.
    pub fn list_customers(&self, search: &str) -> Vec<CustomerListItem> {
        let query = CustomerQuery::new(search);
        self.ledger
            .ledger()
            .list_customers(query.predicate())
            .map(CustomerListItem::from)
            .collect()
    }

    pub fn transaction_history(&self, customer_id: &str) -> ServiceResult<Vec<Transaction>> {
        let id = parse_customer_id(customer_id)?;
        Ok(self
            .ledger
            .ledger()
            .transaction_history(id)
            .cloned()
            .collect())
    }

    pub fn customer(&self, customer_id: &str) -> ServiceResult<Customer> {
        let id = parse_customer_id(customer_id)?;
        self.customer_by_id(id).cloned()
    }

    pub fn summary(&self) -> LedgerSummary {
        self.ledger.ledger().summary()
    }

    /// Build the export document, writing it to `path` when one is given.
    pub fn export(&self, path: Option<&Path>) -> ServiceResult<LedgerExport> {
        let now = (self.clock)();
        match path {
            Some(path) => Ok(self.ledger.write_export(path, now)?),
            None => Ok(self.ledger.export_snapshot(now)),
        }
    }

    pub fn reconcile(&mut self) -> ServiceResult<ReconcileResponse> {
        Ok(self.ledger.reconcile()?.into())
    }

    /// Run one protocol request.
    pub fn dispatch(&mut self, request: Request) -> ServiceResult<Value> {
        match request {
            Request::CreateCustomer(form) => to_value(self.create_customer(&form)?),
            Request::RecordTransaction(form) => to_value(self.record_transaction(&form)?),
            Request::DeleteCustomer(r) => to_value(self.delete_customer(&r.customer_id)?),
            Request::ListCustomers(r) => to_value(self.list_customers(&r.search)),
            Request::TransactionHistory(r) => to_value(self.transaction_history(&r.customer_id)?),
            Request::Customer(r) => to_value(self.customer(&r.customer_id)?),
            Request::Summary => to_value(self.summary()),
            Request::Export(ExportRequest { path }) => {
                to_value(self.export(path.as_deref().map(Path::new))?)
            }
            Request::Reconcile => to_value(self.reconcile()?),
        }
    }

    /// Parse and run one JSON line; errors come back as `{error, message}`.
    pub fn handle_line(&mut self, line: &str) -> Value {
        let result = serde_json::from_str::<Request>(line)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))
            .and_then(|request| self.dispatch(request));

        match result {
            Ok(value) => value,
            Err(err) => {
                if matches!(err, ServiceError::Consistency(_) | ServiceError::Storage(_)) {
                    tracing::error!(code = err.code(), error = %err, "request failed");
                } else {
                    tracing::debug!(code = err.code(), error = %err, "request rejected");
                }
                err.to_json()
            }
        }
    }

    fn customer_by_id(&self, id: CustomerId) -> ServiceResult<&Customer> {
        self.ledger
            .ledger()
            .customer(id)
            .ok_or_else(|| ServiceError::NotFound(format!("customer {id} not found")))
    }
}

fn parse_customer_id(raw: &str) -> ServiceResult<CustomerId> {
    raw.parse::<CustomerId>()
        .map_err(|_| ServiceError::Validation(format!("invalid customer id '{}'", raw.trim())))
}

fn to_value<T: Serialize>(value: T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Storage(e.to_string()))
}
