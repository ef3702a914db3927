//! Integration tests for the file-backed ledger.
//!
//! Tests: Form → Command → LedgerStore → FileKeyValueStore → reopen
//!
//! Verifies:
//! - The persisted layout is two JSON arrays under `customers`/`transactions`
//! - Deletion cascades on disk as well as in memory
//! - Export documents are whole and repeatable

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use tempfile::tempdir;

    use tally_ledger::{CustomerForm, TransactionForm};

    use crate::persistent::{CUSTOMERS_KEY, LedgerOptions, PersistentLedger, TRANSACTIONS_KEY};
    use crate::storage::{FileKeyValueStore, KeyValueStore};

    fn read_array(store: &FileKeyValueStore, key: &str) -> Vec<Value> {
        let raw = store.get(key).unwrap().unwrap();
        serde_json::from_str::<Vec<Value>>(&raw).unwrap()
    }

    #[test]
    fn scenario_survives_reopen_and_cascades_on_disk() {
        let dir = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();

        let customer_id = {
            let store = FileKeyValueStore::open(dir.path()).unwrap();
            let mut ledger = PersistentLedger::open(store, LedgerOptions::default()).unwrap();

            let create = CustomerForm {
                name: "C".to_string(),
                phone: Some("555-0199".to_string()),
                opening_balance: Some("100.00".to_string()),
                ..CustomerForm::default()
            }
            .parse(now)
            .unwrap();
            let customer = ledger.create_customer(create).unwrap();

            for (kind, amount) in [("debit", "50.00"), ("credit", "30.00")] {
                let cmd = TransactionForm {
                    customer_id: customer.id_typed().to_string(),
                    kind: kind.to_string(),
                    amount: amount.to_string(),
                    ..TransactionForm::default()
                }
                .parse(now)
                .unwrap();
                ledger.record_transaction(cmd).unwrap();
            }
            customer.id_typed()
        };

        let store = FileKeyValueStore::open(dir.path()).unwrap();
        let customers = read_array(&store, CUSTOMERS_KEY);
        let transactions = read_array(&store, TRANSACTIONS_KEY);
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0]["balance"], "120.00");
        assert_eq!(customers[0]["openingBalance"], "100.00");
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0]["balanceAfter"], "150.00");
        assert_eq!(transactions[1]["balanceAfter"], "120.00");
        assert_eq!(transactions[1]["type"], "credit");

        let mut ledger = PersistentLedger::open(store.clone(), LedgerOptions::default()).unwrap();
        assert_eq!(
            ledger.ledger().customer(customer_id).unwrap().balance(),
            dec!(120.00)
        );

        ledger.delete_customer(customer_id).unwrap();
        assert!(read_array(&store, CUSTOMERS_KEY).is_empty());
        assert!(read_array(&store, TRANSACTIONS_KEY).is_empty());
    }

    #[test]
    fn export_file_is_whole_and_repeatable() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("data")).unwrap();
        let mut ledger = PersistentLedger::open(store, LedgerOptions::default()).unwrap();

        let customer = ledger
            .create_customer(
                CustomerForm {
                    name: "Ada".to_string(),
                    ..CustomerForm::default()
                }
                .parse(Utc::now())
                .unwrap(),
            )
            .unwrap();
        ledger
            .record_transaction(
                TransactionForm {
                    customer_id: customer.id_typed().to_string(),
                    kind: "debit".to_string(),
                    amount: "20".to_string(),
                    date: Some("2023-12-24".to_string()),
                    description: Some("gift".to_string()),
                }
                .parse(Utc::now())
                .unwrap(),
            )
            .unwrap();

        let path = dir.path().join("tally-export.json");
        let first = ledger.write_export(&path, Utc::now()).unwrap();
        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk["exportDate"].is_string());
        assert_eq!(on_disk["customers"].as_array().unwrap().len(), 1);
        assert_eq!(on_disk["transactions"][0]["date"], "2023-12-24");

        let second = ledger.write_export(&path, Utc::now()).unwrap();
        assert!(first.same_content(&second));
    }
}
