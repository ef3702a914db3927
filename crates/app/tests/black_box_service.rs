//! Drives the service through the JSON-lines protocol only.

use serde_json::{Value, json};
use tempfile::tempdir;

use tally_app::LedgerService;
use tally_infra::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, LedgerOptions};

fn call<S: KeyValueStore>(svc: &mut LedgerService<S>, request: Value) -> Value {
    svc.handle_line(&request.to_string())
}

fn open_memory() -> LedgerService<InMemoryKeyValueStore> {
    LedgerService::open(InMemoryKeyValueStore::new(), LedgerOptions::default()).unwrap()
}

fn create<S: KeyValueStore>(svc: &mut LedgerService<S>, name: &str, opening: &str) -> String {
    let created = call(
        svc,
        json!({ "op": "create_customer", "name": name, "openingBalance": opening }),
    );
    created["id"].as_str().unwrap().to_string()
}

#[test]
fn debit_then_credit_moves_balance() {
    let mut svc = open_memory();
    let id = create(&mut svc, "C", "100");

    let first = call(
        &mut svc,
        json!({ "op": "record_transaction", "customerId": id, "type": "debit", "amount": "50" }),
    );
    assert_eq!(first["transaction"]["balanceAfter"], "150");
    assert_eq!(first["customer"]["balance"], "150");

    let second = call(
        &mut svc,
        json!({ "op": "record_transaction", "customerId": id, "type": "credit", "amount": "30" }),
    );
    assert_eq!(second["transaction"]["balanceAfter"], "120");

    let customer = call(&mut svc, json!({ "op": "customer", "customerId": id }));
    assert_eq!(customer["balance"], "120");

    let history = call(&mut svc, json!({ "op": "transaction_history", "customerId": id }));
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["type"], "debit");
    assert_eq!(history[1]["type"], "credit");
}

#[test]
fn rejected_amounts_leave_state_untouched() {
    let mut svc = open_memory();
    let id = create(&mut svc, "C", "100");
    let before = call(&mut svc, json!({ "op": "summary" }));

    for amount in ["0", "-5", "abc", ""] {
        let response = call(
            &mut svc,
            json!({ "op": "record_transaction", "customerId": id, "type": "debit", "amount": amount }),
        );
        assert_eq!(response["error"], "validation_error", "amount {amount:?}");
    }

    assert_eq!(call(&mut svc, json!({ "op": "summary" })), before);
    let history = call(&mut svc, json!({ "op": "transaction_history", "customerId": id }));
    assert!(history.as_array().unwrap().is_empty());
}

#[test]
fn unknown_customer_is_not_found() {
    let mut svc = open_memory();
    let missing = "0190f3a0-0000-7000-8000-000000000000";

    let response = call(
        &mut svc,
        json!({ "op": "record_transaction", "customerId": missing, "type": "credit", "amount": "1" }),
    );
    assert_eq!(response["error"], "not_found");

    let response = call(&mut svc, json!({ "op": "delete_customer", "customerId": missing }));
    assert_eq!(response["error"], "not_found");
}

#[test]
fn blank_name_is_rejected() {
    let mut svc = open_memory();
    let response = call(&mut svc, json!({ "op": "create_customer", "name": "   " }));
    assert_eq!(response["error"], "validation_error");
    assert!(call(&mut svc, json!({ "op": "list_customers" })).as_array().unwrap().is_empty());
}

#[test]
fn deleting_one_customer_keeps_the_other_history() {
    let mut svc = open_memory();
    let a = create(&mut svc, "Alice", "0");
    let b = create(&mut svc, "Bob", "0");

    for id in [&a, &a, &b] {
        call(
            &mut svc,
            json!({ "op": "record_transaction", "customerId": id, "type": "debit", "amount": "10" }),
        );
    }

    let deleted = call(&mut svc, json!({ "op": "delete_customer", "customerId": a }));
    assert_eq!(deleted["removedTransactions"], 2);

    let history = call(&mut svc, json!({ "op": "transaction_history", "customerId": a }));
    assert!(history.as_array().unwrap().is_empty());
    let history = call(&mut svc, json!({ "op": "transaction_history", "customerId": b }));
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(call(&mut svc, json!({ "op": "customer", "customerId": b }))["balance"], "10");
}

#[test]
fn search_matches_name_phone_and_email() {
    let mut svc = open_memory();
    call(
        &mut svc,
        json!({ "op": "create_customer", "name": "Grace Hopper", "phone": "555-0101" }),
    );
    call(
        &mut svc,
        json!({ "op": "create_customer", "name": "Alan", "email": "alan@example.com" }),
    );

    let names = |v: Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    };

    assert_eq!(
        names(call(&mut svc, json!({ "op": "list_customers", "search": "GRACE" }))),
        vec!["Grace Hopper"]
    );
    assert_eq!(
        names(call(&mut svc, json!({ "op": "list_customers", "search": "0101" }))),
        vec!["Grace Hopper"]
    );
    assert_eq!(
        names(call(&mut svc, json!({ "op": "list_customers", "search": "example.com" }))),
        vec!["Alan"]
    );
    assert_eq!(names(call(&mut svc, json!({ "op": "list_customers", "search": "" }))).len(), 2);
}

#[test]
fn state_persists_across_reopen_and_exports() {
    let dir = tempdir().unwrap();
    let id = {
        let store = FileKeyValueStore::open(dir.path().join("data")).unwrap();
        let mut svc = LedgerService::open(store, LedgerOptions::default()).unwrap();
        let id = create(&mut svc, "C", "100");
        call(
            &mut svc,
            json!({ "op": "record_transaction", "customerId": id, "type": "credit", "amount": "25.50" }),
        );
        id
    };

    let store = FileKeyValueStore::open(dir.path().join("data")).unwrap();
    let mut svc = LedgerService::open(store, LedgerOptions::default()).unwrap();
    assert_eq!(call(&mut svc, json!({ "op": "customer", "customerId": id }))["balance"], "74.50");

    let path = dir.path().join("export.json");
    let export = call(
        &mut svc,
        json!({ "op": "export", "path": path.to_str().unwrap() }),
    );
    assert_eq!(export["customers"].as_array().unwrap().len(), 1);
    assert_eq!(export["transactions"].as_array().unwrap().len(), 1);
    assert!(export["exportDate"].is_string());

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["customers"], export["customers"]);

    let report = call(&mut svc, json!({ "op": "reconcile" }));
    assert_eq!(report["checked"], 1);
    assert!(report["repaired"].as_array().unwrap().is_empty());
}

#[test]
fn numeric_amounts_are_accepted_and_validated() {
    let mut svc = open_memory();
    let created = call(
        &mut svc,
        json!({ "op": "create_customer", "name": "C", "openingBalance": 100 }),
    );
    let id = created["id"].as_str().unwrap().to_string();

    let recorded = call(
        &mut svc,
        json!({ "op": "record_transaction", "customerId": id, "type": "debit", "amount": 50 }),
    );
    assert_eq!(recorded["transaction"]["balanceAfter"], "150");

    let rejected = call(
        &mut svc,
        json!({ "op": "record_transaction", "customerId": id, "type": "debit", "amount": -3 }),
    );
    assert_eq!(rejected["error"], "validation_error");
}
