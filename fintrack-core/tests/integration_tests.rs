//! Integration tests for fintrack-core services
//!
//! These tests verify ownership scoping and data integrity using real DuckDB.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use chrono::NaiveDate;

use fintrack_core::adapters::duckdb::DuckDbRepository;
use fintrack_core::domain::{NewTransaction, TransactionFilter};
use fintrack_core::services::{AccountService, CategoryService, SummaryService, TransactionService};
use fintrack_core::Error;

// ============================================================================
// Test Helpers
// ============================================================================

const ALICE: &str = "alice";
const BOB: &str = "bob";

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn all_time() -> TransactionFilter {
    TransactionFilter {
        from: Some(date(2000, 1, 1)),
        to: Some(date(2100, 1, 1)),
        account_id: None,
    }
}

struct Services {
    accounts: AccountService,
    categories: CategoryService,
    transactions: TransactionService,
    summary: SummaryService,
}

fn services(repo: &Arc<DuckDbRepository>, user: &str) -> Services {
    Services {
        accounts: AccountService::new(Arc::clone(repo), user),
        categories: CategoryService::new(Arc::clone(repo), user),
        transactions: TransactionService::new(Arc::clone(repo), user),
        summary: SummaryService::new(Arc::clone(repo), user),
    }
}

// ============================================================================
// Ownership Scoping
// ============================================================================

#[test]
fn test_accounts_are_scoped_to_user() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let bob = services(&repo, BOB);

    let checking = alice.accounts.create("Checking").unwrap();
    bob.accounts.create("Savings").unwrap();

    let names: Vec<String> = alice.accounts.list().unwrap().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["Checking"]);

    assert!(matches!(bob.accounts.get(checking.id), Err(Error::NotFound(_))));
    assert!(matches!(
        bob.accounts.rename(checking.id, "Mine now"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(bob.accounts.delete(checking.id), Err(Error::NotFound(_))));
    assert_eq!(alice.accounts.get(checking.id).unwrap().name, "Checking");
}

#[test]
fn test_transaction_in_foreign_account_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let bob = services(&repo, BOB);

    let account = alice.accounts.create("Checking").unwrap();
    let tx = NewTransaction::new(account.id, date(2024, 1, 5), "Coffee", -4500);

    assert!(matches!(bob.transactions.create(&tx), Err(Error::NotFound(_))));

    let created = alice.transactions.create(&tx).unwrap();
    assert!(matches!(bob.transactions.get(created.id), Err(Error::NotFound(_))));
    assert!(bob.transactions.list(&all_time()).unwrap().is_empty());
}

#[test]
fn test_bulk_delete_skips_foreign_ids() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let bob = services(&repo, BOB);

    let a_account = alice.accounts.create("Checking").unwrap();
    let b_account = bob.accounts.create("Checking").unwrap();

    let a_tx = alice
        .transactions
        .create(&NewTransaction::new(a_account.id, date(2024, 1, 5), "Coffee", -4500))
        .unwrap();
    let b_tx = bob
        .transactions
        .create(&NewTransaction::new(b_account.id, date(2024, 1, 5), "Rent", -900_000))
        .unwrap();

    let deleted = alice
        .transactions
        .bulk_delete(&[a_tx.id, b_tx.id, Uuid::new_v4()])
        .unwrap();

    assert_eq!(deleted, vec![a_tx.id]);
    assert!(bob.transactions.get(b_tx.id).is_ok());
}

// ============================================================================
// Bulk Create Atomicity
// ============================================================================

#[test]
fn test_bulk_create_is_all_or_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let bob = services(&repo, BOB);

    let mine = alice.accounts.create("Checking").unwrap();
    let theirs = bob.accounts.create("Checking").unwrap();

    let rows = vec![
        NewTransaction::new(mine.id, date(2024, 1, 5), "Coffee", -4500),
        NewTransaction::new(theirs.id, date(2024, 1, 6), "Sneaky", -1),
    ];

    assert!(matches!(
        alice.transactions.bulk_create(&rows),
        Err(Error::NotFound(_))
    ));
    assert_eq!(repo.count_transactions(ALICE).unwrap(), 0);
    assert_eq!(repo.count_transactions(BOB).unwrap(), 0);
}

#[test]
fn test_bulk_create_rejects_blank_payee() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let account = alice.accounts.create("Checking").unwrap();

    let rows = vec![
        NewTransaction::new(account.id, date(2024, 1, 5), "Coffee", -4500),
        NewTransaction::new(account.id, date(2024, 1, 6), "  ", -100),
    ];

    match alice.transactions.bulk_create(&rows) {
        Err(Error::Validation(msg)) => assert!(msg.starts_with("Row 2")),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(repo.count_transactions(ALICE).unwrap(), 0);
}

// ============================================================================
// Cascades
// ============================================================================

#[test]
fn test_delete_account_removes_its_transactions() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);

    let checking = alice.accounts.create("Checking").unwrap();
    let savings = alice.accounts.create("Savings").unwrap();
    let rows: Vec<NewTransaction> = (1..=5)
        .map(|i| NewTransaction::new(checking.id, date(2024, 1, i), format!("Payee {}", i), -1000))
        .chain(std::iter::once(NewTransaction::new(
            savings.id,
            date(2024, 1, 1),
            "Interest",
            250,
        )))
        .collect();
    alice.transactions.bulk_create(&rows).unwrap();

    alice.accounts.delete(checking.id).unwrap();

    let remaining = alice.transactions.list(&all_time()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].account, "Savings");
}

#[test]
fn test_delete_category_uncategorizes_transactions() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);

    let account = alice.accounts.create("Checking").unwrap();
    let food = alice.categories.create("Food").unwrap();
    let mut values = NewTransaction::new(account.id, date(2024, 1, 5), "Coffee", -4500);
    values.category_id = Some(food.id);
    let tx = alice.transactions.create(&values).unwrap();

    alice.categories.delete(food.id).unwrap();

    let reloaded = alice.transactions.get(tx.id).unwrap();
    assert_eq!(reloaded.category_id, None);
}

// ============================================================================
// Listing and Summaries
// ============================================================================

#[test]
fn test_list_default_window_and_order() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let account = alice.accounts.create("Checking").unwrap();

    let today = date(2024, 3, 31);
    let rows = vec![
        NewTransaction::new(account.id, date(2024, 3, 30), "Recent", -100),
        NewTransaction::new(account.id, date(2024, 3, 1), "Edge", -100),
        NewTransaction::new(account.id, date(2024, 2, 29), "Too old", -100),
        NewTransaction::new(account.id, date(2024, 3, 15), "Middle", -100),
    ];
    alice.transactions.bulk_create(&rows).unwrap();

    let listed = alice
        .transactions
        .list_as_of(&TransactionFilter::default(), today)
        .unwrap();
    let payees: Vec<&str> = listed.iter().map(|t| t.payee.as_str()).collect();
    assert_eq!(payees, vec!["Recent", "Middle", "Edge"]);
}

#[test]
fn test_list_rejects_inverted_range() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);

    let filter = TransactionFilter {
        from: Some(date(2024, 2, 1)),
        to: Some(date(2024, 1, 1)),
        account_id: None,
    };
    assert!(matches!(alice.transactions.list(&filter), Err(Error::Validation(_))));
}

#[test]
fn test_update_keeps_id_and_creation_time() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let account = alice.accounts.create("Checking").unwrap();

    let original = alice
        .transactions
        .create(&NewTransaction::new(account.id, date(2024, 1, 5), "Coffee", -4500))
        .unwrap();

    let mut values = NewTransaction::new(account.id, date(2024, 1, 6), "Tea", -3000);
    values.notes = Some("switched".to_string());
    alice.transactions.update(original.id, &values).unwrap();

    let reloaded = alice.transactions.get(original.id).unwrap();
    assert_eq!(reloaded.payee, "Tea");
    assert_eq!(reloaded.amount, -3000);
    assert_eq!(reloaded.notes.as_deref(), Some("switched"));
    assert_eq!(
        reloaded.created_at.timestamp_micros(),
        original.created_at.timestamp_micros()
    );
}

#[test]
fn test_summary_for_account() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let checking = alice.accounts.create("Checking").unwrap();
    let savings = alice.accounts.create("Savings").unwrap();
    let food = alice.categories.create("Food").unwrap();

    let mut coffee = NewTransaction::new(checking.id, date(2024, 1, 5), "Coffee", -4500);
    coffee.category_id = Some(food.id);
    let rows = vec![
        coffee,
        NewTransaction::new(checking.id, date(2024, 1, 6), "Salary", 200_000),
        NewTransaction::new(savings.id, date(2024, 1, 6), "Interest", 1_000),
    ];
    alice.transactions.bulk_create(&rows).unwrap();

    let filter = TransactionFilter {
        from: Some(date(2024, 1, 1)),
        to: Some(date(2024, 1, 31)),
        account_id: Some(checking.id),
    };
    let summary = alice.summary.summarize(&filter).unwrap();

    assert_eq!(summary.income, 200_000);
    assert_eq!(summary.expenses, -4500);
    assert_eq!(summary.remaining, 195_500);
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories[0].name, "Food");
    assert_eq!(summary.days.len(), 31);
}

#[test]
fn test_summary_of_extreme_stored_amounts() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = services(&repo, ALICE);
    let account = alice.accounts.create("Checking").unwrap();

    let rows = vec![
        NewTransaction::new(account.id, date(2024, 1, 5), "Windfall", i64::MAX),
        NewTransaction::new(account.id, date(2024, 1, 5), "Windfall", i64::MAX),
        NewTransaction::new(account.id, date(2024, 1, 6), "Debt", i64::MIN),
        NewTransaction::new(account.id, date(2024, 1, 6), "Debt", i64::MIN),
    ];
    alice.transactions.bulk_create(&rows).unwrap();

    let filter = TransactionFilter {
        from: Some(date(2024, 1, 1)),
        to: Some(date(2024, 1, 31)),
        account_id: None,
    };
    let summary = alice.summary.summarize(&filter).unwrap();

    assert_eq!(summary.income, i64::MAX);
    assert_eq!(summary.expenses, i64::MIN);
    assert_eq!(summary.transaction_count, 4);
}

#[test]
fn test_schema_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let account_id = {
        let repo = create_test_repo(&temp_dir);
        services(&repo, ALICE).accounts.create("Checking").unwrap().id
    };

    let repo = create_test_repo(&temp_dir);
    let result = repo.run_migrations().unwrap();
    assert!(result.applied.is_empty());
    assert_eq!(services(&repo, ALICE).accounts.get(account_id).unwrap().name, "Checking");
}
