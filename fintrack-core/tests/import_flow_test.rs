//! End-to-end CSV import through the session and real DuckDB
//!
//! Run with: cargo test --test import_flow_test -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;

use chrono::NaiveDate;

use fintrack_core::adapters::confirm::FixedAnswer;
use fintrack_core::config::{Config, ImportProfile};
use fintrack_core::services::{SessionView, SubmitOutcome};
use fintrack_core::{Error, FieldKey, FintrackContext, RawTable, TransactionFilter};

const BANK_CSV: &str = "\
Date,Description,Amount,Memo
2024-01-05 10:00:00,Coffee,-4.50,morning
2024-01-06 08:30:00,Paycheck,1500.00,
2024-01-07 19:15:00,Groceries,-62.127,
";

fn context(temp_dir: &TempDir, user: &str) -> FintrackContext {
    let config = Config {
        user_id: user.to_string(),
        ..Config::default()
    };
    FintrackContext::with_config(temp_dir.path(), config).expect("Failed to open context")
}

fn january() -> TransactionFilter {
    TransactionFilter {
        from: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        to: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        account_id: None,
    }
}

fn bank_table() -> RawTable {
    RawTable::from_csv_reader(BANK_CSV.as_bytes()).unwrap()
}

#[tokio::test]
async fn test_import_commits_rows_into_account() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir, "alice");
    let account = ctx.account_service.create("Checking").unwrap();

    let session = ctx.import_session(Arc::new(FixedAnswer::yes()));
    session.upload(bank_table()).unwrap();
    session.assign_column(0, Some(FieldKey::Date)).unwrap();
    session.assign_column(1, Some(FieldKey::Payee)).unwrap();
    session.assign_column(2, Some(FieldKey::Amount)).unwrap();
    session.select_account(account.id).unwrap();

    let outcome = session.submit().await;
    assert!(outcome.is_committed(), "{:?}", outcome);
    assert_eq!(outcome.user_message(), "3 transactions imported");
    assert!(matches!(session.view(), SessionView::Idle));

    let listed = ctx.transaction_service.list(&january()).unwrap();
    assert_eq!(listed.len(), 3);

    let groceries = listed.iter().find(|t| t.payee == "Groceries").unwrap();
    assert_eq!(groceries.amount, -62_127);
    assert_eq!(groceries.date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    assert_eq!(groceries.account, "Checking");

    let paycheck = listed.iter().find(|t| t.payee == "Paycheck").unwrap();
    assert_eq!(paycheck.amount, 1_500_000);
}

#[tokio::test]
async fn test_import_into_foreign_account_fails_and_keeps_review() {
    let temp_dir = TempDir::new().unwrap();
    let bob_account = {
        let bob = context(&temp_dir, "bob");
        bob.account_service.create("Bob's").unwrap()
    };

    let ctx = context(&temp_dir, "alice");
    let session = ctx.import_session(Arc::new(FixedAnswer::yes()));
    session.upload(bank_table()).unwrap();
    session.assign_column(0, Some(FieldKey::Date)).unwrap();
    session.assign_column(1, Some(FieldKey::Payee)).unwrap();
    session.assign_column(2, Some(FieldKey::Amount)).unwrap();
    session.select_account(bob_account.id).unwrap();

    let outcome = session.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(Error::Persistence(_))));
    assert!(session.is_reviewing());
    assert_eq!(ctx.repository.count_transactions("bob").unwrap(), 0);
}

#[tokio::test]
async fn test_declined_import_stores_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir, "alice");
    let account = ctx.account_service.create("Checking").unwrap();

    let session = ctx.import_session(Arc::new(FixedAnswer::no()));
    session.upload(bank_table()).unwrap();
    session.assign_column(0, Some(FieldKey::Date)).unwrap();
    session.assign_column(1, Some(FieldKey::Payee)).unwrap();
    session.assign_column(2, Some(FieldKey::Amount)).unwrap();
    session.select_account(account.id).unwrap();

    assert!(matches!(session.submit().await, SubmitOutcome::Declined));
    assert!(ctx.transaction_service.list(&january()).unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_profile_maps_next_upload() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir, "alice");
    let account = ctx.account_service.create("Checking").unwrap();

    let mut profile = ImportProfile::default();
    profile.columns.insert("Date".to_string(), FieldKey::Date);
    profile.columns.insert("Description".to_string(), FieldKey::Payee);
    profile.columns.insert("Amount".to_string(), FieldKey::Amount);

    let mut config = ctx.config.clone();
    config.set_profile("bank", profile);
    config.save(temp_dir.path()).unwrap();

    let reloaded = Config::load(temp_dir.path()).unwrap();
    let session = ctx.import_session(Arc::new(FixedAnswer::yes()));
    session.upload(bank_table()).unwrap();
    assert_eq!(session.apply_profile(reloaded.profile("bank").unwrap()).unwrap(), 3);
    session.select_account(account.id).unwrap();

    assert!(session.submit().await.is_committed());
    assert_eq!(ctx.repository.count_transactions("alice").unwrap(), 3);
}

#[tokio::test]
async fn test_custom_date_format_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config {
        user_id: "alice".to_string(),
        ..Config::default()
    };
    config.date_formats.input = "%m/%d/%Y".to_string();
    let ctx = FintrackContext::with_config(temp_dir.path(), config).unwrap();
    let account = ctx.account_service.create("Checking").unwrap();

    let table = RawTable::from_csv_reader("When,Who,How much\n01/05/2024,Coffee,-4.5\n".as_bytes())
        .unwrap();
    let session = ctx.import_session(Arc::new(FixedAnswer::yes()));
    session.upload(table).unwrap();
    session.assign_column(0, Some(FieldKey::Date)).unwrap();
    session.assign_column(1, Some(FieldKey::Payee)).unwrap();
    session.assign_column(2, Some(FieldKey::Amount)).unwrap();
    session.select_account(account.id).unwrap();

    assert!(session.submit().await.is_committed());
    let listed = ctx.transaction_service.list(&january()).unwrap();
    assert_eq!(listed[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(listed[0].amount, -4500);
}

#[tokio::test]
async fn test_rejected_rows_leave_database_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir, "alice");
    let account = ctx.account_service.create("Checking").unwrap();

    for csv in [
        "Date,Desc,Amt\n2024-01-05 10:00:00,,4.50\n",
        "Date,Desc,Amt\n2024-01-05 10:00:00,Lottery,99999999999999999999\n\
         2024-01-06 10:00:00,Lottery,99999999999999999999\n",
    ] {
        let session = ctx.import_session(Arc::new(FixedAnswer::yes()));
        session.upload(RawTable::from_csv_reader(csv.as_bytes()).unwrap()).unwrap();
        session.assign_column(0, Some(FieldKey::Date)).unwrap();
        session.assign_column(1, Some(FieldKey::Payee)).unwrap();
        session.assign_column(2, Some(FieldKey::Amount)).unwrap();
        session.select_account(account.id).unwrap();

        let outcome = session.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Failed(Error::Parse { .. })), "{:?}", outcome);
    }

    assert_eq!(ctx.repository.count_transactions("alice").unwrap(), 0);
}
