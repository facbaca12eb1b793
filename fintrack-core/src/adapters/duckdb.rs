//! DuckDB repository implementation
//!
//! Every query is scoped by `user_id`. Accounts and categories carry the
//! owner directly; transactions are owned through their account, so their
//! queries join on sys_accounts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Category, NewTransaction, Transaction, TransactionView};
use crate::ports::{AccountDirectory, TransactionStore};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

const TRANSACTION_COLUMNS: &str = "t.transaction_id, t.amount, t.payee, t.notes, \
     t.transaction_date::VARCHAR, t.account_id, t.category_id, t.created_at::VARCHAR";

const VIEW_SELECT: &str = "SELECT t.transaction_id, t.amount, t.payee, t.notes, \
     t.transaction_date::VARCHAR, t.account_id, a.name, t.category_id, c.name \
     FROM sys_transactions t \
     JOIN sys_accounts a ON a.account_id = t.account_id \
     LEFT JOIN sys_categories c ON c.category_id = t.category_id";

/// Which owner-scoped table a named entity lives in
#[derive(Clone, Copy)]
enum Owned {
    Account,
    Category,
}

impl Owned {
    fn table(self) -> &'static str {
        match self {
            Owned::Account => "sys_accounts",
            Owned::Category => "sys_categories",
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            Owned::Account => "account_id",
            Owned::Category => "category_id",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Owned::Account => "Account",
            Owned::Category => "Category",
        }
    }
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[fintrack] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Autoloaded extensions are never needed and can fail code-signing checks on macOS
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Connection lock poisoned: {}", e)))
    }

    /// Apply pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    // === Account operations ===

    pub fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let rows = list_owned(&conn, Owned::Account, user_id)?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub fn get_account(&self, user_id: &str, id: Uuid) -> Result<Account> {
        let conn = self.conn()?;
        get_owned(&conn, Owned::Account, user_id, id).map(Account::from)
    }

    pub fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn()?;
        insert_owned(
            &conn,
            Owned::Account,
            account.id,
            &account.name,
            &account.user_id,
            account.created_at,
        )
    }

    pub fn rename_account(&self, user_id: &str, id: Uuid, name: &str) -> Result<Account> {
        let conn = self.conn()?;
        rename_owned(&conn, Owned::Account, user_id, id, name)?;
        get_owned(&conn, Owned::Account, user_id, id).map(Account::from)
    }

    /// Delete an account and every transaction in it
    pub fn delete_account(&self, user_id: &str, id: Uuid) -> Result<()> {
        let deleted = self.bulk_delete_accounts(user_id, &[id])?;
        if deleted.is_empty() {
            return Err(Error::not_found(format!("Account {}", id)));
        }
        Ok(())
    }

    /// Delete the listed accounts owned by `user_id`, with their transactions
    ///
    /// IDs that do not exist or belong to another user are skipped. Returns
    /// the IDs actually deleted.
    pub fn bulk_delete_accounts(&self, user_id: &str, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut conn = self.conn()?;
        let owned = owned_ids(&conn, Owned::Account, user_id, ids)?;
        if owned.is_empty() {
            return Ok(owned);
        }

        let placeholders = placeholders(owned.len());
        let id_params: Vec<String> = owned.iter().map(Uuid::to_string).collect();

        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "DELETE FROM sys_transactions WHERE account_id IN ({})",
                placeholders
            ),
            params_from_iter(id_params.iter().cloned()),
        )?;
        tx.execute(
            &format!("DELETE FROM sys_accounts WHERE account_id IN ({})", placeholders),
            params_from_iter(id_params),
        )?;
        tx.commit()?;

        Ok(owned)
    }

    // === Category operations ===

    pub fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let rows = list_owned(&conn, Owned::Category, user_id)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub fn get_category(&self, user_id: &str, id: Uuid) -> Result<Category> {
        let conn = self.conn()?;
        get_owned(&conn, Owned::Category, user_id, id).map(Category::from)
    }

    pub fn insert_category(&self, category: &Category) -> Result<()> {
        let conn = self.conn()?;
        insert_owned(
            &conn,
            Owned::Category,
            category.id,
            &category.name,
            &category.user_id,
            category.created_at,
        )
    }

    pub fn rename_category(&self, user_id: &str, id: Uuid, name: &str) -> Result<Category> {
        let conn = self.conn()?;
        rename_owned(&conn, Owned::Category, user_id, id, name)?;
        get_owned(&conn, Owned::Category, user_id, id).map(Category::from)
    }

    pub fn delete_category(&self, user_id: &str, id: Uuid) -> Result<()> {
        let deleted = self.bulk_delete_categories(user_id, &[id])?;
        if deleted.is_empty() {
            return Err(Error::not_found(format!("Category {}", id)));
        }
        Ok(())
    }

    /// Delete the listed categories owned by `user_id`
    ///
    /// Transactions in a deleted category become uncategorized.
    pub fn bulk_delete_categories(&self, user_id: &str, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut conn = self.conn()?;
        let owned = owned_ids(&conn, Owned::Category, user_id, ids)?;
        if owned.is_empty() {
            return Ok(owned);
        }

        let placeholders = placeholders(owned.len());
        let id_params: Vec<String> = owned.iter().map(Uuid::to_string).collect();

        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "UPDATE sys_transactions SET category_id = NULL WHERE category_id IN ({})",
                placeholders
            ),
            params_from_iter(id_params.iter().cloned()),
        )?;
        tx.execute(
            &format!(
                "DELETE FROM sys_categories WHERE category_id IN ({})",
                placeholders
            ),
            params_from_iter(id_params),
        )?;
        tx.commit()?;

        Ok(owned)
    }

    // === Transaction operations ===

    /// Transactions in `[from, to]`, newest first, with account and category names
    pub fn list_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        account_id: Option<Uuid>,
    ) -> Result<Vec<TransactionView>> {
        let conn = self.conn()?;

        let mut sql = format!(
            "{} WHERE a.user_id = ? \
             AND t.transaction_date >= CAST(? AS DATE) \
             AND t.transaction_date <= CAST(? AS DATE)",
            VIEW_SELECT
        );
        let mut args = vec![
            user_id.to_string(),
            from.format(DATE_FORMAT).to_string(),
            to.format(DATE_FORMAT).to_string(),
        ];
        if let Some(account_id) = account_id {
            sql.push_str(" AND t.account_id = ?");
            args.push(account_id.to_string());
        }
        sql.push_str(" ORDER BY t.transaction_date DESC, t.created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let raw: Vec<RawView> = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(RawView {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    payee: row.get(2)?,
                    notes: row.get(3)?,
                    date: row.get(4)?,
                    account_id: row.get(5)?,
                    account: row.get(6)?,
                    category_id: row.get(7)?,
                    category: row.get(8)?,
                })
            })?
            .collect::<duckdb::Result<_>>()?;

        raw.into_iter().map(RawView::into_view).collect()
    }

    pub fn get_transaction(&self, user_id: &str, id: Uuid) -> Result<Transaction> {
        let conn = self.conn()?;
        get_transaction_scoped(&conn, user_id, id)
    }

    /// Insert one transaction into an account owned by `user_id`
    pub fn insert_transaction(&self, user_id: &str, new: &NewTransaction) -> Result<Transaction> {
        let conn = self.conn()?;
        require_owned(&conn, Owned::Account, user_id, new.account_id)?;
        if let Some(category_id) = new.category_id {
            require_owned(&conn, Owned::Category, user_id, category_id)?;
        }

        let tx = new.clone().into_transaction();
        insert_transaction_row(&conn, &tx)?;
        Ok(tx)
    }

    /// Replace every field of an existing transaction
    pub fn update_transaction(
        &self,
        user_id: &str,
        id: Uuid,
        values: &NewTransaction,
    ) -> Result<Transaction> {
        let conn = self.conn()?;
        let existing = get_transaction_scoped(&conn, user_id, id)?;
        require_owned(&conn, Owned::Account, user_id, values.account_id)?;
        if let Some(category_id) = values.category_id {
            require_owned(&conn, Owned::Category, user_id, category_id)?;
        }

        conn.execute(
            "UPDATE sys_transactions
             SET amount = ?, payee = ?, notes = ?, transaction_date = CAST(? AS DATE),
                 account_id = ?, category_id = ?
             WHERE transaction_id = ?",
            params![
                values.amount,
                values.payee,
                values.notes,
                values.date.format(DATE_FORMAT).to_string(),
                values.account_id.to_string(),
                values.category_id.map(|c| c.to_string()),
                id.to_string(),
            ],
        )?;

        Ok(Transaction {
            id,
            amount: values.amount,
            payee: values.payee.clone(),
            notes: values.notes.clone(),
            date: values.date,
            account_id: values.account_id,
            category_id: values.category_id,
            created_at: existing.created_at,
        })
    }

    pub fn delete_transaction(&self, user_id: &str, id: Uuid) -> Result<()> {
        let deleted = self.bulk_delete_transactions(user_id, &[id])?;
        if deleted.is_empty() {
            return Err(Error::not_found(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Insert a batch in one database transaction
    ///
    /// Every referenced account (and category) must belong to `user_id`;
    /// otherwise nothing is inserted.
    pub fn bulk_insert_transactions(
        &self,
        user_id: &str,
        rows: &[NewTransaction],
    ) -> Result<Vec<Transaction>> {
        let mut conn = self.conn()?;

        let accounts: BTreeSet<Uuid> = rows.iter().map(|r| r.account_id).collect();
        for account_id in &accounts {
            require_owned(&conn, Owned::Account, user_id, *account_id)?;
        }
        let categories: BTreeSet<Uuid> = rows.iter().filter_map(|r| r.category_id).collect();
        for category_id in &categories {
            require_owned(&conn, Owned::Category, user_id, *category_id)?;
        }

        let created: Vec<Transaction> = rows.iter().cloned().map(NewTransaction::into_transaction).collect();

        let tx = conn.transaction()?;
        for row in &created {
            insert_transaction_row(&tx, row)?;
        }
        tx.commit()?;

        Ok(created)
    }

    /// Delete the listed transactions whose account belongs to `user_id`
    ///
    /// Foreign or unknown IDs are skipped. Returns the IDs actually deleted.
    pub fn bulk_delete_transactions(&self, user_id: &str, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;

        let mut args = vec![user_id.to_string()];
        args.extend(ids.iter().map(Uuid::to_string));
        let mut stmt = conn.prepare(&format!(
            "SELECT t.transaction_id FROM sys_transactions t
             JOIN sys_accounts a ON a.account_id = t.account_id
             WHERE a.user_id = ? AND t.transaction_id IN ({})",
            placeholders(ids.len())
        ))?;
        let owned: Vec<String> = stmt
            .query_map(params_from_iter(args), |row| row.get(0))?
            .collect::<duckdb::Result<_>>()?;

        if owned.is_empty() {
            return Ok(Vec::new());
        }

        conn.execute(
            &format!(
                "DELETE FROM sys_transactions WHERE transaction_id IN ({})",
                placeholders(owned.len())
            ),
            params_from_iter(owned.iter().cloned()),
        )?;

        owned.iter().map(|s| parse_uuid(s)).collect()
    }

    /// Number of transactions across the user's accounts
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_transactions t
             JOIN sys_accounts a ON a.account_id = t.account_id
             WHERE a.user_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[async_trait]
impl TransactionStore for DuckDbRepository {
    async fn bulk_create_transactions(
        &self,
        user_id: &str,
        rows: &[NewTransaction],
    ) -> Result<Vec<Transaction>> {
        self.bulk_insert_transactions(user_id, rows)
    }
}

#[async_trait]
impl AccountDirectory for DuckDbRepository {
    async fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        DuckDbRepository::list_accounts(self, user_id)
    }

    async fn create_account(&self, user_id: &str, name: &str) -> Result<Account> {
        let account = Account::new(user_id, name.trim());
        account.validate().map_err(Error::validation)?;
        self.insert_account(&account)?;
        Ok(account)
    }
}

// === Row helpers ===

/// Columns shared by accounts and categories
struct OwnedRow {
    id: Uuid,
    name: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<OwnedRow> for Account {
    fn from(r: OwnedRow) -> Self {
        Account {
            id: r.id,
            name: r.name,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

impl From<OwnedRow> for Category {
    fn from(r: OwnedRow) -> Self {
        Category {
            id: r.id,
            name: r.name,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

fn owned_select(kind: Owned) -> String {
    format!(
        "SELECT {}, name, user_id, created_at::VARCHAR FROM {}",
        kind.id_column(),
        kind.table()
    )
}

fn read_owned_rows(
    stmt: &mut duckdb::Statement<'_>,
    args: Vec<String>,
) -> Result<Vec<OwnedRow>> {
    let raw: Vec<(String, String, String, String)> = stmt
        .query_map(params_from_iter(args), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<duckdb::Result<_>>()?;

    raw.into_iter()
        .map(|(id, name, user_id, created_at)| {
            Ok(OwnedRow {
                id: parse_uuid(&id)?,
                name,
                user_id,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

fn list_owned(conn: &Connection, kind: Owned, user_id: &str) -> Result<Vec<OwnedRow>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE user_id = ? ORDER BY name, created_at",
        owned_select(kind)
    ))?;
    read_owned_rows(&mut stmt, vec![user_id.to_string()])
}

fn get_owned(conn: &Connection, kind: Owned, user_id: &str, id: Uuid) -> Result<OwnedRow> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE user_id = ? AND {} = ?",
        owned_select(kind),
        kind.id_column()
    ))?;
    read_owned_rows(&mut stmt, vec![user_id.to_string(), id.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(format!("{} {}", kind.label(), id)))
}

fn insert_owned(
    conn: &Connection,
    kind: Owned,
    id: Uuid,
    name: &str,
    user_id: &str,
    created_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, name, user_id, created_at) VALUES (?, ?, ?, CAST(? AS TIMESTAMP))",
            kind.table(),
            kind.id_column()
        ),
        params![
            id.to_string(),
            name,
            user_id,
            format_timestamp(created_at)
        ],
    )?;
    Ok(())
}

fn rename_owned(conn: &Connection, kind: Owned, user_id: &str, id: Uuid, name: &str) -> Result<()> {
    let updated = conn.execute(
        &format!(
            "UPDATE {} SET name = ? WHERE user_id = ? AND {} = ?",
            kind.table(),
            kind.id_column()
        ),
        params![name, user_id, id.to_string()],
    )?;
    if updated == 0 {
        return Err(Error::not_found(format!("{} {}", kind.label(), id)));
    }
    Ok(())
}

fn require_owned(conn: &Connection, kind: Owned, user_id: &str, id: Uuid) -> Result<()> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ? AND {} = ?",
            kind.table(),
            kind.id_column()
        ),
        params![user_id, id.to_string()],
        |row| row.get(0),
    )?;
    if count == 0 {
        return Err(Error::not_found(format!("{} {}", kind.label(), id)));
    }
    Ok(())
}

/// Subset of `ids` owned by `user_id`
fn owned_ids(conn: &Connection, kind: Owned, user_id: &str, ids: &[Uuid]) -> Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut args = vec![user_id.to_string()];
    args.extend(ids.iter().map(Uuid::to_string));
    let mut stmt = conn.prepare(&format!(
        "SELECT {id} FROM {table} WHERE user_id = ? AND {id} IN ({})",
        placeholders(ids.len()),
        id = kind.id_column(),
        table = kind.table(),
    ))?;
    let found: Vec<String> = stmt
        .query_map(params_from_iter(args), |row| row.get(0))?
        .collect::<duckdb::Result<_>>()?;

    found.iter().map(|s| parse_uuid(s)).collect()
}

/// Transaction row as read from DuckDB, before ID and date parsing
struct RawTransaction {
    id: String,
    amount: i64,
    payee: String,
    notes: Option<String>,
    date: String,
    account_id: String,
    category_id: Option<String>,
    created_at: String,
}

impl RawTransaction {
    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: parse_uuid(&self.id)?,
            amount: self.amount,
            payee: self.payee,
            notes: self.notes,
            date: parse_date(&self.date)?,
            account_id: parse_uuid(&self.account_id)?,
            category_id: self.category_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

struct RawView {
    id: String,
    amount: i64,
    payee: String,
    notes: Option<String>,
    date: String,
    account_id: String,
    account: String,
    category_id: Option<String>,
    category: Option<String>,
}

impl RawView {
    fn into_view(self) -> Result<TransactionView> {
        Ok(TransactionView {
            id: parse_uuid(&self.id)?,
            amount: self.amount,
            payee: self.payee,
            notes: self.notes,
            date: parse_date(&self.date)?,
            account_id: parse_uuid(&self.account_id)?,
            account: self.account,
            category_id: self.category_id.as_deref().map(parse_uuid).transpose()?,
            category: self.category,
        })
    }
}

fn get_transaction_scoped(conn: &Connection, user_id: &str, id: Uuid) -> Result<Transaction> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sys_transactions t
         JOIN sys_accounts a ON a.account_id = t.account_id
         WHERE a.user_id = ? AND t.transaction_id = ?",
        TRANSACTION_COLUMNS
    ))?;
    let raw: Option<RawTransaction> = stmt
        .query_map(params![user_id, id.to_string()], |row| {
            Ok(RawTransaction {
                id: row.get(0)?,
                amount: row.get(1)?,
                payee: row.get(2)?,
                notes: row.get(3)?,
                date: row.get(4)?,
                account_id: row.get(5)?,
                category_id: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .next()
        .transpose()?;

    raw.ok_or_else(|| Error::not_found(format!("Transaction {}", id)))?
        .into_transaction()
}

fn insert_transaction_row(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO sys_transactions
            (transaction_id, amount, payee, notes, transaction_date, account_id, category_id, created_at)
         VALUES (?, ?, ?, ?, CAST(? AS DATE), ?, ?, CAST(? AS TIMESTAMP))",
        params![
            tx.id.to_string(),
            tx.amount,
            tx.payee,
            tx.notes,
            tx.date.format(DATE_FORMAT).to_string(),
            tx.account_id.to_string(),
            tx.category_id.map(|c| c.to_string()),
            format_timestamp(tx.created_at),
        ],
    )?;
    Ok(())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Invalid id '{}' in database: {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| Error::database(format!("Invalid date '{}' in database: {}", s, e)))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| Error::database(format!("Invalid timestamp '{}' in database: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(is_retryable_error(
            "The process cannot access the file because it is being used by another process"
        ));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_timestamp_round_trip_through_text() {
        let ts = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(ts)).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());

        // DuckDB drops the fraction when it is zero
        assert!(parse_timestamp("2024-01-05 10:00:00").is_ok());
    }

    #[test]
    fn test_corrupt_id_is_database_error() {
        assert!(matches!(parse_uuid("nope"), Err(Error::Database(_))));
    }
}
