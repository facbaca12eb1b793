//! CSV import domain types
//!
//! A [`RawTable`] is the pre-parsed upload. The user declares what each
//! column means through a [`ColumnAssignment`]; projecting the table through
//! it yields [`MappedRecord`]s, which are then typed into [`ImportRow`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};
use super::transaction::NewTransaction;

/// Date pattern of uploaded cells (`yyyy-MM-dd HH:mm:ss`)
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date pattern the import normalizes to (`yyyy-MM-dd`)
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Semantic meaning a column can be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Amount,
    Date,
    Payee,
}

impl FieldKey {
    pub const ALL: [FieldKey; 3] = [FieldKey::Amount, FieldKey::Date, FieldKey::Payee];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Amount => "amount",
            FieldKey::Date => "date",
            FieldKey::Payee => "payee",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "amount" => Ok(FieldKey::Amount),
            "date" => Ok(FieldKey::Date),
            "payee" => Ok(FieldKey::Payee),
            other => Err(Error::validation(format!(
                "Unknown field '{}' (expected amount, date or payee)",
                other
            ))),
        }
    }
}

/// An uploaded table: one header row followed by body rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTable {
    headers: Vec<String>,
    body: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from rows, the first being the headers
    ///
    /// Every body row must have the header's column count.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::validation("The file is empty"));
        }
        let headers = rows.remove(0);
        if headers.is_empty() {
            return Err(Error::validation("The header row has no columns"));
        }

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(Error::validation(format!(
                "Row {} has {} columns, expected {}",
                index + 1,
                row.len(),
                headers.len()
            )));
        }

        Ok(Self { headers, body: rows })
    }

    /// Read comma-separated text whose first record is the header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Self::from_rows(rows)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn body(&self) -> &[Vec<String>] {
        &self.body
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Column index (0-based) to field assignment; absent columns are skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment(BTreeMap<usize, FieldKey>);

impl ColumnAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field assigned to a column, if any
    pub fn get(&self, column: usize) -> Option<FieldKey> {
        self.0.get(&column).copied()
    }

    /// Column currently holding a field, if any
    pub fn column_of(&self, field: FieldKey) -> Option<usize> {
        self.0
            .iter()
            .find(|(_, assigned)| **assigned == field)
            .map(|(column, _)| *column)
    }

    pub fn contains_field(&self, field: FieldKey) -> bool {
        self.column_of(field).is_some()
    }

    /// Number of assigned columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, FieldKey)> + '_ {
        self.0.iter().map(|(column, field)| (*column, *field))
    }

    pub(crate) fn set(&mut self, column: usize, field: FieldKey) {
        self.0.insert(column, field);
    }

    pub(crate) fn clear(&mut self, column: usize) {
        self.0.remove(&column);
    }
}

/// One body row keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRecord(BTreeMap<String, String>);

impl MappedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A record with typed fields, ready to be attached to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub date: NaiveDate,
    /// Minor units (thousandths)
    pub amount: i64,
    pub payee: String,
    pub notes: Option<String>,
    /// Any other field-keyed values, copied verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ImportRow {
    /// Attach the owning account
    ///
    /// Only `notes` survives among the passthrough fields; `extra` is not
    /// stored.
    pub fn into_new_transaction(self, account_id: Uuid) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            payee: self.payee,
            notes: self.notes,
            date: self.date,
            account_id,
            category_id: None,
        }
    }
}

/// Date patterns used when materializing records (chrono `strftime` syntax)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFormats {
    pub input: String,
    pub output: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            input: DATE_INPUT_FORMAT.to_string(),
            output: DATE_OUTPUT_FORMAT.to_string(),
        }
    }
}
