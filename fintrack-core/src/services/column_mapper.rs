//! Column mapper - turns an uploaded table into typed import rows
//!
//! The flow is `update_assignment` (user picks what each column means),
//! `is_ready` (gates submission), `project` (keep assigned cells) and
//! `materialize` (parse dates and amounts).

use std::fmt::Write;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::domain::money::checked_to_minor_units;
use crate::domain::result::{Error, Result};
use crate::domain::{ColumnAssignment, DateFormats, FieldKey, ImportRow, MappedRecord, RawTable};

/// Fields every import must map before it can be submitted
pub const REQUIRED_FIELDS: [FieldKey; 3] = [FieldKey::Amount, FieldKey::Date, FieldKey::Payee];

/// Passthrough field lifted into `ImportRow::notes`
const NOTES_FIELD: &str = "notes";

/// Assign `field` to `column`, or clear the column with `None` ("skip")
///
/// Skipping affects only that column. A field already held by a different
/// column is rejected; the caller must skip that column first.
pub fn update_assignment(
    assignment: &ColumnAssignment,
    column: usize,
    field: Option<FieldKey>,
) -> Result<ColumnAssignment> {
    let mut updated = assignment.clone();

    match field {
        None => updated.clear(column),
        Some(field) => {
            if let Some(holder) = assignment.column_of(field) {
                if holder != column {
                    return Err(Error::validation(format!(
                        "'{}' is already assigned to column {}",
                        field,
                        holder + 1
                    )));
                }
            }
            updated.set(column, field);
        }
    }

    Ok(updated)
}

/// Project every body row through the assignment
///
/// Only assigned cells are kept. Rows that end up with no fields are dropped.
pub fn project(table: &RawTable, assignment: &ColumnAssignment) -> Vec<MappedRecord> {
    table
        .body()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter_map(|(column, cell)| {
                    assignment
                        .get(column)
                        .map(|field| (field.as_str(), cell.as_str()))
                })
                .collect::<MappedRecord>()
        })
        .filter(|record| !record.is_empty())
        .collect()
}

/// True when every required field is held by some column
pub fn is_ready(assignment: &ColumnAssignment, required: &[FieldKey]) -> bool {
    required.iter().all(|field| assignment.contains_field(*field))
}

/// Assigned/required counts for progress display ("Continue (2/3)")
pub fn progress(assignment: &ColumnAssignment) -> (usize, usize) {
    let assigned = REQUIRED_FIELDS
        .iter()
        .filter(|field| assignment.contains_field(**field))
        .count();
    (assigned, REQUIRED_FIELDS.len())
}

/// Parse projected records into typed rows
///
/// The first bad record aborts the whole batch with `Error::Parse`.
pub fn materialize(records: &[MappedRecord], formats: &DateFormats) -> Result<Vec<ImportRow>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| materialize_record(index + 1, record, formats))
        .collect()
}

fn materialize_record(row: usize, record: &MappedRecord, formats: &DateFormats) -> Result<ImportRow> {
    let date = parse_date(row, required(row, record, FieldKey::Date)?, formats)?;
    let amount = parse_amount(row, required(row, record, FieldKey::Amount)?)?;
    let payee = required(row, record, FieldKey::Payee)?;
    if payee.trim().is_empty() {
        return Err(Error::parse(row, FieldKey::Payee.as_str(), "value is empty"));
    }
    let payee = payee.to_string();

    let notes = record.get(NOTES_FIELD).map(str::to_string);
    let extra = record
        .iter()
        .filter(|(key, _)| {
            *key != NOTES_FIELD && !FieldKey::ALL.iter().any(|field| field.as_str() == *key)
        })
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    Ok(ImportRow {
        date,
        amount,
        payee,
        notes,
        extra,
    })
}

fn required<'a>(row: usize, record: &'a MappedRecord, field: FieldKey) -> Result<&'a str> {
    record
        .get(field.as_str())
        .ok_or_else(|| Error::parse(row, field.as_str(), "value is missing"))
}

/// Parse with the input pattern, then normalize through the output pattern
fn parse_date(row: usize, value: &str, formats: &DateFormats) -> Result<NaiveDate> {
    let value = value.trim();
    let mismatch = || {
        Error::parse(
            row,
            FieldKey::Date.as_str(),
            format!("'{}' does not match '{}'", value, formats.input),
        )
    };

    // Date-only input patterns have no time component to parse
    let parsed = match NaiveDateTime::parse_from_str(value, &formats.input) {
        Ok(datetime) => datetime.date(),
        Err(_) => NaiveDate::parse_from_str(value, &formats.input).map_err(|_| mismatch())?,
    };

    let mut normalized = String::new();
    write!(normalized, "{}", parsed.format(&formats.output)).map_err(|_| {
        Error::Config(format!("Invalid date output pattern '{}'", formats.output))
    })?;

    NaiveDate::parse_from_str(&normalized, &formats.output).map_err(|_| {
        Error::Config(format!(
            "Date output pattern '{}' does not describe a calendar date",
            formats.output
        ))
    })
}

fn parse_amount(row: usize, value: &str) -> Result<i64> {
    let amount = Decimal::from_str(value.trim()).map_err(|_| {
        Error::parse(
            row,
            FieldKey::Amount.as_str(),
            format!("'{}' is not a number", value),
        )
    })?;
    checked_to_minor_units(amount)
        .ok_or_else(|| Error::parse(row, FieldKey::Amount.as_str(), "out of range"))
}
