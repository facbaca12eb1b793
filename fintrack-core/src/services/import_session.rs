//! Import session - review and commit of an uploaded CSV
//!
//! The session starts `Idle`. Uploading a table moves it to `Reviewing`,
//! where the user maps columns to fields and picks the owning account.
//! `submit` validates, asks for confirmation and hands the whole batch to
//! the transaction store in one call. Only one submit may be in flight; while
//! it is pending every other mutation is rejected with `Error::Busy`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::config::ImportProfile;
use crate::domain::result::{Error, Result};
use crate::domain::{ColumnAssignment, DateFormats, FieldKey, NewTransaction, RawTable, Transaction};
use crate::ports::{ConfirmationGate, TransactionStore};
use crate::services::column_mapper::{self, REQUIRED_FIELDS};

const CONFIRM_TITLE: &str = "Are you sure?";

/// Review state owned by a session between upload and commit
#[derive(Debug, Clone)]
struct Review {
    table: RawTable,
    assignment: ColumnAssignment,
    account_id: Option<Uuid>,
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Reviewing(Review),
}

/// Snapshot of a session for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionView {
    Idle,
    Reviewing(ReviewView),
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub headers: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub assignment: ColumnAssignment,
    pub account_id: Option<Uuid>,
    /// (assigned required fields, total required fields)
    pub progress: (usize, usize),
    pub ready: bool,
}

/// Result of `ImportSession::submit`
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Batch stored; the session is back to `Idle`
    Committed(Vec<Transaction>),
    /// The user answered "no"; the session is still `Reviewing`
    Declined,
    /// Nothing stored; the session keeps its review data
    Failed(Error),
}

impl SubmitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SubmitOutcome::Committed(_))
    }

    /// Notification text for the user
    pub fn user_message(&self) -> String {
        match self {
            SubmitOutcome::Committed(created) => {
                format!("{} transactions imported", created.len())
            }
            SubmitOutcome::Declined => "Import cancelled".to_string(),
            SubmitOutcome::Failed(e) => e.user_message(),
        }
    }
}

/// Clears the in-flight flag when the submit finishes or its future is dropped
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// CSV import session for a single user
pub struct ImportSession {
    user_id: String,
    store: Arc<dyn TransactionStore>,
    gate: Arc<dyn ConfirmationGate>,
    formats: DateFormats,
    state: Mutex<SessionState>,
    submitting: AtomicBool,
}

impl ImportSession {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn TransactionStore>,
        gate: Arc<dyn ConfirmationGate>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            gate,
            formats: DateFormats::default(),
            state: Mutex::new(SessionState::Idle),
            submitting: AtomicBool::new(false),
        }
    }

    /// Override the date patterns used when materializing rows
    pub fn with_date_formats(mut self, formats: DateFormats) -> Self {
        self.formats = formats;
        self
    }

    // The state is plain data, so a panic elsewhere cannot leave it half-written
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state for a mutation, rejecting it while a submit is pending
    fn lock_for_update(&self) -> Result<MutexGuard<'_, SessionState>> {
        let state = self.lock_state();
        if self.submitting.load(Ordering::Acquire) {
            return Err(Error::Busy);
        }
        Ok(state)
    }

    fn with_review<T>(&self, f: impl FnOnce(&mut Review) -> Result<T>) -> Result<T> {
        let mut state = self.lock_for_update()?;
        match &mut *state {
            SessionState::Reviewing(review) => f(review),
            SessionState::Idle => Err(Error::invalid_state("No import is under review")),
        }
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(*self.lock_state(), SessionState::Reviewing(_))
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Start reviewing an uploaded table
    pub fn upload(&self, table: RawTable) -> Result<()> {
        let mut state = self.lock_for_update()?;
        if let SessionState::Reviewing(_) = *state {
            return Err(Error::invalid_state(
                "An import is already under review; cancel it first",
            ));
        }

        *state = SessionState::Reviewing(Review {
            table,
            assignment: ColumnAssignment::new(),
            account_id: None,
        });
        Ok(())
    }

    /// Record the account the imported rows will belong to
    pub fn select_account(&self, account_id: Uuid) -> Result<()> {
        self.with_review(|review| {
            review.account_id = Some(account_id);
            Ok(())
        })
    }

    /// Assign a field to a column, or skip the column with `None`
    pub fn assign_column(&self, column: usize, field: Option<FieldKey>) -> Result<()> {
        self.with_review(|review| {
            if column >= review.table.column_count() {
                return Err(Error::validation(format!(
                    "Column {} does not exist (the file has {} columns)",
                    column + 1,
                    review.table.column_count()
                )));
            }
            review.assignment = column_mapper::update_assignment(&review.assignment, column, field)?;
            Ok(())
        })
    }

    /// Assign columns by header name from a saved profile
    ///
    /// Returns the number of columns assigned. Nothing changes on error.
    pub fn apply_profile(&self, profile: &ImportProfile) -> Result<usize> {
        self.with_review(|review| {
            let mut assignment = review.assignment.clone();
            let mut applied = 0;

            for (column, header) in review.table.headers().iter().enumerate() {
                if let Some(field) = profile.columns.get(header) {
                    assignment = column_mapper::update_assignment(&assignment, column, Some(*field))?;
                    applied += 1;
                }
            }

            review.assignment = assignment;
            Ok(applied)
        })
    }

    /// Current mapping as a header-name profile, for saving
    pub fn current_profile(&self) -> Option<ImportProfile> {
        match &*self.lock_state() {
            SessionState::Reviewing(review) => {
                let headers = review.table.headers();
                let columns: BTreeMap<String, FieldKey> = review
                    .assignment
                    .iter()
                    .filter_map(|(column, field)| headers.get(column).map(|h| (h.clone(), field)))
                    .collect();
                Some(ImportProfile { columns })
            }
            SessionState::Idle => None,
        }
    }

    /// Discard the review and return to `Idle`
    pub fn cancel(&self) -> Result<()> {
        let mut state = self.lock_for_update()?;
        *state = SessionState::Idle;
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        match &*self.lock_state() {
            SessionState::Idle => SessionView::Idle,
            SessionState::Reviewing(review) => SessionView::Reviewing(ReviewView {
                headers: review.table.headers().to_vec(),
                body: review.table.body().to_vec(),
                assignment: review.assignment.clone(),
                account_id: review.account_id,
                progress: column_mapper::progress(&review.assignment),
                ready: column_mapper::is_ready(&review.assignment, &REQUIRED_FIELDS),
            }),
        }
    }

    /// Validate, confirm and store the reviewed rows
    ///
    /// Never returns an error directly: every failure is reported through
    /// `SubmitOutcome::Failed` and leaves the review intact.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(_guard) = SubmitGuard::acquire(&self.submitting) else {
            return SubmitOutcome::Failed(Error::Busy);
        };

        let rows = match self.prepare_batch() {
            Ok(rows) => rows,
            Err(e) => return SubmitOutcome::Failed(e),
        };

        let message = format!("You are about to import {} transactions.", rows.len());
        if !self.gate.confirm(CONFIRM_TITLE, &message).await {
            return SubmitOutcome::Declined;
        }

        match self.store.bulk_create_transactions(&self.user_id, &rows).await {
            Ok(created) => {
                *self.lock_state() = SessionState::Idle;
                SubmitOutcome::Committed(created)
            }
            Err(e) => SubmitOutcome::Failed(Error::Persistence(e.to_string())),
        }
    }

    /// Build the batch from the current review without changing it
    fn prepare_batch(&self) -> Result<Vec<NewTransaction>> {
        let state = self.lock_state();
        let review = match &*state {
            SessionState::Reviewing(review) => review,
            SessionState::Idle => return Err(Error::invalid_state("No import is under review")),
        };

        if !column_mapper::is_ready(&review.assignment, &REQUIRED_FIELDS) {
            let missing: Vec<&str> = REQUIRED_FIELDS
                .iter()
                .filter(|field| !review.assignment.contains_field(**field))
                .map(|field| field.as_str())
                .collect();
            return Err(Error::validation(format!(
                "Assign a column to: {}",
                missing.join(", ")
            )));
        }

        let account_id = review
            .account_id
            .ok_or_else(|| Error::validation("Please select an account to continue."))?;

        let records = column_mapper::project(&review.table, &review.assignment);
        let rows = column_mapper::materialize(&records, &self.formats)?;
        if rows.is_empty() {
            return Err(Error::validation("The file has no rows to import"));
        }

        Ok(rows
            .into_iter()
            .map(|row| row.into_new_transaction(account_id))
            .collect())
    }
}
