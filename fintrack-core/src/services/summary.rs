//! Summary service - income, expenses and spending breakdowns for a period

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Result;
use crate::domain::{TransactionFilter, TransactionView};
use crate::services::transaction::checked_range;

/// Categories listed individually before the rest are folded into "Other"
pub const TOP_CATEGORIES: usize = 3;

/// Label for spending without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

const OTHER: &str = "Other";

/// Spending attributed to one category (positive minor units)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpend {
    pub name: String,
    pub value: i64,
}

/// Income and expenses on a single day (both positive minor units)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub income: i64,
    pub expenses: i64,
}

/// Totals for a date range, all amounts in minor units
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Sum of positive amounts
    pub income: i64,
    /// Sum of negative amounts (zero or negative)
    pub expenses: i64,
    pub remaining: i64,
    pub transaction_count: usize,
    pub categories: Vec<CategorySpend>,
    /// One entry per day in the range, oldest first
    pub days: Vec<DailyTotals>,
}

pub struct SummaryService {
    repository: Arc<DuckDbRepository>,
    user_id: String,
}

impl SummaryService {
    pub fn new(repository: Arc<DuckDbRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
        }
    }

    pub fn summarize(&self, filter: &TransactionFilter) -> Result<Summary> {
        self.summarize_as_of(filter, Local::now().date_naive())
    }

    pub fn summarize_as_of(&self, filter: &TransactionFilter, today: NaiveDate) -> Result<Summary> {
        let (from, to) = checked_range(filter, today)?;
        let transactions =
            self.repository
                .list_transactions(&self.user_id, from, to, filter.account_id)?;
        Ok(build_summary(from, to, &transactions))
    }
}

/// Aggregate already-filtered transactions
pub fn build_summary(from: NaiveDate, to: NaiveDate, transactions: &[TransactionView]) -> Summary {
    let income = saturating_sum(transactions.iter().filter(|t| t.amount > 0).map(|t| t.amount));
    let expenses = saturating_sum(transactions.iter().filter(|t| t.amount < 0).map(|t| t.amount));

    Summary {
        from,
        to,
        income,
        expenses,
        remaining: income.saturating_add(expenses),
        transaction_count: transactions.len(),
        categories: spending_by_category(transactions, TOP_CATEGORIES),
        days: daily_totals(from, to, transactions),
    }
}

/// Spending per category, largest first, keeping `top` and folding the rest into "Other"
pub fn spending_by_category(transactions: &[TransactionView], top: usize) -> Vec<CategorySpend> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.amount < 0) {
        let name = t.category.as_deref().unwrap_or(UNCATEGORIZED);
        let total = totals.entry(name).or_default();
        *total = total.saturating_add(t.amount.saturating_abs());
    }

    let mut ranked: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(name, value)| CategorySpend {
            name: name.to_string(),
            value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    if ranked.len() > top {
        let rest = saturating_sum(ranked.split_off(top).iter().map(|c| c.value));
        ranked.push(CategorySpend {
            name: OTHER.to_string(),
            value: rest,
        });
    }
    ranked
}

/// Totals clamp at the `i64` bounds instead of overflowing
fn saturating_sum(amounts: impl Iterator<Item = i64>) -> i64 {
    amounts.fold(0, i64::saturating_add)
}

/// Income and expenses for every day in `[from, to]`, including empty days
pub fn daily_totals(from: NaiveDate, to: NaiveDate, transactions: &[TransactionView]) -> Vec<DailyTotals> {
    let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for t in transactions {
        let entry = by_day.entry(t.date).or_default();
        if t.amount >= 0 {
            entry.0 = entry.0.saturating_add(t.amount);
        } else {
            entry.1 = entry.1.saturating_add(t.amount.saturating_abs());
        }
    }

    from.iter_days()
        .take_while(|d| *d <= to)
        .map(|date| {
            let (income, expenses) = by_day.get(&date).copied().unwrap_or_default();
            DailyTotals {
                date,
                income,
                expenses,
            }
        })
        .collect()
}
