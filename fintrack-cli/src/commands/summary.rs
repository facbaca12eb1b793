//! Summary command - income, expenses and spending by category

use anyhow::Result;
use colored::Colorize;

use fintrack_core::domain::money::format_currency;
use fintrack_core::TransactionFilter;

use super::{get_context, parse_date_arg};
use crate::output;

pub fn run(
    from: Option<String>,
    to: Option<String>,
    account: Option<String>,
    daily: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;

    let filter = TransactionFilter {
        from: from.as_deref().map(parse_date_arg).transpose()?,
        to: to.as_deref().map(parse_date_arg).transpose()?,
        account_id: match account {
            Some(a) => Some(ctx.account_service.resolve(&a)?.id),
            None => None,
        },
    };
    let summary = ctx.summary_service.summarize(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Summary {} to {}", summary.from, summary.to).bold()
    );
    println!("  Income:    {}", format_currency(summary.income).green());
    println!("  Expenses:  {}", format_currency(summary.expenses).red());
    println!("  Remaining: {}", format_currency(summary.remaining).bold());
    println!("  Transactions: {}", summary.transaction_count);

    if !summary.categories.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Category", "Spent"]);
        for category in &summary.categories {
            table.add_row(vec![category.name.clone(), format_currency(category.value)]);
        }
        println!("{}", table);
    }

    if daily {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Date", "Income", "Expenses"]);
        for day in summary.days.iter().filter(|d| d.income != 0 || d.expenses != 0) {
            table.add_row(vec![
                day.date.to_string(),
                format_currency(day.income),
                format_currency(day.expenses),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
