//! Transactions command - list, add, edit and delete transactions

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use fintrack_core::domain::money::format_currency;
use fintrack_core::{FintrackContext, NewTransaction, TransactionFilter};

use super::{confirm, get_context, parse_amount_arg, parse_date_arg};
use crate::output;

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions (default: the last 30 days)
    List {
        /// Start date (yyyy-MM-dd)
        #[arg(long)]
        from: Option<String>,
        /// End date (yyyy-MM-dd)
        #[arg(long)]
        to: Option<String>,
        /// Only this account (ID or name)
        #[arg(long)]
        account: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a transaction
    Add {
        /// Account ID or name
        #[arg(long)]
        account: String,
        /// Date (yyyy-MM-dd)
        #[arg(long)]
        date: String,
        #[arg(long)]
        payee: String,
        /// Signed amount, e.g. -4.50 for an expense
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Category ID or name
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a transaction
    Edit {
        id: Uuid,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        payee: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// Category ID or name; an empty value clears it
        #[arg(long)]
        category: Option<String>,
        /// Notes; an empty value clears them
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete transactions
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn run(command: TransactionsCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        TransactionsCommands::List {
            from,
            to,
            account,
            json,
        } => {
            let filter = TransactionFilter {
                from: from.as_deref().map(parse_date_arg).transpose()?,
                to: to.as_deref().map(parse_date_arg).transpose()?,
                account_id: match account {
                    Some(a) => Some(ctx.account_service.resolve(&a)?.id),
                    None => None,
                },
            };
            let transactions = ctx.transaction_service.list(&filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&transactions)?);
                return Ok(());
            }
            if transactions.is_empty() {
                println!("No transactions in this period.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Date", "Payee", "Amount", "Account", "Category", "ID"]);
            for tx in &transactions {
                table.add_row(vec![
                    comfy_table::Cell::new(tx.date.format("%Y-%m-%d")),
                    comfy_table::Cell::new(&tx.payee),
                    output::money_cell(tx.amount),
                    comfy_table::Cell::new(&tx.account),
                    comfy_table::Cell::new(tx.category.as_deref().unwrap_or("-")),
                    comfy_table::Cell::new(tx.id),
                ]);
            }
            println!("{}", table);
            println!("{} transaction(s)", transactions.len());
        }
        TransactionsCommands::Add {
            account,
            date,
            payee,
            amount,
            category,
            notes,
            json,
        } => {
            let account_id = ctx.account_service.resolve(&account)?.id;
            let mut values = NewTransaction::new(
                account_id,
                parse_date_arg(&date)?,
                payee.trim(),
                parse_amount_arg(&amount)?,
            );
            values.category_id = resolve_category(&ctx, category.as_deref())?;
            values.notes = notes.filter(|n| !n.trim().is_empty());

            let created = ctx.transaction_service.create(&values)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&created)?);
            } else {
                output::success(&format!(
                    "Added {} {} on {} ({})",
                    created.payee,
                    format_currency(created.amount),
                    created.date,
                    created.id
                ));
            }
        }
        TransactionsCommands::Edit {
            id,
            account,
            date,
            payee,
            amount,
            category,
            notes,
        } => {
            let existing = ctx.transaction_service.get(id)?;
            let mut values = NewTransaction {
                amount: existing.amount,
                payee: existing.payee,
                notes: existing.notes,
                date: existing.date,
                account_id: existing.account_id,
                category_id: existing.category_id,
            };

            if let Some(a) = account {
                values.account_id = ctx.account_service.resolve(&a)?.id;
            }
            if let Some(d) = date {
                values.date = parse_date_arg(&d)?;
            }
            if let Some(p) = payee {
                values.payee = p.trim().to_string();
            }
            if let Some(a) = amount {
                values.amount = parse_amount_arg(&a)?;
            }
            if let Some(c) = category {
                values.category_id = resolve_category(&ctx, Some(&c))?;
            }
            if let Some(n) = notes {
                values.notes = Some(n).filter(|n| !n.trim().is_empty());
            }

            let updated = ctx.transaction_service.update(id, &values)?;
            output::success(&format!("Updated transaction {}", updated.id));
        }
        TransactionsCommands::Delete { ids, yes } => {
            if !confirm(&format!("Delete {} transaction(s)?", ids.len()), yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = ctx.transaction_service.bulk_delete(&ids)?;
            output::success(&format!("Deleted {} transaction(s)", deleted.len()));
            if deleted.len() < ids.len() {
                output::warning(&format!(
                    "{} transaction(s) were not found",
                    ids.len() - deleted.len()
                ));
            }
        }
    }

    Ok(())
}

/// Blank means "no category"
fn resolve_category(ctx: &FintrackContext, category: Option<&str>) -> Result<Option<Uuid>> {
    match category.map(str::trim) {
        None | Some("") => Ok(None),
        Some(c) => Ok(Some(ctx.category_service.resolve(c)?.id)),
    }
}
