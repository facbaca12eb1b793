//! Accounts command - list and manage accounts

use anyhow::Result;
use clap::Subcommand;

use super::{confirm, get_context, split_ids};
use crate::output;

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// List accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an account
    Create {
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename an account
    Rename {
        /// Account ID or current name
        account: String,
        name: String,
    },
    /// Delete accounts and all of their transactions
    Delete {
        /// Account IDs or names
        #[arg(required = true)]
        accounts: Vec<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn run(command: AccountsCommands) -> Result<()> {
    let ctx = get_context()?;
    let service = &ctx.account_service;

    match command {
        AccountsCommands::List { json } => {
            let accounts = service.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
                return Ok(());
            }
            if accounts.is_empty() {
                println!("No accounts yet. Create one with `ft accounts create <name>`.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Name", "ID", "Created"]);
            for account in accounts {
                table.add_row(vec![
                    account.name,
                    account.id.to_string(),
                    account.created_at.format("%Y-%m-%d").to_string(),
                ]);
            }
            println!("{}", table);
        }
        AccountsCommands::Create { name, json } => {
            let account = service.create(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                output::success(&format!("Created account '{}' ({})", account.name, account.id));
            }
        }
        AccountsCommands::Rename { account, name } => {
            let existing = service.resolve(&account)?;
            let renamed = service.rename(existing.id, &name)?;
            output::success(&format!("Renamed '{}' to '{}'", existing.name, renamed.name));
        }
        AccountsCommands::Delete { accounts, yes } => {
            let (mut ids, names) = split_ids(&accounts);
            for name in names {
                ids.push(service.resolve(name)?.id);
            }

            let prompt = format!(
                "Delete {} account(s) and every transaction in them?",
                ids.len()
            );
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = service.bulk_delete(&ids)?;
            output::success(&format!("Deleted {} account(s)", deleted.len()));
            if deleted.len() < ids.len() {
                output::warning(&format!(
                    "{} account(s) were not found",
                    ids.len() - deleted.len()
                ));
            }
        }
    }

    Ok(())
}
