//! Fintrack CLI - personal finance tracking in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{accounts, categories, import, logs, summary, transactions};
use fintrack_core::services::LogEvent;

/// Fintrack - personal finance tracking in your terminal
#[derive(Parser)]
#[command(name = "ft", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        command: accounts::AccountsCommands,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: categories::CategoriesCommands,
    },

    /// List and edit transactions
    Transactions {
        #[command(subcommand)]
        command: transactions::TransactionsCommands,
    },

    /// Import transactions from CSV
    Import(import::ImportArgs),

    /// Show income, expenses and spending by category
    Summary {
        /// Start date (yyyy-MM-dd, default: 30 days before the end date)
        #[arg(long)]
        from: Option<String>,
        /// End date (yyyy-MM-dd, default: today)
        #[arg(long)]
        to: Option<String>,
        /// Only this account (ID or name)
        #[arg(long)]
        account: Option<String>,
        /// Also show per-day totals
        #[arg(long)]
        daily: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Accounts { .. } => "accounts",
            Commands::Categories { .. } => "categories",
            Commands::Transactions { .. } => "transactions",
            Commands::Import(_) => "import",
            Commands::Summary { .. } => "summary",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();

    let logger = commands::get_logger();
    commands::log_event(&logger, LogEvent::new("command_executed").with_command(command));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_event(
                &logger,
                LogEvent::new("command_failed")
                    .with_command(command)
                    .with_error(command_error_kind(&e)),
            );
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Error category for the log; never the message, which may quote user data
fn command_error_kind(e: &anyhow::Error) -> &'static str {
    use fintrack_core::Error;
    match e.downcast_ref::<Error>() {
        Some(Error::NotFound(_)) => "not_found",
        Some(Error::Validation(_)) => "validation",
        Some(Error::Parse { .. }) => "parse",
        Some(Error::Persistence(_)) => "persistence",
        Some(Error::Database(_)) => "database",
        Some(Error::InvalidState(_)) => "invalid_state",
        Some(Error::Busy) => "busy",
        Some(_) => "core",
        None => "cli",
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Accounts { command } => accounts::run(command),
        Commands::Categories { command } => categories::run(command),
        Commands::Transactions { command } => transactions::run(command),
        Commands::Import(args) => import::run(args).await,
        Commands::Summary {
            from,
            to,
            account,
            daily,
            json,
        } => summary::run(from, to, account, daily, json),
        Commands::Logs { command } => logs::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_kind() {
        let parse = anyhow::Error::from(fintrack_core::Error::parse(1, "payee", "value is empty"));
        assert_eq!(command_error_kind(&parse), "parse");

        let persistence = anyhow::Error::from(fintrack_core::Error::Persistence("reset".to_string()));
        assert_eq!(command_error_kind(&persistence), "persistence");

        assert_eq!(command_error_kind(&anyhow::anyhow!("no file")), "cli");
    }
}
