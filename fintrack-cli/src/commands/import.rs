//! Import command - review and import transactions from CSV

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};

use fintrack_core::adapters::confirm::FixedAnswer;
use fintrack_core::ports::{AccountDirectory, ConfirmationGate};
use fintrack_core::services::{ImportSession, LogEvent, ReviewView, SessionView, SubmitOutcome};
use fintrack_core::{FieldKey, FintrackContext, RawTable};

use super::{get_context, get_data_dir, get_logger, log_event};
use crate::output;

/// Rows shown in the review table
const PREVIEW_ROWS: usize = 10;

#[derive(Args)]
pub struct ImportArgs {
    /// Path to CSV file (first row is the header)
    pub file: Option<PathBuf>,
    /// Account ID or name to import into
    #[arg(long)]
    pub account: Option<String>,
    /// Create a new account with this name and import into it
    #[arg(long, conflicts_with = "account")]
    pub create_account: Option<String>,
    /// Column assignments, e.g. "1=date,Desc=payee,3=amount,4=skip"
    ///
    /// Columns are 1-based numbers or header names.
    #[arg(long, value_delimiter = ',')]
    pub map: Vec<String>,
    /// Apply a saved import profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Save the final column mapping under this name
    #[arg(long)]
    pub save_profile: Option<String>,
    /// List saved profiles
    #[arg(long)]
    pub list_profiles: bool,
    /// Show the review table without importing
    #[arg(long)]
    pub preview: bool,
    /// Skip all prompts and confirm the import
    #[arg(long, short)]
    pub yes: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Yes/no prompt on the terminal
struct PromptGate;

#[async_trait]
impl ConfirmationGate for PromptGate {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        let prompt = format!("{} {}", title, message);
        tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}

pub async fn run(args: ImportArgs) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    if args.list_profiles {
        return list_profiles(&ctx, args.json);
    }

    let file = args
        .file
        .as_ref()
        .ok_or_else(|| anyhow!("File path required for import"))?;
    let table = RawTable::from_csv_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let interactive = !args.yes && !args.json && std::io::stdin().is_terminal();
    let gate: Arc<dyn ConfirmationGate> = if args.yes {
        Arc::new(FixedAnswer::yes())
    } else if args.preview {
        Arc::new(FixedAnswer::no())
    } else if interactive {
        Arc::new(PromptGate)
    } else {
        bail!("Confirmation needed: run in a terminal or pass --yes");
    };

    let session = ctx.import_session(gate);
    session.upload(table)?;
    log_event(&logger, LogEvent::new("import_started").with_command("import"));

    if let Some(name) = &args.profile {
        let profile = ctx
            .config
            .profile(name)
            .ok_or_else(|| anyhow!("Profile not found: {}", name))?;
        let applied = session.apply_profile(profile)?;
        if !args.json {
            output::info(&format!("Profile '{}' assigned {} column(s)", name, applied));
        }
    }

    for spec in &args.map {
        let (column, field) = parse_map_spec(&session, spec)?;
        session.assign_column(column, field)?;
    }

    if interactive {
        prompt_for_columns(&session)?;
    }

    select_account(&ctx, &session, &args, interactive).await?;

    let view = match session.view() {
        SessionView::Reviewing(view) => view,
        SessionView::Idle => bail!("No import is under review"),
    };
    if !args.json {
        print_review(&view);
    }

    if let Some(name) = &args.save_profile {
        if let Some(profile) = session.current_profile() {
            let data_dir = get_data_dir()?;
            let mut config = ctx.config.clone();
            config.set_profile(name.clone(), profile);
            config.save(&data_dir)?;
            if !args.json {
                output::success(&format!("Saved profile '{}'", name));
            }
        }
    }

    if args.preview {
        session.cancel()?;
        return Ok(());
    }

    let outcome = session.submit().await;
    match outcome {
        SubmitOutcome::Committed(ref created) => {
            log_event(&logger, LogEvent::new("import_committed").with_command("import"));
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({ "imported": created.len(), "transactions": created })
                );
            } else {
                output::success(&outcome.user_message());
            }
            Ok(())
        }
        SubmitOutcome::Declined => {
            log_event(&logger, LogEvent::new("import_declined").with_command("import"));
            if args.json {
                println!("{}", serde_json::json!({ "imported": 0, "declined": true }));
            } else {
                output::warning(&outcome.user_message());
            }
            Ok(())
        }
        SubmitOutcome::Failed(e) => Err(e.into()),
    }
}

fn list_profiles(ctx: &FintrackContext, json: bool) -> Result<()> {
    let profiles = &ctx.config.import_profiles;
    if json {
        println!("{}", serde_json::to_string_pretty(profiles)?);
        return Ok(());
    }
    if profiles.is_empty() {
        println!("No saved profiles.");
        return Ok(());
    }

    println!("Saved import profiles:");
    for (name, profile) in profiles {
        println!();
        println!("  {}", name.green());
        for (header, field) in &profile.columns {
            println!("    {} -> {}", header, field);
        }
    }
    Ok(())
}

/// Parse `COLUMN=FIELD`, where COLUMN is a 1-based number or header name
/// and FIELD is amount, date, payee or skip
fn parse_map_spec(session: &ImportSession, spec: &str) -> Result<(usize, Option<FieldKey>)> {
    let (column, field) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid mapping '{}', expected COLUMN=FIELD", spec))?;

    let headers = match session.view() {
        SessionView::Reviewing(view) => view.headers,
        SessionView::Idle => bail!("No import is under review"),
    };

    let column = column.trim();
    let index = match column.parse::<usize>() {
        Ok(n) if n >= 1 => n - 1,
        Ok(_) => bail!("Column numbers start at 1"),
        Err(_) => headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| anyhow!("No column named '{}'", column))?,
    };

    let field = match field.trim().to_lowercase().as_str() {
        "skip" | "none" | "" => None,
        other => Some(FieldKey::from_str(other)?),
    };

    Ok((index, field))
}

/// Ask for each unassigned column until every required field is mapped
fn prompt_for_columns(session: &ImportSession) -> Result<()> {
    let view = match session.view() {
        SessionView::Reviewing(view) => view,
        SessionView::Idle => return Ok(()),
    };
    if view.ready {
        return Ok(());
    }

    for (column, header) in view.headers.iter().enumerate() {
        let current = match session.view() {
            SessionView::Reviewing(v) => v,
            SessionView::Idle => return Ok(()),
        };
        if current.ready {
            break;
        }
        if current.assignment.get(column).is_some() {
            continue;
        }

        let open: Vec<FieldKey> = FieldKey::ALL
            .into_iter()
            .filter(|f| !current.assignment.contains_field(*f))
            .collect();
        let sample = current
            .body
            .first()
            .and_then(|row| row.get(column))
            .map(String::as_str)
            .unwrap_or("");

        let mut items = vec!["skip".to_string()];
        items.extend(open.iter().map(|f| f.to_string()));

        let choice = Select::new()
            .with_prompt(format!("Column {} '{}' (e.g. {})", column + 1, header, sample))
            .items(&items)
            .default(0)
            .interact()?;

        if choice > 0 {
            session.assign_column(column, Some(open[choice - 1]))?;
        }
    }
    Ok(())
}

async fn select_account(
    ctx: &FintrackContext,
    session: &ImportSession,
    args: &ImportArgs,
    interactive: bool,
) -> Result<()> {
    let directory: &dyn AccountDirectory = ctx.repository.as_ref();

    if let Some(name) = &args.create_account {
        let account = directory.create_account(ctx.user_id(), name).await?;
        if !args.json {
            output::success(&format!("Created account '{}'", account.name));
        }
        session.select_account(account.id)?;
        return Ok(());
    }

    if let Some(account) = &args.account {
        let account = ctx.account_service.resolve(account)?;
        session.select_account(account.id)?;
        return Ok(());
    }

    if !interactive {
        return Ok(());
    }

    let accounts = directory.list_accounts(ctx.user_id()).await?;
    let mut items: Vec<String> = accounts.iter().map(|a| a.name.clone()).collect();
    items.push("+ Create new account".to_string());

    let choice = Select::new()
        .with_prompt("Import into account")
        .items(&items)
        .default(0)
        .interact()?;

    let account_id = match accounts.get(choice) {
        Some(account) => account.id,
        None => {
            let name: String = Input::new().with_prompt("Account name").interact_text()?;
            directory.create_account(ctx.user_id(), &name).await?.id
        }
    };
    session.select_account(account_id)?;
    Ok(())
}

fn print_review(view: &ReviewView) {
    let mut table = output::create_table();
    let header: Vec<String> = view
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| match view.assignment.get(i) {
            Some(field) => format!("{}. {} [{}]", i + 1, h, field),
            None => format!("{}. {}", i + 1, h),
        })
        .collect();
    table.set_header(header);
    for row in view.body.iter().take(PREVIEW_ROWS) {
        table.add_row(row.clone());
    }
    println!("{}", table);

    if view.body.len() > PREVIEW_ROWS {
        println!("... and {} more row(s)", view.body.len() - PREVIEW_ROWS);
    }

    let (assigned, required) = view.progress;
    let progress = format!("{} of {} required columns assigned", assigned, required);
    if view.ready {
        output::success(&progress);
    } else {
        output::warning(&progress);
    }
    if view.account_id.is_none() {
        output::warning("No account selected");
    }
}
