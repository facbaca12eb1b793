//! Categories command - list and manage categories

use anyhow::Result;
use clap::Subcommand;

use super::{confirm, get_context, split_ids};
use crate::output;

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// List categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a category
    Create {
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a category
    Rename {
        /// Category ID or current name
        category: String,
        name: String,
    },
    /// Delete categories; their transactions become uncategorized
    Delete {
        /// Category IDs or names
        #[arg(required = true)]
        categories: Vec<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn run(command: CategoriesCommands) -> Result<()> {
    let ctx = get_context()?;
    let service = &ctx.category_service;

    match command {
        CategoriesCommands::List { json } => {
            let categories = service.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
                return Ok(());
            }
            if categories.is_empty() {
                println!("No categories yet. Create one with `ft categories create <name>`.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Name", "ID", "Created"]);
            for category in categories {
                table.add_row(vec![
                    category.name,
                    category.id.to_string(),
                    category.created_at.format("%Y-%m-%d").to_string(),
                ]);
            }
            println!("{}", table);
        }
        CategoriesCommands::Create { name, json } => {
            let category = service.create(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&category)?);
            } else {
                output::success(&format!("Created category '{}' ({})", category.name, category.id));
            }
        }
        CategoriesCommands::Rename { category, name } => {
            let existing = service.resolve(&category)?;
            let renamed = service.rename(existing.id, &name)?;
            output::success(&format!("Renamed '{}' to '{}'", existing.name, renamed.name));
        }
        CategoriesCommands::Delete { categories, yes } => {
            let (mut ids, names) = split_ids(&categories);
            for name in names {
                ids.push(service.resolve(name)?.id);
            }

            let prompt = format!(
                "Delete {} category(ies)? Their transactions become uncategorized.",
                ids.len()
            );
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = service.bulk_delete(&ids)?;
            output::success(&format!("Deleted {} category(ies)", deleted.len()));
            if deleted.len() < ids.len() {
                output::warning(&format!(
                    "{} category(ies) were not found",
                    ids.len() - deleted.len()
                ));
            }
        }
    }

    Ok(())
}
