use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::search_manager::SearchManager;
use crate::system::open_url;
use searchcli::{BangRecord, Paths, Resolution};

// CLI arguments parsing structure
#[derive(Parser)]
#[command(
    name = "search",
    author,
    version,
    about = "Search from the command line using DuckDuckGo-style bangs",
    long_about = None,
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Print the resolved URL instead of opening it
    #[arg(short = 'p', long)]
    pub print: bool,

    /// Search query, optionally starting with a bang such as `!w`
    #[arg(value_name = "QUERY", trailing_var_arg = true, allow_hyphen_values = true)]
    pub query: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set the bang used when a query has none
    SetDefault {
        /// Bang shortcut, with or without the leading `!`
        bang: String,
    },
    /// Show the current default bang
    GetDefault,
    /// List known bangs
    #[command(name = "list-bangs")]
    ListBangs {
        /// Only show bangs whose shortcut or name contains this text
        filter: Option<String>,

        /// Output results in JSON format
        #[arg(short = 'j', long)]
        json: bool,
    },
}

// JSON shape for `list-bangs --json`
#[derive(Serialize)]
struct BangListing<'a> {
    shortcut: &'a str,
    name: &'a str,
    domain: &'a str,
    category: &'a str,
    url: &'a str,
}

// Execute the selected command
pub fn execute_command(cli: &Cli, paths: Paths) -> Result<()> {
    let mut manager = SearchManager::new(paths);

    match &cli.command {
        Some(Commands::SetDefault { bang }) => cmd_set_default(&mut manager, bang),
        Some(Commands::GetDefault) => {
            cmd_get_default(&manager);
            Ok(())
        }
        Some(Commands::ListBangs { filter, json }) => {
            cmd_list(&mut manager, filter.as_deref().unwrap_or_default(), *json)
        }
        None => cmd_search(&mut manager, &cli.query, cli.print),
    }
}

// Command implementations
fn cmd_search(manager: &mut SearchManager, query: &[String], print: bool) -> Result<()> {
    if query.iter().all(|arg| arg.trim().is_empty()) {
        println!("please provide a search query.");
        return Ok(());
    }

    match manager.resolve(query)? {
        Resolution::Open(url) => {
            if print {
                println!("{url}");
                Ok(())
            } else {
                open_url(&url).context("failed to launch browser")
            }
        }
        Resolution::UnknownBang(shortcut) => {
            println!(
                "info: unknown bang: !{shortcut}, default bang can be reset with `search set-default g`"
            );
            Ok(())
        }
    }
}

fn cmd_set_default(manager: &mut SearchManager, bang: &str) -> Result<()> {
    let shortcut = manager
        .set_default(bang)
        .with_context(|| format!("failed to set default bang to {bang}"))?;
    println!("default bang set to !{shortcut}");
    Ok(())
}

fn cmd_get_default(manager: &SearchManager) {
    match manager.default_bang() {
        Some(shortcut) => println!("!{shortcut}"),
        None => println!("no default bang set, searches go to the web search fallback"),
    }
}

fn cmd_list(manager: &mut SearchManager, filter: &str, json_output: bool) -> Result<()> {
    let bangs = manager.list(filter)?;

    if json_output {
        let listing: Vec<_> = bangs
            .iter()
            .map(|bang| BangListing {
                shortcut: &bang.shortcut,
                name: &bang.name,
                domain: &bang.domain,
                category: &bang.category,
                url: &bang.url_template,
            })
            .collect();

        let json = serde_json::to_string_pretty(&listing)
            .context("failed to serialize bang list to JSON")?;
        println!("{json}");
        return Ok(());
    }

    if bangs.is_empty() {
        println!("no bangs found");
        return Ok(());
    }

    // Find the longest shortcut for alignment
    let max_shortcut_length = bangs
        .iter()
        .map(|bang| bang.shortcut.len())
        .max()
        .unwrap_or(0);

    println!("\u{001b}[4mAvailable bangs:\u{001b}[0m");
    for bang in &bangs {
        print_bang(bang, max_shortcut_length);
    }

    Ok(())
}

// Helper function to print a bang with proper formatting
fn print_bang(bang: &BangRecord, max_shortcut_length: usize) {
    let padded = format!(
        "{:<width$}",
        format!("!{}", bang.shortcut),
        width = max_shortcut_length + 1
    );

    if bang.domain.is_empty() {
        println!("  {padded}  {}", bang.name);
    } else {
        println!("  {padded}  {} ({})", bang.name, bang.domain);
    }
}
