use anyhow::{Context, Result};
use clap::Parser;
use std::process::exit;

mod cli;
mod search_manager;
mod system;

use cli::{execute_command, Cli};
use searchcli::Paths;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments, usage errors exit with status 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            exit(1);
        }
    };
    let paths = Paths::from_home()?;

    // Execute the appropriate command
    execute_command(&cli, paths).with_context(|| "command execution failed")
}
