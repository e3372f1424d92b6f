use anyhow::{Context, Result};
use log::debug;
use std::env;

use searchcli::open_command;

// Hand the URL to the default browser without waiting for it
pub fn open_url(url: &str) -> Result<()> {
    let mut command = open_command(env::consts::OS, url)?;
    debug!("launching {command:?}");

    command
        .spawn()
        .with_context(|| format!("failed to open {url}"))?;
    Ok(())
}
