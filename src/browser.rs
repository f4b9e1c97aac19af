use crate::config::Config;
use crate::model::Entry;
use anyhow::Result;
use std::process::{Command, Stdio};

/// Opens the entry's url in the configured browser (xdg-open by default),
/// fully detached from our stdio.
pub fn open(entry: &Entry, config: &Config) -> Result<()> {
    let browser = config
        .general
        .browser
        .as_deref()
        .unwrap_or("xdg-open");

    let mut parts = browser.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };

    log::info!("opening {} ({})", entry.name, entry.url);
    Command::new(program)
        .args(parts)
        .arg(&entry.url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}
