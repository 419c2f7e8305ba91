//! `ill` subcommand

use anyhow::Result;

use panfinder_core::SharedProgress;

use crate::config::Config;

pub fn run(config: &Config, progress: &SharedProgress) -> Result<()> {
    let summary = panfinder_ill::run(&config.ill(), progress)?;
    super::print_summary("ILL", &summary);
    Ok(())
}
