//! `desy` and `maxiv` subcommands

use anyhow::Result;

use panfinder_core::SharedProgress;
use panfinder_scicat::Facility;

use crate::config::Config;

pub fn run(facility: Facility, config: &Config, progress: &SharedProgress) -> Result<()> {
    let summary = panfinder_scicat::run(&config.scicat(facility), progress)?;
    super::print_summary(&facility.name().to_uppercase(), &summary);
    Ok(())
}
