//! panfinder - OSCARS PaN-Finder catalog collectors
//!
//! Harvests public metadata catalogs of DESY, MaxIV, ILL and ESRF into
//! timestamped JSON files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;
use panfinder_scicat::Facility;

#[derive(Parser)]
#[command(name = "panfinder")]
#[command(about = "Collect facility metadata catalogs into JSON files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./panfinder.toml or ~/.config/panfinder/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output data directory (default: ../data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// DESY published data with their datasets
    Desy,
    /// MaxIV published data with their datasets and PaNOSC documents
    Maxiv,
    /// ILL PaNOSC documents with their DOI landing pages
    Ill,
    /// ESRF PaNOSC documents and catalogue entries
    Esrf(cmd::esrf::EsrfArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = Arc::new(panfinder_core::ProgressContext::new());

    // With a TTY, log lines go above the progress bars
    let multi = progress.is_tty().then(|| progress.multi());
    if let Err(e) = panfinder_core::init_logging(cli.debug, multi) {
        eprintln!("logger already initialised: {e}");
    }

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    if let Some(dir) = cli.data_dir {
        config.output.data_dir = dir;
    }

    panfinder_core::set_http_config(config.http.http_config());

    match cli.command {
        Command::Desy => cmd::scicat::run(Facility::Desy, &config, &progress),
        Command::Maxiv => cmd::scicat::run(Facility::Maxiv, &config, &progress),
        Command::Ill => cmd::ill::run(&config, &progress),
        Command::Esrf(args) => cmd::esrf::run(args, &config, &progress),
        Command::Config => {
            cmd::show_config(&config);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["panfinder", "maxiv", "--debug", "--data-dir", "/tmp/out"]);
        assert!(cli.debug);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/out")));
        assert!(matches!(cli.command, Command::Maxiv));
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
