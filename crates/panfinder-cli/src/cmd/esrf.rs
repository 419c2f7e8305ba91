//! `esrf` subcommands

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use panfinder_core::SharedProgress;
use panfinder_esrf::{HttpCatalogue, SessionTokenProvider, StaticToken};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct EsrfArgs {
    #[command(subcommand)]
    pub command: EsrfCommand,
}

#[derive(Subcommand, Debug)]
pub enum EsrfCommand {
    /// List every public PaNOSC document
    Documents,
    /// Enrich listed documents from DataCite and the ICAT+ catalogue
    Catalogue(CatalogueArgs),
}

#[derive(Args, Debug)]
pub struct CatalogueArgs {
    /// Documents file written by `esrf documents`
    pub input: PathBuf,

    /// Documents to process; 0 or below means all [default: from config, 5]
    #[arg(allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Catalogue session token; skips opening the data portal
    #[arg(long)]
    pub session_token: Option<String>,
}

pub fn run(args: EsrfArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let esrf = config.esrf();
    match args.command {
        EsrfCommand::Documents => {
            let summary = panfinder_esrf::documents::run(&esrf, progress)?;
            super::print_summary("ESRF documents", &summary);
        }
        EsrfCommand::Catalogue(catalogue) => {
            let count = catalogue.count.unwrap_or(config.esrf.count);
            let token = catalogue
                .session_token
                .or_else(|| config.esrf.session_token.clone());
            let tokens = token_provider(token, &esrf);
            let api = HttpCatalogue::new(&esrf.icat_plus_url);
            let summary = panfinder_esrf::collector::run(
                &esrf,
                &catalogue.input,
                count,
                &api,
                tokens.as_ref(),
                progress,
            )?;
            super::print_summary("ESRF catalogue", &summary);
        }
    }
    Ok(())
}

/// A given token wins; otherwise the browser, when compiled in
fn token_provider(
    token: Option<String>,
    esrf: &panfinder_esrf::Config,
) -> Box<dyn SessionTokenProvider> {
    if let Some(token) = token {
        return Box::new(StaticToken(token));
    }
    #[cfg(feature = "browser")]
    {
        Box::new(panfinder_esrf::BrowserTokenProvider::new(&esrf.portal_url))
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = esrf;
        Box::new(panfinder_esrf::NoBrowser)
    }
}
