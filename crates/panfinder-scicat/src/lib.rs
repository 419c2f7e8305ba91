//! Panfinder SciCat - Published data collectors for DESY and MaxIV
//!
//! Both facilities run SciCat: every published data document is listed,
//! its `pidArray` resolved against `/datasets/{pid}`, and (MaxIV) joined
//! to the facility's PaNOSC search API documents.

pub mod api;
pub mod config;
pub mod enrich;
pub mod runner;
pub mod state;

pub use api::{DatasetLookup, ScicatApi};
pub use config::{Config, PanoscSource};
pub use enrich::{PanoscIndex, PanoscJoin, PublishedEntry};
pub use runner::run;
pub use state::Facility;
