//! SciCat facilities served by this crate

use std::fmt;

use panfinder_core::CountCheck;

pub const DESY_CATALOG_URL: &str = "https://public-data.desy.de/api/v3";
pub const MAXIV_CATALOG_URL: &str = "https://scicat.maxiv.lu.se/api/v3";
pub const MAXIV_PANOSC_URL: &str = "https://searchapi.maxiv.lu.se/api";

/// Facility running a public SciCat catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    /// Deutsches Elektronen-Synchrotron
    Desy,
    /// MAX IV Laboratory
    Maxiv,
}

impl Facility {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Desy => "desy",
            Self::Maxiv => "maxiv",
        }
    }

    /// Output file name prefix, timestamp follows
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Self::Desy => "oscars_pan_finder_desy_data_",
            Self::Maxiv => "oscars_pan_finder_maxiv_data_",
        }
    }

    pub fn catalog_url(&self) -> &'static str {
        match self {
            Self::Desy => DESY_CATALOG_URL,
            Self::Maxiv => MAXIV_CATALOG_URL,
        }
    }

    /// PaNOSC search API joined onto catalog documents, if any
    pub fn panosc_url(&self) -> Option<&'static str> {
        match self {
            Self::Desy => None,
            Self::Maxiv => Some(MAXIV_PANOSC_URL),
        }
    }

    /// Catalog document field matched against PaNOSC document pids.
    ///
    /// The two catalogs don't agree on which field is unique, so this stays
    /// per facility.
    pub fn panosc_join_key(&self) -> &'static str {
        match self {
            Self::Desy => "id",
            Self::Maxiv => "doi",
        }
    }

    /// How a published data count mismatch is treated
    pub fn count_check(&self) -> CountCheck {
        match self {
            Self::Desy => CountCheck::Strict,
            Self::Maxiv => CountCheck::Warn,
        }
    }

    pub fn all() -> &'static [Facility] {
        &[Self::Desy, Self::Maxiv]
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
