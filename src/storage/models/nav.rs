use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a ticker's dividend history comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Yahoo,
    Roundhill,
    #[serde(alias = "ymax")]
    Yieldmax,
    #[serde(alias = "jpm")]
    Jpmorgan,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Yahoo => "yahoo",
            SourceKind::Roundhill => "roundhill",
            SourceKind::Yieldmax => "yieldmax",
            SourceKind::Jpmorgan => "jpmorgan",
        };
        write!(f, "{}", name)
    }
}

/// One ticker from the nav config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    #[serde(alias = "ticker", alias = "Symbol")]
    pub symbol: String,
    #[serde(default, alias = "Company")]
    pub company: String,
    #[serde(default, alias = "Frequency")]
    pub frequency: String,
    #[serde(default, alias = "Group")]
    pub group: String,
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NavFile {
    Entries(Vec<NavEntry>),
    Wrapped { nav: Vec<NavEntry> },
}

impl NavFile {
    pub fn into_entries(self) -> Vec<NavEntry> {
        match self {
            NavFile::Entries(entries) => entries,
            NavFile::Wrapped { nav } => nav,
        }
    }
}
