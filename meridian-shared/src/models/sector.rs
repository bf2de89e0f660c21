use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Business vertical a customer is classified into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sector {
    Construction,
    Industry,
    Automotive,
    Aeronautics,
    Energy,
    Naval,
    Railway,
    Agriculture,
    PublicSector,
    Distribution,
    Other,
}

impl Sector {
    pub const ALL: [Sector; 11] = [
        Sector::Construction,
        Sector::Industry,
        Sector::Automotive,
        Sector::Aeronautics,
        Sector::Energy,
        Sector::Naval,
        Sector::Railway,
        Sector::Agriculture,
        Sector::PublicSector,
        Sector::Distribution,
        Sector::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Construction => "CONSTRUCTION",
            Sector::Industry => "INDUSTRY",
            Sector::Automotive => "AUTOMOTIVE",
            Sector::Aeronautics => "AERONAUTICS",
            Sector::Energy => "ENERGY",
            Sector::Naval => "NAVAL",
            Sector::Railway => "RAILWAY",
            Sector::Agriculture => "AGRICULTURE",
            Sector::PublicSector => "PUBLIC_SECTOR",
            Sector::Distribution => "DISTRIBUTION",
            Sector::Other => "OTHER",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Sector {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .iter()
            .copied()
            .find(|sector| sector.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnumError {
                kind: "sector",
                value: s.to_string(),
            })
    }
}
