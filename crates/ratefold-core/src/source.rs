use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in diagnostics and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// The trusted rates backend (`/api/rates/...`).
    Backend,
    /// External official-rate provider (central bank USD/EUR reference).
    Official,
    /// External P2P/parallel-market provider.
    P2p,
    /// External provider for the official history series.
    OfficialHistory,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [Self::Backend, Self::Official, Self::P2p, Self::OfficialHistory];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Official => "official",
            Self::P2p => "p2p",
            Self::OfficialHistory => "official_history",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backend" => Ok(Self::Backend),
            "official" => Ok(Self::Official),
            "p2p" => Ok(Self::P2p),
            "official_history" => Ok(Self::OfficialHistory),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
