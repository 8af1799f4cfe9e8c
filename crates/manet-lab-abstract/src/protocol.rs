use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LabError;

/// Routing protocols under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingProtocol {
    Aodv,
    Dsdv,
    Dsr,
    Olsr,
}

impl RoutingProtocol {
    pub const ALL: [RoutingProtocol; 4] = [
        RoutingProtocol::Aodv,
        RoutingProtocol::Dsdv,
        RoutingProtocol::Dsr,
        RoutingProtocol::Olsr,
    ];

    /// Lowercase identifier used on the command line, in the results log and
    /// in detailed record file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingProtocol::Aodv => "aodv",
            RoutingProtocol::Dsdv => "dsdv",
            RoutingProtocol::Dsr => "dsr",
            RoutingProtocol::Olsr => "olsr",
        }
    }

    /// Proactive protocols keep routes to every node up to date; reactive
    /// ones discover routes on demand.
    pub fn is_proactive(&self) -> bool {
        match self {
            RoutingProtocol::Dsdv | RoutingProtocol::Olsr => true,
            RoutingProtocol::Aodv | RoutingProtocol::Dsr => false,
        }
    }
}

impl fmt::Display for RoutingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingProtocol {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutingProtocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                LabError::InvalidConfiguration(format!(
                    "unknown protocol '{s}'. Use aodv, dsdv, olsr, or dsr."
                ))
            })
    }
}
