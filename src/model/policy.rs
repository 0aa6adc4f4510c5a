use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How tasks are picked beneath each marked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// The first childless task under each marker
    Serial,
    /// Every childless task under each marker
    Parallel,
    /// Every task under each marker, with or without subtasks
    All,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Serial => write!(f, "serial"),
            Policy::Parallel => write!(f, "parallel"),
            Policy::All => write!(f, "all"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Policy::Serial),
            "parallel" => Ok(Policy::Parallel),
            "all" => Ok(Policy::All),
            _ => Err(format!(
                "unknown policy '{}' (expected: serial, parallel, all)",
                s
            )),
        }
    }
}
