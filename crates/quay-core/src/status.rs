use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle bucket a project falls into.
///
/// Derived purely from which well-known subtree contains the project's
/// directory; `Active` is the default when no status folder matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Crawlers,
    Research,
    Tools,
    Icebox,
    Archived,
}

impl Status {
    /// Every status, in a fixed display/counting order.
    pub const ALL: [Status; 6] = [
        Status::Active,
        Status::Crawlers,
        Status::Research,
        Status::Tools,
        Status::Icebox,
        Status::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Crawlers => "crawlers",
            Status::Research => "research",
            Status::Tools => "tools",
            Status::Icebox => "icebox",
            Status::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParseError {
    pub input: String,
}

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown status `{}` (expected one of: active, crawlers, research, tools, icebox, archived)",
            self.input
        )
    }
}

impl std::error::Error for StatusParseError {}

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "crawlers" => Ok(Status::Crawlers),
            "research" => Ok(Status::Research),
            "tools" => Ok(Status::Tools),
            "icebox" => Ok(Status::Icebox),
            "archived" => Ok(Status::Archived),
            other => Err(StatusParseError {
                input: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip_is_lowercase() {
        let json = serde_json::to_string(&Status::Icebox).unwrap();
        assert_eq!(json, "\"icebox\"");
        assert_eq!(serde_json::from_str::<Status>("\"archived\"").unwrap(), Status::Archived);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("shelved".parse::<Status>().is_err());
        assert_eq!("tools".parse::<Status>().unwrap(), Status::Tools);
    }
}
