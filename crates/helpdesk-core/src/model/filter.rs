use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, Role, Status, normalize};

/// Dashboard status filter: everything, or one exact status.
///
/// Serialized as its text form: `"all"` or a status such as `"assigned"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Filter a dashboard opens with for `role`.
    ///
    /// Technicians land on their freshly assigned work; everyone else sees all.
    #[must_use]
    pub const fn default_for(role: Role) -> Self {
        match role {
            Role::Technician => Self::Only(Status::Assigned),
            Role::Admin | Role::User => Self::All,
        }
    }

    #[must_use]
    pub fn matches(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => fmt::Display::fmt(status, f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if normalize(s) == "all" {
            return Ok(Self::All);
        }
        s.parse::<Status>().map(Self::Only).map_err(|_| ParseEnumError {
            expected: "status filter",
            got: s.to_string(),
        })
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
