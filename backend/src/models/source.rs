use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Provenance of a task or event.
///
/// Imported records always carry the upstream id, so the
/// "external id present iff imported" rule cannot be broken in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RecordSource {
    User,
    Tecsup { external_id: String },
}

impl RecordSource {
    pub fn tecsup(external_id: impl Into<String>) -> Self {
        Self::Tecsup {
            external_id: external_id.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::User => SourceKind::User,
            Self::Tecsup { .. } => SourceKind::Tecsup,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        match self {
            Self::User => None,
            Self::Tecsup { external_id } => Some(external_id),
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Tecsup { .. })
    }

    /// Rebuild from the `source` / `tecsup_external_id` column pair.
    pub fn from_columns(source: &str, external_id: Option<String>) -> Result<Self, ParseEnumError> {
        match (source.parse::<SourceKind>()?, external_id) {
            (SourceKind::User, _) => Ok(Self::User),
            (SourceKind::Tecsup, Some(external_id)) => Ok(Self::Tecsup { external_id }),
            (SourceKind::Tecsup, None) => Err(ParseEnumError {
                kind: "tecsup source without external id",
                value: source.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    User,
    Tecsup,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Tecsup => "tecsup",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "tecsup" => Ok(Self::Tecsup),
            other => Err(ParseEnumError {
                kind: "source",
                value: other.to_string(),
            }),
        }
    }
}
