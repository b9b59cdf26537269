//! Composite cache key identifying one upstream metadata record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building or parsing a [`CacheKey`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("unknown media kind: {0}")]
    UnknownKind(String),

    #[error("external id must be a non-negative integer, got {0}")]
    InvalidId(String),

    #[error("malformed key token: {0}")]
    MalformedToken(String),
}

/// Discriminator between movie and series entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv", alias = "series")]
    Series,
}

impl MediaKind {
    /// Path segment used by the upstream API and the snapshot token prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "tv" | "series" => Ok(MediaKind::Series),
            other => Err(KeyError::UnknownKind(other.to_string())),
        }
    }
}

/// `(kind, external id)` pair. The id is guaranteed non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    kind: MediaKind,
    id: u64,
}

impl CacheKey {
    /// Build a key from a signed id, rejecting negative values.
    pub fn new(kind: MediaKind, id: i64) -> Result<Self, KeyError> {
        let id = u64::try_from(id).map_err(|_| KeyError::InvalidId(id.to_string()))?;
        Ok(Self { kind, id })
    }

    pub fn from_unsigned(kind: MediaKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Flatten to the `<kind>_<id>` snapshot token.
    pub fn to_token(&self) -> String {
        format!("{}_{}", self.kind, self.id)
    }

    /// Parse a `<kind>_<id>` token, splitting on the first `_`.
    pub fn parse_token(token: &str) -> Result<Self, KeyError> {
        let (kind, id) = token
            .split_once('_')
            .ok_or_else(|| KeyError::MalformedToken(token.to_string()))?;
        let kind = kind.parse::<MediaKind>()?;
        let id = id
            .parse::<u64>()
            .map_err(|_| KeyError::InvalidId(id.to_string()))?;
        Ok(Self { kind, id })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.id)
    }
}
