use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Client-supplied room identifier. Opaque to the relay.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolves the `room` connection parameter: a missing or blank value
    /// lands in the `"default"` room.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the diagnostics listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub clients: usize,
}

/// Body of the read-only diagnostics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomsReport {
    pub service: String,
    pub version: String,
    pub rooms: Vec<RoomSummary>,
}
