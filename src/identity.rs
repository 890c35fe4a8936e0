use serde::Serialize;
use std::fmt;

/// Rate-limit bucket key derived from the forwarded-address header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Shared bucket for every caller without a usable forwarded address.
    pub const UNKNOWN: &'static str = "unknown";

    /// First comma-separated token of `x-forwarded-for`, trimmed. Absent or
    /// blank headers map to [`UNKNOWN`](Self::UNKNOWN).
    pub fn from_forwarded_for(header: Option<&str>) -> Self {
        let first = header
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|token| !token.is_empty());
        match first {
            Some(token) => Self(token.to_string()),
            None => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
