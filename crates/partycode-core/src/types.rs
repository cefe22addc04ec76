//! Party code entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of a party code in seconds (2 hours)
pub const CODE_TTL_SECS: i64 = 2 * 60 * 60;

/// Lifetime of a party code
pub fn code_ttl() -> Duration {
    Duration::seconds(CODE_TTL_SECS)
}

/// A short code mapped to the peer that registered it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCode {
    pub code: String,
    pub peer_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PartyCode {
    /// Create an entry that expires one TTL after `created_at`
    pub fn new(code: String, peer_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            peer_id,
            created_at,
            expires_at: created_at + code_ttl(),
        }
    }

    /// Whether the entry has expired as of `now`
    ///
    /// An entry stays live through the instant it expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
