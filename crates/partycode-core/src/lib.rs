//! Party Code Core - Shared types, code generation and configuration
//!
//! This crate contains the foundational types used by the party code service.
//! It has no dependencies on networking or storage code.

pub mod clock;
pub mod code;
pub mod config;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{
    generate_code, is_valid_code, normalize_code, EntropySource, OsEntropy, CODE_CHARS,
    CODE_LENGTH, FALLBACK_CODE_LENGTH,
};
pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};
pub use types::{code_ttl, PartyCode, CODE_TTL_SECS};

/// Maximum attempts at a unique short code before falling back to a long one
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// Maximum accepted peer id length in characters
pub const MAX_PEER_ID_LEN: usize = 255;
