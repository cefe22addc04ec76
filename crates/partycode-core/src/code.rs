//! Party code alphabet, generation and parsing

/// Length of a party code in characters
pub const CODE_LENGTH: usize = 6;

/// Length of a party code issued when every short candidate collided
pub const FALLBACK_CODE_LENGTH: usize = 8;

/// Characters used in party codes (no I, O, 0 or 1)
pub const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

// A random byte maps onto the alphabet without modulo bias only if the
// alphabet size divides 256.
const _: () = assert!(256 % CODE_CHARS.len() == 0);

/// Source of random bytes for code generation
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), getrandom::Error>;
}

/// Operating system RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), getrandom::Error> {
        getrandom::fill(dest)
    }
}

/// Generate a random code of `len` characters drawn uniformly from [`CODE_CHARS`]
pub fn generate_code(len: usize, entropy: &dyn EntropySource) -> Result<String, getrandom::Error> {
    let mut bytes = vec![0u8; len];
    entropy.fill(&mut bytes)?;

    Ok(bytes
        .iter()
        .map(|b| CODE_CHARS[(*b as usize) % CODE_CHARS.len()] as char)
        .collect())
}

/// Normalize user input for lookup (uppercase)
pub fn normalize_code(code: &str) -> String {
    code.to_uppercase()
}

/// Check that a code has an issued length and only alphabet characters
pub fn is_valid_code(code: &str) -> bool {
    (code.len() == CODE_LENGTH || code.len() == FALLBACK_CODE_LENGTH)
        && code.bytes().all(|b| CODE_CHARS.contains(&b))
}
