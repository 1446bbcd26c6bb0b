//! ID generation utilities.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 8;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }

    /// Generate an uppercase alphanumeric invite code.
    #[must_use]
    pub fn generate_invite_code(&self) -> String {
        random_code(INVITE_CODE_LEN)
    }

    /// Generate an opaque support reference, `ERR-<millis base36>-<4 chars>`.
    ///
    /// Shown to operators when a remote call fails so the failure can be
    /// correlated with server logs.
    #[must_use]
    pub fn generate_correlation_code(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        format!("ERR-{}-{}", to_base36(millis), random_code(4))
    }
}

fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let d = (value % 36) as usize;
        digits.push(CODE_ALPHABET[if d < 10 { 26 + d } else { d - 10 }]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32); // Simple UUID without hyphens
    }

    #[test]
    fn test_invite_code_shape() {
        let code = IdGenerator::new().generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_correlation_code_pattern() {
        #[allow(clippy::unwrap_used)]
        let pattern = Regex::new(r"^ERR-[A-Z0-9]+-[A-Z0-9]{4}$").unwrap();
        let code = IdGenerator::new().generate_correlation_code();
        assert!(pattern.is_match(&code), "unexpected code {code}");
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "ZZ");
    }
}
