//! Short code generation.

use rand::Rng;

/// Number of characters in a generated short code.
pub const CODE_LENGTH: usize = 6;

/// Codes that would be shadowed by fixed top-level routes.
pub const RESERVED_CODES: &[&str] = &["health"];

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random short code of [`CODE_LENGTH`] ASCII letters and digits.
///
/// # Examples
///
/// ```
/// use shortlink::utils::code_generator::{generate_code, CODE_LENGTH};
///
/// let code = generate_code();
/// assert_eq!(code.len(), CODE_LENGTH);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> String {
    let mut rng = rand::rng();

    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns `true` if `code` could have been produced by [`generate_code`].
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Returns `true` if `code` collides with a fixed route and must not be issued.
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_correct_length() {
        assert_eq!(generate_code().len(), CODE_LENGTH);
    }

    #[test]
    fn test_generate_code_alphanumeric_only() {
        for _ in 0..200 {
            let code = generate_code();
            assert!(is_valid_code(&code), "unexpected code {code}");
        }
    }

    #[test]
    fn test_generate_code_is_mostly_unique() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code()).collect();

        // 62^6 possibilities; a handful of collisions would already be suspicious.
        assert!(codes.len() > 995);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("aB3xY9"));
        assert!(!is_valid_code("short"));
        assert!(!is_valid_code("toolong1"));
        assert!(!is_valid_code("ab-c_d"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_is_reserved_code() {
        assert!(is_reserved_code("health"));
        assert!(!is_reserved_code("Health"));
        assert!(!is_reserved_code("aB3xY9"));
    }
}
