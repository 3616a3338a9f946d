//! Short link id generation.
//!
//! Ids are drawn uniformly from `[a-zA-Z0-9]`. Uniqueness is not a property of
//! the generator; callers check each draw against the store.

use rand::Rng;

/// Number of characters in a generated link id.
pub const ID_LENGTH: usize = 6;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws a random [`ID_LENGTH`]-character alphanumeric id.
///
/// # Examples
///
/// ```
/// use link_store::utils::code_generator::{generate_id, ID_LENGTH};
///
/// let id = generate_id();
/// assert_eq!(id.len(), ID_LENGTH);
/// assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_id() -> String {
    generate_with_rng(&mut rand::rng(), ID_LENGTH)
}

/// Draws an id of `len` characters from `rng`.
pub fn generate_with_rng<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_has_correct_length() {
        assert_eq!(generate_id().len(), 6);
    }

    #[test]
    fn test_generate_id_is_alphanumeric() {
        for _ in 0..100 {
            assert!(generate_id().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_generate_id_mostly_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();

        // 62^6 possible ids; a handful of collisions in 1000 draws is astronomically unlikely.
        assert!(ids.len() >= 998);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = generate_with_rng(&mut StdRng::seed_from_u64(42), 6);
        let b = generate_with_rng(&mut StdRng::seed_from_u64(42), 6);
        assert_eq!(a, b);
    }

    #[test]
    fn test_charset_covers_all_classes() {
        assert_eq!(CHARSET.len(), 62);
        assert!(CHARSET.iter().any(u8::is_ascii_lowercase));
        assert!(CHARSET.iter().any(u8::is_ascii_uppercase));
        assert!(CHARSET.iter().any(u8::is_ascii_digit));
    }
}
