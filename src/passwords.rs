use rand::Rng;
use thiserror::Error;

/// Character classes drawn from: ASCII letters, digits and punctuation.
pub const ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789\
     !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password length must be at least 1")]
    LengthTooShort,
}

/// Generates a password of exactly `length` characters, each drawn
/// uniformly from [`ALPHABET`].
pub fn generate<R: Rng>(length: usize, rng: &mut R) -> Result<String, PasswordError> {
    if length < 1 {
        return Err(PasswordError::LengthTooShort);
    }

    let chars: Vec<char> = ALPHABET.chars().collect();
    Ok((0..length)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect())
}

/// Convenience wrapper over the thread-local generator.
pub fn generate_default(length: usize) -> Result<String, PasswordError> {
    generate(length, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(8)]
    #[case(64)]
    #[case(257)]
    fn password_has_exactly_the_requested_length(#[case] length: usize) {
        let mut rng = StdRng::seed_from_u64(7);
        let password = generate(length, &mut rng).unwrap();
        assert_eq!(password.chars().count(), length);
    }

    #[test]
    fn every_character_comes_from_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let password = generate(512, &mut rng).unwrap();
        for ch in password.chars() {
            assert!(ALPHABET.contains(ch), "unexpected character {ch:?}");
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(generate(0, &mut rng), Err(PasswordError::LengthTooShort));
    }

    #[test]
    fn alphabet_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for ch in ALPHABET.chars() {
            assert!(seen.insert(ch), "duplicate {ch:?} in alphabet");
        }
    }
}
