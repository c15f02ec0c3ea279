//! Password synthesis for users declared without one
//!
//! CREATE USER needs a password even for key-pair service users, so the
//! loader fills one in. The generator is injected so tests can use a fixed
//! value.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
// No quotes or backslash: the value ends up inside a SQL string literal
const PUNCTUATION: &[u8] = b"!#$%&()*+,-./:<=>?@[]^_{|}~";

pub trait PasswordGenerator {
    fn generate(&self) -> String;
}

/// Random password from the OS RNG with at least one character of each class
#[derive(Debug, Clone)]
pub struct RandomPassword {
    length: usize,
}

impl RandomPassword {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(4),
        }
    }
}

impl Default for RandomPassword {
    fn default() -> Self {
        Self::new(32)
    }
}

impl PasswordGenerator for RandomPassword {
    fn generate(&self) -> String {
        let mut rng = OsRng;
        let alphabet: Vec<u8> = [UPPER, LOWER, DIGITS, PUNCTUATION].concat();

        let mut chars: Vec<u8> = [UPPER, LOWER, DIGITS, PUNCTUATION]
            .iter()
            .filter_map(|class| class.choose(&mut rng).copied())
            .collect();
        while chars.len() < self.length {
            if let Some(c) = alphabet.choose(&mut rng) {
                chars.push(*c);
            }
        }
        chars.shuffle(&mut rng);

        chars.into_iter().map(char::from).collect()
    }
}

/// Always returns the same value
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedPassword(pub String);

#[cfg(test)]
impl PasswordGenerator for FixedPassword {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_password_shape() {
        let password = RandomPassword::default().generate();
        assert_eq!(password.len(), 32);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.bytes().any(|b| PUNCTUATION.contains(&b)));
        assert!(!password.contains('\'') && !password.contains('\\'));
    }

    #[test]
    fn test_random_password_minimum_length() {
        assert_eq!(RandomPassword::new(1).generate().len(), 4);
    }

    #[test]
    fn test_random_passwords_differ() {
        let generator = RandomPassword::default();
        assert_ne!(generator.generate(), generator.generate());
    }
}
