use rand::Rng;

use crate::error::{FrameError, Result};

/// Number of letters in every request.
pub const LETTER_COUNT: usize = 3;

/// Added to each letter's code point to form a response value.
pub const VALUE_OFFSET: u16 = 41;

const VOWELS: [u8; 5] = *b"aeiou";

/// Three raw bytes carried by a request.
///
/// Bytes received from the network are stored as-is; whether they form a
/// usable triple is decided by [`is_valid`](Self::is_valid), not at
/// construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LetterTriple([u8; LETTER_COUNT]);

impl LetterTriple {
    /// Wrap three raw bytes.
    pub const fn new(bytes: [u8; LETTER_COUNT]) -> Self {
        Self(bytes)
    }

    /// Copy a triple out of `data`, which must be exactly three bytes long.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; LETTER_COUNT] = data.try_into().map_err(|_| FrameError::Length {
            expected: LETTER_COUNT,
            actual: data.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Draw three lowercase letters uniformly from `a`-`z`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(std::array::from_fn(|_| rng.random_range(b'a'..=b'z')))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; LETTER_COUNT] {
        &self.0
    }

    /// The same bytes in reverse order.
    pub fn reversed(&self) -> Self {
        let [a, b, c] = self.0;
        Self([c, b, a])
    }

    /// True when all three bytes are ASCII letters and none is a vowel.
    pub fn is_valid(&self) -> bool {
        is_valid_letters(&self.0)
    }

    /// Response values (`code point + 41`) in received order, or `None` when
    /// the triple is not valid.
    pub fn values(&self) -> Option<[u16; LETTER_COUNT]> {
        if !self.is_valid() {
            return None;
        }
        Some(self.0.map(|letter| u16::from(letter) + VALUE_OFFSET))
    }
}

/// Validate a request payload: exactly three ASCII letters, no vowels,
/// compared case-insensitively.
pub fn is_valid_letters(data: &[u8]) -> bool {
    data.len() == LETTER_COUNT
        && data.iter().all(|byte| {
            byte.is_ascii_alphabetic() && !VOWELS.contains(&byte.to_ascii_lowercase())
        })
}

impl From<[u8; LETTER_COUNT]> for LetterTriple {
    fn from(bytes: [u8; LETTER_COUNT]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for LetterTriple {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for LetterTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl std::fmt::Debug for LetterTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LetterTriple(b\"{}\")", self.0.escape_ascii())
    }
}
