use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The base of a digit of an ID.
pub const BASE: u8 = 16;
/// The number of digits in an ID.
pub const DIGITS: usize = 40;

const BYTES: usize = DIGITS / 2;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IdParseError {
    #[error("identifier must be 40 hex digits, got {0}")]
    Length(usize),
    #[error("identifier is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A node or object identifier.
///
/// Stored as 20 bytes, two base-16 digits per byte, most significant digit first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; BYTES]);

impl Id {
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Maps a key into the identifier space (leading 160 bits of SHA-256).
    pub fn hash(key: &str) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; BYTES];
        bytes.copy_from_slice(&digest[..BYTES]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BYTES] {
        &self.0
    }

    /// Returns digit `i` (0 is the most significant).
    pub fn digit(&self, i: usize) -> u8 {
        let byte = self.0[i / 2];
        if i % 2 == 0 { byte >> 4 } else { byte & 0x0f }
    }

    /// Number of leading digits `self` and `other` have in common.
    pub fn shared_prefix_length(&self, other: &Id) -> usize {
        (0..DIGITS)
            .find(|&i| self.digit(i) != other.digit(i))
            .unwrap_or(DIGITS)
    }

    /// Whether `first` is a strictly better root for `self` than `second`.
    ///
    /// A longer shared prefix with `self` wins outright. On equal prefixes the
    /// first digit where the candidates differ decides: the candidate whose digit
    /// is reached first counting upward (mod `BASE`) from `self`'s digit wins.
    /// Exactly one direction holds for distinct candidates, neither for equal ones.
    pub fn better_choice(&self, first: &Id, second: &Id) -> bool {
        let first_prefix = self.shared_prefix_length(first);
        let second_prefix = self.shared_prefix_length(second);
        if first_prefix != second_prefix {
            return first_prefix > second_prefix;
        }

        for i in first_prefix..DIGITS {
            let first_distance = self.digit_distance(i, first);
            let second_distance = self.digit_distance(i, second);
            if first_distance != second_distance {
                return first_distance < second_distance;
            }
        }

        false
    }

    fn digit_distance(&self, i: usize, other: &Id) -> u8 {
        (other.digit(i) + BASE - self.digit(i)) % BASE
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGITS {
            return Err(IdParseError::Length(s.len()));
        }
        let mut bytes = [0u8; BYTES];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
