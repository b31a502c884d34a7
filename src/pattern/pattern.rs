// Fri Oct 16 2026 - Alex

use crate::pattern::PatternError;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

pub const WILDCARD: i16 = -1;

#[derive(Debug, Clone)]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<bool>,
}

impl Pattern {
    /// Parses IDA-style signature text: two-digit hex bytes and `?` / `??`
    /// wildcards, whitespace optional.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();

        let mut chars = text.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            if c.is_whitespace() {
                continue;
            }

            if c == '?' {
                bytes.push(0);
                mask.push(false);
                if matches!(chars.peek(), Some((_, '?'))) {
                    chars.next();
                }
            } else if c.is_ascii_hexdigit() {
                let mut hex = String::with_capacity(2);
                hex.push(c);
                if let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_hexdigit() {
                        hex.push(next);
                        chars.next();
                    }
                }
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|e| PatternError::InvalidPattern(format!("'{}' at {}: {}", hex, position, e)))?;
                bytes.push(byte);
                mask.push(true);
            } else {
                return Err(PatternError::InvalidPattern(format!(
                    "unexpected '{}' at position {}",
                    c, position
                )));
            }
        }

        if bytes.is_empty() {
            return Err(PatternError::PatternTooShort(0));
        }

        Ok(Self { bytes, mask })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            mask: vec![true; bytes.len()],
        }
    }

    /// Builds a pattern from signed tokens where `WILDCARD` (-1) matches any
    /// byte and 0..=255 are literals.
    pub fn from_tokens(tokens: &[i16]) -> Result<Self, PatternError> {
        let mut bytes = Vec::with_capacity(tokens.len());
        let mut mask = Vec::with_capacity(tokens.len());

        for &token in tokens {
            match token {
                WILDCARD => {
                    bytes.push(0);
                    mask.push(false);
                }
                0..=255 => {
                    bytes.push(token as u8);
                    mask.push(true);
                }
                other => {
                    return Err(PatternError::InvalidPattern(format!("token {} out of range", other)))
                }
            }
        }

        Ok(Self { bytes, mask })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn tokens(&self) -> Vec<i16> {
        self.bytes
            .iter()
            .zip(self.mask.iter())
            .map(|(&b, &significant)| if significant { b as i16 } else { WILDCARD })
            .collect()
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.bytes.len() {
            return false;
        }

        self.bytes.iter()
            .zip(self.mask.iter())
            .zip(data.iter())
            .all(|((pattern_byte, &significant), &data_byte)| {
                !significant || *pattern_byte == data_byte
            })
    }

    /// Every start offset in `data` where the full pattern fits and matches,
    /// left to right. Lazy, so callers that only need the n-th hit stop early.
    pub fn find_iter<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        let last = if self.bytes.is_empty() || data.len() < self.bytes.len() {
            None
        } else {
            Some(data.len() - self.bytes.len())
        };

        let anchor = self.mask.iter().position(|&m| m);

        last.into_iter()
            .flat_map(|last| 0..=last)
            .filter(move |&i| match anchor {
                Some(a) => data[i + a] == self.bytes[a] && self.matches(&data[i..]),
                None => true,
            })
    }

    pub fn find_in(&self, data: &[u8]) -> Option<usize> {
        self.find_iter(data).next()
    }

    pub fn significant_byte_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn to_hex_string(&self) -> String {
        self.bytes.iter()
            .zip(self.mask.iter())
            .map(|(b, &m)| {
                if m {
                    format!("{:02X}", b)
                } else {
                    "??".to_string()
                }
            })
            .join(" ")
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.mask == other.mask
    }
}

impl Eq for Pattern {}
