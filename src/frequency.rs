//! Token frequencies.
//!
//! Frequencies are read from vocabulary files as written by word2vec's
//! `-save-vocab` option: one `<token> <count>` pair per line.

use std::io::BufRead;

use fnv::FnvHashMap;

use crate::error::{Error, Result};
use crate::util::{fields, read_line};
use crate::vocab::Token;

/// Token frequency table.
///
/// The table preserves the order in which tokens were added. Its token
/// set does not have to match the vocabulary of the embeddings it is
/// attached to, lookups of absent tokens yield a count of zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frequencies {
    counts: FnvHashMap<Token, u64>,
    order: Vec<Token>,
}

impl Frequencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a frequency vocabulary file.
    pub fn read(reader: &mut dyn BufRead) -> Result<Self> {
        let mut freqs = Frequencies::new();
        let mut line = Vec::new();
        let mut line_idx = 0;

        while read_line(reader, &mut line)? != 0 {
            line_idx += 1;

            let parts: Vec<&[u8]> = fields(&line).collect();
            match parts.as_slice() {
                [] => continue,
                [token, count] => {
                    let count = std::str::from_utf8(count)
                        .ok()
                        .and_then(|c| c.parse().ok())
                        .ok_or_else(|| {
                            Error::Parse(format!(
                                "Cannot parse count '{}' in line {} of vocabulary file",
                                String::from_utf8_lossy(count),
                                line_idx
                            ))
                        })?;
                    freqs.insert(token.to_vec(), count);
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "Expected '<token> <count>' in line {} of vocabulary file, got: '{}'",
                        line_idx,
                        String::from_utf8_lossy(&line)
                    )))
                }
            }
        }

        Ok(freqs)
    }

    /// Set the count of a token.
    ///
    /// A token that is already present keeps its position.
    pub fn insert(&mut self, token: Token, count: u64) {
        if let Some(old) = self.counts.get_mut(&token) {
            *old = count;
        } else {
            self.order.push(token.clone());
            self.counts.insert(token, count);
        }
    }

    /// Get the count of a token, zero if it is absent.
    pub fn get(&self, token: &[u8]) -> u64 {
        self.counts.get(token).cloned().unwrap_or(0)
    }

    pub fn contains(&self, token: &[u8]) -> bool {
        self.counts.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over tokens and counts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.order
            .iter()
            .map(move |token| (token.as_slice(), self.get(token)))
    }

    /// Get the `max` most frequent tokens, most frequent first.
    ///
    /// Tokens with the same count retain their insertion order.
    pub fn most_frequent(&self, max: Option<usize>) -> Vec<Token> {
        let mut tokens: Vec<&Token> = self.order.iter().collect();
        tokens.sort_by(|a, b| self.get(b).cmp(&self.get(a)));

        tokens
            .into_iter()
            .take(max.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

impl<T> std::iter::FromIterator<(T, u64)> for Frequencies
where
    T: Into<Token>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        let mut freqs = Frequencies::new();
        for (token, count) in iter {
            freqs.insert(token.into(), count);
        }
        freqs
    }
}
