//! Embedding vocabularies.

use std::collections::HashMap;
use std::ops::Range;

use fnv::FnvHashMap;

use crate::error::{display_token, Error, Result};

/// A vocabulary entry.
///
/// Tokens are byte strings, they are not required to be valid UTF-8
/// unless a text encoding is requested while loading.
pub type Token = Vec<u8>;

/// Decoding policy for tokens read from embedding files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenEncoding {
    /// Keep the raw bytes.
    Raw,

    /// Require valid UTF-8, invalid tokens are an error.
    Utf8,

    /// Replace invalid UTF-8 sequences by the replacement character.
    Utf8Lossy,
}

impl Default for TokenEncoding {
    fn default() -> Self {
        TokenEncoding::Raw
    }
}

impl TokenEncoding {
    /// Decode token bytes according to this policy.
    pub fn decode(self, bytes: &[u8]) -> Result<Token> {
        match self {
            TokenEncoding::Raw => Ok(bytes.to_owned()),
            TokenEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(|s| s.as_bytes().to_owned())
                .map_err(|e| {
                    Error::Encoding(format!(
                        "Token '{}' contains invalid UTF-8: {}",
                        display_token(bytes),
                        e
                    ))
                }),
            TokenEncoding::Utf8Lossy => Ok(String::from_utf8_lossy(bytes).into_owned().into_bytes()),
        }
    }
}

/// Bijection between tokens and the indices `0..n`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SimpleVocab {
    indices: FnvHashMap<Token, usize>,
    words: Vec<Token>,
}

impl SimpleVocab {
    /// Construct a new simple vocabulary.
    ///
    /// Words are assigned indices in the given order. Fails when there
    /// are duplicate words.
    pub fn new(words: impl Into<Vec<Token>>) -> Result<Self> {
        let words = words.into();
        let mut indices = FnvHashMap::default();
        indices.reserve(words.len());
        for (idx, word) in words.iter().enumerate() {
            if indices.insert(word.clone(), idx).is_some() {
                return Err(Error::duplicate_token(word));
            }
        }

        Ok(SimpleVocab { indices, words })
    }

    /// Construct a vocabulary from a token to index mapping.
    ///
    /// The indices must be a permutation of `0..mapping.len()`.
    pub fn from_mapping(mapping: HashMap<Token, usize>) -> Result<Self> {
        let len = mapping.len();
        let mut words: Vec<Option<Token>> = vec![None; len];
        for (word, &idx) in &mapping {
            let slot = words
                .get_mut(idx)
                .ok_or(Error::IndexOutOfBounds { index: idx, len })?;
            if slot.is_some() {
                return Err(Error::Parse(format!(
                    "Index {} is assigned to more than one token",
                    idx
                )));
            }
            *slot = Some(word.clone());
        }

        // All slots are filled: len distinct indices in 0..len.
        let words = words.into_iter().flatten().collect();
        let indices = mapping.into_iter().collect();

        Ok(SimpleVocab { indices, words })
    }

    /// Get the index of a token.
    pub fn idx(&self, word: &[u8]) -> Option<usize> {
        self.indices.get(word).cloned()
    }

    /// Check whether the token is in the vocabulary.
    pub fn contains(&self, word: &[u8]) -> bool {
        self.indices.contains_key(word)
    }

    /// Get the number of words in the vocabulary.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Get the words in the vocabulary, ordered by index.
    pub fn words(&self) -> &[Token] {
        &self.words
    }

    /// Get the token to index mapping.
    pub fn indices(&self) -> &FnvHashMap<Token, usize> {
        &self.indices
    }

    /// Move the word at `from` to `to`, shifting the words in between.
    ///
    /// Both indices must be in bounds.
    pub(crate) fn move_word(&mut self, from: usize, to: usize) {
        let word = self.words.remove(from);
        self.words.insert(to, word);
        self.reindex(from.min(to)..from.max(to) + 1);
    }

    /// Insert a word at `idx`, shifting the following words.
    pub(crate) fn insert(&mut self, idx: usize, word: Token) {
        self.words.insert(idx, word);
        self.reindex(idx..self.words.len());
    }

    /// Remove the word at `idx`, shifting the following words.
    pub(crate) fn remove(&mut self, idx: usize) -> Token {
        let word = self.words.remove(idx);
        self.indices.remove(&word);
        self.reindex(idx..self.words.len());
        word
    }

    /// Remove all words for which `keep` is `false`.
    pub(crate) fn retain(&mut self, keep: &[bool]) -> Vec<Token> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.words.len());
        for (word, &keep) in self.words.drain(..).zip(keep) {
            if keep {
                kept.push(word);
            } else {
                self.indices.remove(&word);
                removed.push(word);
            }
        }
        self.words = kept;
        self.reindex(0..self.words.len());

        removed
    }

    fn reindex(&mut self, range: Range<usize>) {
        let start = range.start;
        for (offset, word) in self.words[range].iter().enumerate() {
            match self.indices.get_mut(word.as_slice()) {
                Some(idx) => *idx = start + offset,
                None => {
                    self.indices.insert(word.clone(), start + offset);
                }
            }
        }
    }
}
