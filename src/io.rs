//! Options and helpers shared by the format readers and writers.

use std::io::Write;

use crate::error::{display_token, Error, Result};
use crate::vocab::TokenEncoding;

/// Options for sequential reads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadOptions {
    /// Stop after reading this many distinct tokens.
    pub max_vocab: Option<usize>,

    /// Decoding policy for tokens.
    pub encoding: TokenEncoding,
}

impl ReadOptions {
    pub fn with_max_vocab(mut self, max_vocab: usize) -> Self {
        self.max_vocab = Some(max_vocab);
        self
    }

    pub fn with_encoding(mut self, encoding: TokenEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Check whether `n_read` tokens satisfy the vocabulary cap.
    pub(crate) fn is_full(&self, n_read: usize) -> bool {
        self.max_vocab.map_or(false, |max| n_read >= max)
    }
}

/// Write a token.
///
/// All supported formats delimit tokens by whitespace, so tokens that
/// are empty or contain whitespace cannot be written.
pub(crate) fn write_token(write: &mut dyn Write, token: &[u8]) -> Result<()> {
    if token.is_empty() || token.iter().any(u8::is_ascii_whitespace) {
        return Err(Error::InvalidToken(display_token(token)));
    }

    write
        .write_all(token)
        .map_err(|e| Error::io_error("Cannot write token", e))
}

#[cfg(test)]
mod tests {
    use super::{write_token, ReadOptions};
    use crate::error::Error;

    #[test]
    fn write_token_rejects_whitespace() {
        let mut out = Vec::new();
        write_token(&mut out, "日本語".as_bytes()).unwrap();
        assert_eq!(out, "日本語".as_bytes());

        assert!(matches!(
            write_token(&mut out, b"new york"),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(write_token(&mut out, b""), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn vocabulary_cap() {
        let options = ReadOptions::default();
        assert!(!options.is_full(usize::MAX));

        let options = options.with_max_vocab(2);
        assert!(!options.is_full(1));
        assert!(options.is_full(2));
    }
}
