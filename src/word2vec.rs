//! Reader and writer for the word2vec binary format.
//!
//! The format starts with an ASCII `<count> <dims>` header line. Each
//! record that follows is a token, a space, `dims` little-endian `f32`
//! components, and a newline.
//!
//! ```
//! use std::io::Cursor;
//!
//! use word_embedding_loader::prelude::*;
//!
//! let mut data = b"1 2\nthe ".to_vec();
//! data.extend_from_slice(&0.5f32.to_le_bytes());
//! data.extend_from_slice(&(-1f32).to_le_bytes());
//! data.push(b'\n');
//!
//! let (table, _) = VocabTable::read_word2vec_binary(&mut Cursor::new(data), ReadOptions::default())
//!     .unwrap();
//! assert_eq!(table.embedding(b"the").unwrap().to_vec(), vec![0.5, -1.0]);
//! ```

use std::io::{BufRead, ErrorKind, Write};

use crate::error::{Error, LoadWarning, Result};
use crate::io::{write_token, ReadOptions};
use crate::numeric::{component_buffer, read_components, write_components};
use crate::table::{TableBuilder, VocabFiller, VocabTable};
use crate::util::{parse_shape, read_shape, read_string, trim_ascii_whitespace};
use crate::vocab::{SimpleVocab, Token, TokenEncoding};

/// Check whether the first two lines are in word2vec binary format.
///
/// Only the shape header is checked, the binary payload cannot be
/// validated line-wise. Format detection relies on the text predicates
/// being applied first.
pub fn check_valid(line0: &[u8], _line1: &[u8]) -> bool {
    parse_shape(line0).is_some()
}

/// Method to construct a `VocabTable` from a word2vec binary file.
///
/// This trait defines an extension to `VocabTable` to read the word
/// embeddings from a file in word2vec binary format.
pub trait ReadWord2Vec<R>
where
    Self: Sized,
    R: BufRead,
{
    /// Read the embeddings from the given buffered reader.
    ///
    /// A stream that ends before the number of records in the header is
    /// not an error, the complete records are returned with a warning.
    fn read_word2vec_binary(reader: &mut R, options: ReadOptions)
        -> Result<(Self, Vec<LoadWarning>)>;

    /// Read the embeddings of the tokens in `vocab`.
    ///
    /// Token `i` of `vocab` is bound to row `i`. Records for other tokens
    /// are skipped. Fails if a token of `vocab` is not found.
    fn read_word2vec_binary_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)>;
}

impl<R> ReadWord2Vec<R> for VocabTable
where
    R: BufRead,
{
    fn read_word2vec_binary(
        reader: &mut R,
        options: ReadOptions,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let (n_words, dims) = read_shape(reader)?;
        let n_words = options.max_vocab.map_or(n_words, |max| max.min(n_words));

        let mut builder = TableBuilder::with_shape(n_words, dims);
        let mut embedding = component_buffer(dims)?;
        let mut record_idx = 1;
        while builder.len() < n_words {
            let token = match read_record(reader, options.encoding, &mut embedding)? {
                Some(token) => token,
                None => break,
            };
            record_idx += 1;

            builder.push(token, &embedding, record_idx)?;
        }

        builder.finish()
    }

    fn read_word2vec_binary_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let (_, dims) = read_shape(reader)?;

        let mut filler = VocabFiller::new(vocab, Some(dims));
        let mut embedding = component_buffer(dims)?;
        let mut record_idx = 1;
        while let Some(token) = read_record(reader, encoding, &mut embedding)? {
            record_idx += 1;

            if let Some(idx) = filler.idx(&token) {
                filler.fill(idx, &embedding, record_idx)?;
            }
        }

        filler.finish()
    }
}

/// Read a record into `embedding`, returning its token.
///
/// Returns `None` if the stream ends before the record is complete.
fn read_record(
    reader: &mut dyn BufRead,
    encoding: TokenEncoding,
    embedding: &mut [f32],
) -> Result<Option<Token>> {
    let (word, found) = read_string(reader, b' ')?;

    // The separator of the previous record is read as part of the token.
    let word = trim_ascii_whitespace(&word);
    if !found {
        if !word.is_empty() {
            tracing::debug!("Discarding incomplete record at end of file");
        }
        return Ok(None);
    }

    if word.is_empty() {
        return Err(Error::Parse(String::from("Empty token in word2vec binary file")));
    }
    let token = encoding.decode(word)?;

    match read_components(reader, embedding) {
        Ok(()) => Ok(Some(token)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            tracing::debug!("Discarding incomplete record at end of file");
            Ok(None)
        }
        Err(e) => Err(Error::io_error("Cannot read word embedding", e)),
    }
}

/// Method to write a `VocabTable` to a word2vec binary file.
///
/// This trait defines an extension to `VocabTable` to write the word
/// embeddings to a file in word2vec binary format.
pub trait WriteWord2Vec<W>
where
    W: Write,
{
    /// Write the embeddings to the given writer.
    fn write_word2vec_binary(&self, w: &mut W) -> Result<()>;
}

impl<W> WriteWord2Vec<W> for VocabTable
where
    W: Write,
{
    fn write_word2vec_binary(&self, w: &mut W) -> Result<()> {
        writeln!(w, "{} {}", self.len(), self.dims())
            .map_err(|e| Error::io_error("Cannot write word embedding matrix shape", e))?;

        for (word, embedding) in self.iter() {
            write_token(w, word)?;
            w.write_all(b" ")
                .map_err(|e| Error::io_error("Cannot write token separator", e))?;

            write_components(w, embedding.iter())?;

            w.write_all(&[0x0a])
                .map_err(|e| Error::io_error("Cannot write embedding separator", e))?;
        }

        Ok(())
    }
}
