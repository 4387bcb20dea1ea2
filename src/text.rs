//! Readers and writers for text formats.
//!
//! This module provides two readers/writers:
//!
//! 1. `ReadText`/`WriteText`: word embeddings in text format. In this
//!    format, each line contains a word followed by its
//!    embedding. The word and the embedding vector components are
//!    separated by whitespace. This format is used by GloVe.
//! 2. `ReadTextDims`/`WriteTextDims`: this format is the same as (1),
//!    but the data is preceded by a line with the shape of the
//!    embedding matrix. This format is used by word2vec's text
//!    output.
//!
//! For example:
//!
//! ```
//! use std::io::Cursor;
//!
//! use word_embedding_loader::prelude::*;
//!
//! let mut reader = Cursor::new("2 2\nthe 0.1 0.2\n, 0.3 0.4\n");
//! let (table, warnings) = VocabTable::read_text_dims(&mut reader, ReadOptions::default())
//!     .unwrap();
//! assert!(warnings.is_empty());
//!
//! // Look up an embedding.
//! let embedding = table.embedding(b"the");
//! ```

use std::io::{BufRead, Write};

use itertools::Itertools;

use crate::error::{Error, LoadWarning, Result};
use crate::io::{write_token, ReadOptions};
use crate::numeric::{format_component, is_component, parse_component};
use crate::table::{TableBuilder, VocabFiller, VocabTable};
use crate::util::{fields, parse_shape, read_line, read_shape};
use crate::vocab::{SimpleVocab, Token, TokenEncoding};

/// Parse a `<token> <component>...` record.
///
/// The token is decoded with `encoding`. Records without components
/// are rejected.
pub fn parse_record(line: &[u8], encoding: TokenEncoding) -> Result<(Token, Vec<f32>)> {
    let mut parts = fields(line);
    let token = parts
        .next()
        .ok_or_else(|| Error::Parse(String::from("Spurious empty line")))?;
    let token = encoding.decode(token)?;

    let embedding = parse_components(parts)?;
    if embedding.is_empty() {
        return Err(Error::Parse(format!(
            "Parsing error in line '{}': no vector components",
            String::from_utf8_lossy(line)
        )));
    }

    Ok((token, embedding))
}

fn parse_components<'a>(parts: impl Iterator<Item = &'a [u8]>) -> Result<Vec<f32>> {
    parts.map(parse_component).collect()
}

/// Get the number of components if `line` is a valid feature line.
///
/// A feature line consists of a token and at least two components,
/// all components must be decimal literals.
pub fn feature_line_dims(line: &[u8]) -> Option<usize> {
    let parts: Vec<&[u8]> = fields(line).collect();
    if parts.len() <= 2 || !parts[1..].iter().all(|part| is_component(part)) {
        return None;
    }

    Some(parts.len() - 1)
}

/// Check whether the first two lines are in GloVe format.
pub fn check_valid_glove(line0: &[u8], _line1: &[u8]) -> bool {
    feature_line_dims(line0).is_some()
}

/// Check whether the first two lines are in word2vec text format.
///
/// The first line must be the shape header, the second line a feature
/// line with the dimensionality of the header.
pub fn check_valid_word2vec(line0: &[u8], line1: &[u8]) -> bool {
    match parse_shape(line0) {
        Some((_, dims)) => feature_line_dims(line1) == Some(dims),
        None => false,
    }
}

/// Method to construct a `VocabTable` from a text file.
///
/// This trait defines an extension to `VocabTable` to read the word
/// embeddings from a text stream. The text should contain one word
/// embedding per line in the following format:
///
/// *word0 component_1 component_2 ... component_n*
pub trait ReadText<R>
where
    Self: Sized,
    R: BufRead,
{
    /// Read the embeddings from the given buffered reader.
    ///
    /// Duplicate tokens are skipped and reported as warnings.
    fn read_text(reader: &mut R, options: ReadOptions) -> Result<(Self, Vec<LoadWarning>)>;

    /// Read the embeddings of the tokens in `vocab`.
    ///
    /// Token `i` of `vocab` is bound to row `i`. Records for other tokens
    /// are skipped. Fails if a token of `vocab` is not found.
    fn read_text_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)>;
}

impl<R> ReadText<R> for VocabTable
where
    R: BufRead,
{
    fn read_text(reader: &mut R, options: ReadOptions) -> Result<(Self, Vec<LoadWarning>)> {
        let mut builder = TableBuilder::new();
        read_records(reader, &mut builder, &options, 0, None)?;
        builder.finish()
    }

    fn read_text_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let mut filler = VocabFiller::new(vocab, None);
        fill_records(reader, &mut filler, encoding, 0)?;
        filler.finish()
    }
}

/// Method to construct a `VocabTable` from a text file with dimensions.
///
/// This trait defines an extension to `VocabTable` to read the word
/// embeddings from a text stream. The text must contain as the first
/// line the shape of the embedding matrix:
///
/// *vocab_size n_components*
///
/// The remainder of the stream should contain one word embedding per
/// line in the following format:
///
/// *word0 component_1 component_2 ... component_n*
pub trait ReadTextDims<R>
where
    Self: Sized,
    R: BufRead,
{
    /// Read the embeddings from the given buffered reader.
    ///
    /// A stream that ends before `vocab_size` records is not an error,
    /// the embeddings that were read are returned with a warning.
    fn read_text_dims(reader: &mut R, options: ReadOptions) -> Result<(Self, Vec<LoadWarning>)>;

    /// Read the embeddings of the tokens in `vocab`.
    ///
    /// See [`ReadText::read_text_with_vocab`].
    fn read_text_dims_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)>;
}

impl<R> ReadTextDims<R> for VocabTable
where
    R: BufRead,
{
    fn read_text_dims(reader: &mut R, options: ReadOptions) -> Result<(Self, Vec<LoadWarning>)> {
        let (n_words, dims) = read_shape(reader)?;
        let n_words = options.max_vocab.map_or(n_words, |max| max.min(n_words));

        let mut builder = TableBuilder::with_shape(n_words, dims);
        read_records(reader, &mut builder, &options, 1, Some(n_words))?;
        builder.finish()
    }

    fn read_text_dims_with_vocab(
        reader: &mut R,
        vocab: SimpleVocab,
        encoding: TokenEncoding,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let (_, dims) = read_shape(reader)?;

        let mut filler = VocabFiller::new(vocab, Some(dims));
        fill_records(reader, &mut filler, encoding, 1)?;
        filler.finish()
    }
}

fn read_records(
    reader: &mut dyn BufRead,
    builder: &mut TableBuilder,
    options: &ReadOptions,
    mut line_idx: usize,
    n_words: Option<usize>,
) -> Result<()> {
    let mut line = Vec::new();

    while !options.is_full(builder.len()) && n_words.map_or(true, |n| builder.len() < n) {
        if read_line(reader, &mut line)? == 0 {
            break;
        }
        line_idx += 1;

        let (token, embedding) = parse_record(&line, options.encoding)
            .map_err(|e| at_line(e, line_idx))?;
        builder.push(token, &embedding, line_idx)?;
    }

    Ok(())
}

fn fill_records(
    reader: &mut dyn BufRead,
    filler: &mut VocabFiller,
    encoding: TokenEncoding,
    mut line_idx: usize,
) -> Result<()> {
    let mut line = Vec::new();

    while read_line(reader, &mut line)? != 0 {
        line_idx += 1;

        let mut parts = fields(&line);
        let token = match parts.next() {
            Some(token) => encoding.decode(token)?,
            None => return Err(at_line(Error::Parse(String::from("Spurious empty line")), line_idx)),
        };

        if let Some(idx) = filler.idx(&token) {
            let embedding = parse_components(parts).map_err(|e| at_line(e, line_idx))?;
            filler.fill(idx, &embedding, line_idx)?;
        }
    }

    Ok(())
}

fn at_line(err: Error, line_idx: usize) -> Error {
    match err {
        Error::Parse(msg) => Error::Parse(format!("{} (line {})", msg, line_idx)),
        err => err,
    }
}

/// Method to write a `VocabTable` to a text file.
///
/// This trait defines an extension to `VocabTable` to write the word
/// embeddings as text. The text will contain one word embedding per
/// line in the following format:
///
/// *word0 component_1 component_2 ... component_n*
pub trait WriteText<W>
where
    W: Write,
{
    /// Write the embeddings to the given writer.
    fn write_text(&self, writer: &mut W) -> Result<()>;
}

impl<W> WriteText<W> for VocabTable
where
    W: Write,
{
    fn write_text(&self, write: &mut W) -> Result<()> {
        for (word, embedding) in self.iter() {
            write_token(write, word)?;

            let embed_str = embedding.iter().map(|&v| format_component(v)).join(" ");
            writeln!(write, " {}", embed_str)
                .map_err(|e| Error::io_error("Cannot write word embedding", e))?;
        }

        Ok(())
    }
}

/// Method to write a `VocabTable` to a text file with dimensions.
///
/// The output is the same as that of [`WriteText`], preceded by a
/// line with the shape of the embedding matrix.
pub trait WriteTextDims<W>
where
    W: Write,
{
    /// Write the embeddings to the given writer.
    fn write_text_dims(&self, writer: &mut W) -> Result<()>;
}

impl<W> WriteTextDims<W> for VocabTable
where
    W: Write,
{
    fn write_text_dims(&self, write: &mut W) -> Result<()> {
        writeln!(write, "{} {}", self.len(), self.dims())
            .map_err(|e| Error::io_error("Cannot write word embedding matrix shape", e))?;
        self.write_text(write)
    }
}
