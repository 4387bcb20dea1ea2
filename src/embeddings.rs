//! Loading and saving embeddings in any supported format.
//!
//! [`EmbeddingStore`] selects the codec for a format (given explicitly
//! or detected from the data), optionally restricts the vocabulary, and
//! remembers how the embeddings were loaded so that they can be written
//! back in the same format.
//!
//! ```
//! use std::io::Cursor;
//!
//! use word_embedding_loader::prelude::*;
//!
//! let mut reader = Cursor::new("2 2\nthe 0.1 0.2\n, 0.3 0.4\n");
//! let store = EmbeddingStore::load(&mut reader, LoadOptions::default()).unwrap();
//! assert_eq!(store.load_condition().unwrap().format, Format::Word2VecText);
//!
//! let mut output = Vec::new();
//! store.save_with_load_condition(&mut output).unwrap();
//! assert_eq!(output, b"2 2\nthe 0.1 0.2\n, 0.3 0.4\n");
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

use crate::detect::classify;
use crate::error::{Error, LoadWarning, Result};
use crate::format::Format;
use crate::frequency::Frequencies;
use crate::io::ReadOptions;
use crate::table::VocabTable;
use crate::text::{ReadText, ReadTextDims, WriteText, WriteTextDims};
use crate::vocab::{SimpleVocab, Token, TokenEncoding};
use crate::word2vec::{ReadWord2Vec, WriteWord2Vec};

/// Restriction of the vocabulary to load.
#[derive(Clone, Debug, PartialEq)]
pub enum VocabFilter {
    /// Load exactly these tokens, token `i` is bound to row `i`.
    Tokens(Vec<Token>),

    /// Load the tokens of a frequency vocabulary, most frequent first.
    ///
    /// The frequencies are attached to the loaded table.
    Frequencies(Frequencies),
}

impl VocabFilter {
    /// Read a frequency vocabulary file.
    pub fn read_frequencies(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            Error::io_error(format!("Cannot open vocabulary file {}", path.display()), e)
        })?;
        Ok(VocabFilter::Frequencies(Frequencies::read(&mut BufReader::new(f))?))
    }

    fn into_vocab(self, max_vocab: Option<usize>) -> Result<(SimpleVocab, Option<Frequencies>)> {
        match self {
            VocabFilter::Tokens(mut tokens) => {
                if let Some(max_vocab) = max_vocab {
                    tokens.truncate(max_vocab);
                }
                Ok((SimpleVocab::new(tokens)?, None))
            }
            VocabFilter::Frequencies(freqs) => {
                let vocab = SimpleVocab::new(freqs.most_frequent(max_vocab))?;
                Ok((vocab, Some(freqs)))
            }
        }
    }
}

/// Options for [`EmbeddingStore::load`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadOptions {
    /// Format of the data, detected from the data if absent.
    pub format: Option<Format>,

    /// Decoding policy for tokens.
    pub encoding: TokenEncoding,

    /// Restrict the vocabulary to load.
    pub vocab: Option<VocabFilter>,

    /// Maximum number of tokens to load.
    ///
    /// Without a vocabulary filter, reading stops once the limit is
    /// reached. With a filter, the filter's vocabulary is truncated.
    pub max_vocab: Option<usize>,
}

impl LoadOptions {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_encoding(mut self, encoding: TokenEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_vocab(mut self, vocab: VocabFilter) -> Self {
        self.vocab = Some(vocab);
        self
    }

    pub fn with_max_vocab(mut self, max_vocab: usize) -> Self {
        self.max_vocab = Some(max_vocab);
        self
    }
}

/// The format and encoding embeddings were loaded with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadCondition {
    pub format: Format,
    pub encoding: TokenEncoding,
}

/// Embeddings with their load condition.
#[derive(Clone, Debug)]
pub struct EmbeddingStore {
    table: VocabTable,
    load_condition: Option<LoadCondition>,
    warnings: Vec<LoadWarning>,
}

impl EmbeddingStore {
    /// Wrap a table that was not loaded from a file.
    pub fn new(table: VocabTable) -> Self {
        EmbeddingStore {
            table,
            load_condition: None,
            warnings: Vec::new(),
        }
    }

    /// Load embeddings from a reader.
    ///
    /// If no format is set in `options`, the format is detected from the
    /// first two lines of the data.
    pub fn load<R>(reader: &mut R, options: LoadOptions) -> Result<Self>
    where
        R: BufRead + Seek,
    {
        let format = match options.format {
            Some(format) => format,
            None => classify(reader)?,
        };
        let encoding = options.encoding;

        tracing::debug!("Loading embeddings in {} format", format);

        let (table, warnings) = match options.vocab {
            Some(filter) => {
                let (vocab, freqs) = filter.into_vocab(options.max_vocab)?;
                let (mut table, warnings) = match format {
                    Format::Glove => VocabTable::read_text_with_vocab(reader, vocab, encoding)?,
                    Format::Word2VecText => {
                        VocabTable::read_text_dims_with_vocab(reader, vocab, encoding)?
                    }
                    Format::Word2VecBinary => {
                        VocabTable::read_word2vec_binary_with_vocab(reader, vocab, encoding)?
                    }
                };
                table.set_frequencies(freqs);
                (table, warnings)
            }
            None => {
                let read_options = ReadOptions {
                    max_vocab: options.max_vocab,
                    encoding,
                };
                match format {
                    Format::Glove => VocabTable::read_text(reader, read_options)?,
                    Format::Word2VecText => VocabTable::read_text_dims(reader, read_options)?,
                    Format::Word2VecBinary => {
                        VocabTable::read_word2vec_binary(reader, read_options)?
                    }
                }
            }
        };

        tracing::debug!(
            "Loaded {} embeddings of dimensionality {}",
            table.len(),
            table.dims()
        );

        Ok(EmbeddingStore {
            table,
            load_condition: Some(LoadCondition { format, encoding }),
            warnings,
        })
    }

    /// Load embeddings from a file.
    pub fn load_path(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            Error::io_error(format!("Cannot open embedding file {}", path.display()), e)
        })?;
        Self::load(&mut BufReader::new(f), options)
    }

    /// Write the embeddings in `format`.
    ///
    /// Embeddings are written in index order, or by descending frequency
    /// if the table has frequencies attached.
    pub fn save<W>(&self, writer: &mut W, format: Format) -> Result<()>
    where
        W: Write,
    {
        tracing::debug!(
            "Saving {} embeddings in {} format",
            self.table.len(),
            format
        );

        match format {
            Format::Glove => self.table.write_text(writer),
            Format::Word2VecText => self.table.write_text_dims(writer),
            Format::Word2VecBinary => self.table.write_word2vec_binary(writer),
        }
    }

    /// Write the embeddings in the format they were loaded from.
    pub fn save_with_load_condition<W>(&self, writer: &mut W) -> Result<()>
    where
        W: Write,
    {
        let condition = self.load_condition.ok_or(Error::NoLoadCondition)?;
        self.save(writer, condition.format)
    }

    /// Write the embeddings to a file.
    pub fn save_path(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| {
            Error::io_error(format!("Cannot create embedding file {}", path.display()), e)
        })?;
        let mut writer = BufWriter::new(f);
        self.save(&mut writer, format)?;
        writer
            .flush()
            .map_err(|e| Error::io_error("Cannot flush embedding file", e))
    }

    pub fn table(&self) -> &VocabTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut VocabTable {
        &mut self.table
    }

    pub fn into_table(self) -> VocabTable {
        self.table
    }

    /// Get the format and encoding used to load the embeddings.
    pub fn load_condition(&self) -> Option<LoadCondition> {
        self.load_condition
    }

    /// Get the warnings of the load.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }
}

impl From<VocabTable> for EmbeddingStore {
    fn from(table: VocabTable) -> Self {
        EmbeddingStore::new(table)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Cursor, Write};

    use approx::assert_abs_diff_eq;
    use maplit::hashmap;
    use ndarray::{arr1, arr2};
    use tempfile::NamedTempFile;

    use super::{EmbeddingStore, LoadCondition, LoadOptions, VocabFilter};
    use crate::error::{Error, LoadWarning};
    use crate::format::Format;
    use crate::frequency::Frequencies;
    use crate::table::VocabTable;
    use crate::vocab::TokenEncoding;

    fn load(data: impl AsRef<[u8]>, options: LoadOptions) -> EmbeddingStore {
        EmbeddingStore::load(&mut Cursor::new(data.as_ref().to_vec()), options).unwrap()
    }

    fn check_scenario(store: &EmbeddingStore) {
        let table = store.table();
        assert_eq!(
            table
                .vocab()
                .indices()
                .clone()
                .into_iter()
                .collect::<HashMap<_, _>>(),
            hashmap! { b"the".to_vec() => 0, b",".to_vec() => 1 }
        );
        assert_abs_diff_eq!(
            table.matrix(),
            arr2(&[[0.1f32, 0.2], [0.3, 0.4]]),
            epsilon = 1e-6
        );
    }

    #[test]
    fn load_glove() {
        let store = load("the 0.1 0.2\n, 0.3 0.4\n", LoadOptions::default());
        check_scenario(&store);
        assert!(store.warnings().is_empty());
        assert_eq!(
            store.load_condition(),
            Some(LoadCondition {
                format: Format::Glove,
                encoding: TokenEncoding::Raw
            })
        );
    }

    #[test]
    fn load_word2vec_text() {
        let store = load("2 2\nthe 0.1 0.2\n, 0.3 0.4\n", LoadOptions::default());
        check_scenario(&store);
        assert_eq!(
            store.load_condition().unwrap().format,
            Format::Word2VecText
        );
    }

    #[test]
    fn load_truncated_word2vec_text() {
        let store = load("2 2\nthe 0.1 0.2\n", LoadOptions::default());
        assert_eq!(store.table().len(), 1);
        assert_eq!(store.table().vocab().idx(b"the"), Some(0));
        assert_eq!(
            store.warnings(),
            &[LoadWarning::TruncatedInput {
                expected: 2,
                read: 1
            }]
        );
    }

    #[test]
    fn load_word2vec_binary() {
        let mut data = b"2 2\nthe ".to_vec();
        for v in &[0.1f32, 0.2] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b"\n, ");
        for v in &[0.3f32, 0.4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.push(b'\n');

        let store = load(&data, LoadOptions::default());
        check_scenario(&store);
        assert_eq!(
            store.load_condition().unwrap().format,
            Format::Word2VecBinary
        );

        let mut output = Vec::new();
        store.save_with_load_condition(&mut output).unwrap();
        assert_eq!(output, data);
    }

    #[test]
    fn load_unrecognized() {
        assert!(matches!(
            EmbeddingStore::load(&mut Cursor::new("the\n"), LoadOptions::default()),
            Err(Error::UnrecognizedFormat)
        ));
    }

    #[test]
    fn explicit_format_skips_detection() {
        // Would be detected as GloVe.
        let result = EmbeddingStore::load(
            &mut Cursor::new("the 0.1 0.2\n"),
            LoadOptions::default().with_format(Format::Word2VecText),
        );
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn max_vocab_stops_reading() {
        let store = load(
            "the 0.1 0.2\n, 0.3 0.4\n. garbage\n",
            LoadOptions::default().with_max_vocab(2),
        );
        assert_eq!(store.table().len(), 2);
    }

    #[test]
    fn load_with_tokens() {
        let store = load(
            "the 0.1 0.2\n, 0.3 0.4\n. 0.5 0.6\n",
            LoadOptions::default().with_vocab(VocabFilter::Tokens(vec![
                b".".to_vec(),
                b"the".to_vec(),
            ])),
        );
        let table = store.table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.vocab().idx(b"."), Some(0));
        assert_eq!(table.embedding(b"the").unwrap(), arr1(&[0.1, 0.2]));
        assert!(table.frequencies().is_none());
    }

    #[test]
    fn load_with_missing_tokens() {
        let result = EmbeddingStore::load(
            &mut Cursor::new("the 0.1 0.2\n"),
            LoadOptions::default().with_vocab(VocabFilter::Tokens(vec![b"of".to_vec()])),
        );
        assert!(matches!(result, Err(Error::IncompleteVocab { .. })));
    }

    #[test]
    fn load_with_frequencies() {
        let freqs: Frequencies = vec![
            (b"the".to_vec(), 10),
            (b".".to_vec(), 20),
            (b",".to_vec(), 5),
        ]
        .into_iter()
        .collect();

        let store = load(
            "the 0.1 0.2\n, 0.3 0.4\n. 0.5 0.6\n",
            LoadOptions::default()
                .with_vocab(VocabFilter::Frequencies(freqs))
                .with_max_vocab(2),
        );
        let table = store.table();
        assert_eq!(table.vocab().words(), &[b".".to_vec(), b"the".to_vec()]);
        assert_eq!(table.frequencies().unwrap().get(b"."), 20);

        let mut output = Vec::new();
        store.save(&mut output, Format::Glove).unwrap();
        assert_eq!(output, b". 0.5 0.6\nthe 0.1 0.2\n");
    }

    #[test]
    fn save_without_load_condition() {
        let table = VocabTable::new(vec![b"the".to_vec()], arr2(&[[0.1, 0.2]])).unwrap();
        let store = EmbeddingStore::from(table);
        assert!(matches!(
            store.save_with_load_condition(&mut Vec::new()),
            Err(Error::NoLoadCondition)
        ));

        let mut output = Vec::new();
        store.save(&mut output, Format::Word2VecText).unwrap();
        assert_eq!(output, b"1 2\nthe 0.1 0.2\n");
    }

    #[test]
    fn insert_and_remove_through_store() {
        let mut store = load("the 0.1 0.2\n, 0.3 0.4\n. 0.5 0.6\n", LoadOptions::default());

        assert_eq!(store.table_mut().remove(b",").unwrap(), 1);
        assert_eq!(store.table().vocab().idx(b"."), Some(1));
        assert_eq!(store.table().len(), 2);

        store
            .table_mut()
            .insert(b"<unk>".to_vec(), 1, arr1(&[0.0, 0.0]).view())
            .unwrap();
        let table = store.into_table();
        assert_eq!(table.vocab().idx(b"<unk>"), Some(1));
        assert_eq!(table.vocab().idx(b"."), Some(2));
        assert_eq!(table.matrix().nrows(), 3);
    }

    #[test]
    fn path_roundtrip() {
        let mut input = NamedTempFile::new().unwrap();
        input.write_all(b"2 2\nthe 0.1 0.2\n, 0.3 0.4\n").unwrap();
        input.flush().unwrap();

        let store = EmbeddingStore::load_path(input.path(), LoadOptions::default()).unwrap();
        check_scenario(&store);

        let output = NamedTempFile::new().unwrap();
        store
            .save_path(output.path(), Format::Word2VecBinary)
            .unwrap();
        let reloaded = EmbeddingStore::load_path(output.path(), LoadOptions::default()).unwrap();
        assert_eq!(
            reloaded.load_condition().unwrap().format,
            Format::Word2VecBinary
        );
        assert_eq!(reloaded.table(), store.table());
    }

    #[test]
    fn vocab_filter_from_file() {
        let mut vocab = NamedTempFile::new().unwrap();
        vocab.write_all(b"the 5\n, 3\n").unwrap();
        vocab.flush().unwrap();

        let filter = VocabFilter::read_frequencies(vocab.path()).unwrap();
        let store = load(
            "the 0.1 0.2\n, 0.3 0.4\n. 0.5 0.6\n",
            LoadOptions::default().with_vocab(filter),
        );
        check_scenario(&store);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EmbeddingStore::load_path(dir.path().join("missing.txt"), LoadOptions::default()),
            Err(Error::Io { .. })
        ));
    }
}
