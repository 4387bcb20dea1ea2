//! Vocabulary and embedding matrix.
//!
//! A [`VocabTable`] binds every token of a [`SimpleVocab`] to the row of
//! the embedding matrix with the same index. All mutations keep the
//! vocabulary a bijection onto `0..n` and the matrix at `n` rows.
//!
//! Tables are not synchronized. Callers that share a table between
//! threads must serialize mutations themselves.

use std::collections::HashMap;

use ndarray::{concatenate, s, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{display_token, Error, LoadWarning, Result};
use crate::frequency::Frequencies;
use crate::vocab::{SimpleVocab, Token};

/// Vocabulary with a row-aligned embedding matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct VocabTable {
    vocab: SimpleVocab,
    matrix: Array2<f32>,
    freqs: Option<Frequencies>,
}

impl VocabTable {
    /// Construct a table from words and a matrix.
    ///
    /// Word `i` is bound to row `i`. Fails if the words are not unique or
    /// if the number of words differs from the number of rows.
    pub fn new(words: impl Into<Vec<Token>>, matrix: Array2<f32>) -> Result<Self> {
        Self::from_vocab(SimpleVocab::new(words)?, matrix)
    }

    /// Construct a table from a token to row index mapping.
    ///
    /// The indices must be a permutation of `0..matrix.nrows()`.
    pub fn from_mapping(mapping: HashMap<Token, usize>, matrix: Array2<f32>) -> Result<Self> {
        if mapping.len() != matrix.nrows() {
            return Err(Error::VocabSizeMismatch {
                vocab: mapping.len(),
                rows: matrix.nrows(),
            });
        }

        Self::from_vocab(SimpleVocab::from_mapping(mapping)?, matrix)
    }

    /// Construct a table from a vocabulary and a matrix.
    pub fn from_vocab(vocab: SimpleVocab, matrix: Array2<f32>) -> Result<Self> {
        if vocab.len() != matrix.nrows() {
            return Err(Error::VocabSizeMismatch {
                vocab: vocab.len(),
                rows: matrix.nrows(),
            });
        }

        Ok(VocabTable {
            vocab,
            matrix,
            freqs: None,
        })
    }

    /// Get the number of tokens.
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Get the embedding dimensionality.
    pub fn dims(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn vocab(&self) -> &SimpleVocab {
        &self.vocab
    }

    pub fn matrix(&self) -> ArrayView2<f32> {
        self.matrix.view()
    }

    /// Get the embedding of a token.
    pub fn embedding(&self, token: &[u8]) -> Option<ArrayView1<f32>> {
        self.vocab
            .idx(token)
            .map(|idx| self.matrix.index_axis(Axis(0), idx))
    }

    /// Get the attached frequency table.
    pub fn frequencies(&self) -> Option<&Frequencies> {
        self.freqs.as_ref()
    }

    /// Attach or detach a frequency table.
    ///
    /// Frequencies determine the order in which embeddings are written
    /// and which tokens are dropped by [`VocabTable::resize`].
    pub fn set_frequencies(&mut self, freqs: Option<Frequencies>) {
        self.freqs = freqs;
    }

    pub fn into_parts(self) -> (SimpleVocab, Array2<f32>, Option<Frequencies>) {
        (self.vocab, self.matrix, self.freqs)
    }

    /// Move a token to `index`.
    ///
    /// The tokens between the old and the new position shift by one
    /// towards the old position. Returns the old index of the token.
    pub fn move_token(&mut self, token: &[u8], index: usize) -> Result<usize> {
        let old = self
            .vocab
            .idx(token)
            .ok_or_else(|| Error::unknown_token(token))?;
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }

        if old == index {
            return Ok(old);
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.remove(old);
        order.insert(index, old);

        self.matrix = self.matrix.select(Axis(0), &order);
        self.vocab.move_word(old, index);

        Ok(old)
    }

    /// Insert a token with its embedding at `index`.
    ///
    /// Tokens at `index` and higher shift up by one.
    pub fn insert(
        &mut self,
        token: impl Into<Token>,
        index: usize,
        embedding: ArrayView1<f32>,
    ) -> Result<()> {
        let token = token.into();
        if self.vocab.contains(&token) {
            return Err(Error::duplicate_token(&token));
        }
        if index > self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        if embedding.len() != self.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.dims(),
                got: embedding.len(),
            });
        }

        let row = embedding.to_owned().insert_axis(Axis(0));
        let matrix = concatenate(
            Axis(0),
            &[
                self.matrix.slice(s![..index, ..]),
                row.view(),
                self.matrix.slice(s![index.., ..]),
            ],
        )?;
        self.matrix = matrix;
        self.vocab.insert(index, token);

        Ok(())
    }

    /// Remove a token and its embedding.
    ///
    /// Tokens after the removed token shift down by one. Returns the old
    /// index of the token.
    pub fn remove(&mut self, token: &[u8]) -> Result<usize> {
        let idx = self
            .vocab
            .idx(token)
            .ok_or_else(|| Error::unknown_token(token))?;

        let matrix = concatenate(
            Axis(0),
            &[
                self.matrix.slice(s![..idx, ..]),
                self.matrix.slice(s![idx + 1.., ..]),
            ],
        )?;
        self.matrix = matrix;
        self.vocab.remove(idx);

        Ok(idx)
    }

    /// Shrink the table to `size` tokens.
    ///
    /// If frequencies are attached, the least frequent tokens are
    /// removed, otherwise the tokens with the highest indices. Tables
    /// that are not larger than `size` are left as is. Returns the
    /// removed tokens.
    pub fn resize(&mut self, size: usize) -> Vec<Token> {
        let len = self.len();
        if size >= len {
            return Vec::new();
        }

        let mut keep = vec![true; len];
        match &self.freqs {
            Some(freqs) => {
                let mut by_freq: Vec<usize> = (0..len).collect();
                let words = self.vocab.words();
                // Least frequent first, among equals the highest index first.
                by_freq.sort_by(|&a, &b| {
                    freqs
                        .get(&words[a])
                        .cmp(&freqs.get(&words[b]))
                        .then(b.cmp(&a))
                });
                for &idx in &by_freq[..len - size] {
                    keep[idx] = false;
                }
            }
            None => keep[size..].iter_mut().for_each(|k| *k = false),
        }

        let kept: Vec<usize> = (0..len).filter(|&idx| keep[idx]).collect();
        self.matrix = if kept.is_empty() {
            Array2::zeros((0, self.dims()))
        } else {
            self.matrix.select(Axis(0), &kept)
        };

        let removed = self.vocab.retain(&keep);
        tracing::debug!("Resized vocabulary from {} to {} tokens", len, size);

        removed
    }

    /// Get the row indices in output order.
    ///
    /// Without frequencies this is ascending index order. With
    /// frequencies, rows are ordered by descending frequency, ties are
    /// kept in ascending index order.
    pub fn output_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if let Some(freqs) = &self.freqs {
            let words = self.vocab.words();
            order.sort_by(|&a, &b| freqs.get(&words[b]).cmp(&freqs.get(&words[a])));
        }
        order
    }

    /// Iterate over tokens and embeddings in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], ArrayView1<f32>)> {
        self.output_order().into_iter().map(move |idx| {
            (
                self.vocab.words()[idx].as_slice(),
                self.matrix.index_axis(Axis(0), idx),
            )
        })
    }
}

const PREALLOC_ROWS: usize = 1 << 16;

/// Incremental construction of a table from sequentially read records.
///
/// Duplicate tokens are dropped with a warning. A stream that ends
/// before the expected number of records yields a truncated table and a
/// warning.
pub(crate) struct TableBuilder {
    vocab: SimpleVocab,
    data: Vec<f32>,
    dims: Option<usize>,
    expected: Option<usize>,
    warnings: Vec<LoadWarning>,
}

impl TableBuilder {
    /// Builder for records of unknown number and dimensionality.
    pub fn new() -> Self {
        TableBuilder {
            vocab: SimpleVocab::default(),
            data: Vec::new(),
            dims: None,
            expected: None,
            warnings: Vec::new(),
        }
    }

    /// Builder for `n_words` records of dimensionality `dims`.
    ///
    /// The shape comes from a file header, at most `PREALLOC_ROWS` rows
    /// are reserved up front.
    pub fn with_shape(n_words: usize, dims: usize) -> Self {
        let mut data = Vec::new();
        if data
            .try_reserve(n_words.min(PREALLOC_ROWS).saturating_mul(dims))
            .is_err()
        {
            tracing::debug!("Cannot preallocate {} embeddings of size {}", n_words, dims);
        }

        TableBuilder {
            vocab: SimpleVocab::default(),
            data,
            dims: Some(dims),
            expected: Some(n_words),
            warnings: Vec::new(),
        }
    }

    /// Get the number of records added.
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Add a record.
    ///
    /// Returns `false` if the token was a duplicate, in which case the
    /// record is dropped.
    pub fn push(&mut self, token: Token, embedding: &[f32], line: usize) -> Result<bool> {
        check_dims(&mut self.dims, embedding.len(), line)?;

        if self.vocab.contains(&token) {
            LoadWarning::DuplicateToken { token, line }.report(&mut self.warnings);
            return Ok(false);
        }

        self.data.extend_from_slice(embedding);
        self.vocab.insert(self.vocab.len(), token);

        Ok(true)
    }

    pub fn finish(mut self) -> Result<(VocabTable, Vec<LoadWarning>)> {
        let read = self.vocab.len();
        if let Some(expected) = self.expected {
            if read < expected {
                LoadWarning::TruncatedInput { expected, read }.report(&mut self.warnings);
            }
        }

        let matrix = Array2::from_shape_vec((read, self.dims.unwrap_or(0)), self.data)?;
        Ok((VocabTable::from_vocab(self.vocab, matrix)?, self.warnings))
    }
}

/// Construction of a table with a predefined vocabulary.
///
/// Records for tokens outside the vocabulary are ignored. Every token of
/// the vocabulary must be found before the table can be finished.
pub(crate) struct VocabFiller {
    vocab: SimpleVocab,
    matrix: Option<Array2<f32>>,
    seen: Vec<bool>,
    dims: Option<usize>,
    warnings: Vec<LoadWarning>,
}

impl VocabFiller {
    /// The matrix is allocated when the first row is filled.
    pub fn new(vocab: SimpleVocab, dims: Option<usize>) -> Self {
        VocabFiller {
            seen: vec![false; vocab.len()],
            vocab,
            matrix: None,
            dims,
            warnings: Vec::new(),
        }
    }

    /// Get the row index of a token if it is in the vocabulary.
    pub fn idx(&self, token: &[u8]) -> Option<usize> {
        self.vocab.idx(token)
    }

    /// Fill the row `idx`.
    ///
    /// A row can only be filled once, later records for the same token
    /// are dropped with a warning.
    pub fn fill(&mut self, idx: usize, embedding: &[f32], line: usize) -> Result<()> {
        check_dims(&mut self.dims, embedding.len(), line)?;

        if self.seen[idx] {
            let token = self.vocab.words()[idx].clone();
            LoadWarning::DuplicateToken { token, line }.report(&mut self.warnings);
            return Ok(());
        }

        let n_words = self.vocab.len();
        let matrix = self
            .matrix
            .get_or_insert_with(|| Array2::from_elem((n_words, embedding.len()), f32::NAN));
        matrix
            .index_axis_mut(Axis(0), idx)
            .assign(&ArrayView1::from(embedding));
        self.seen[idx] = true;

        Ok(())
    }

    pub fn finish(self) -> Result<(VocabTable, Vec<LoadWarning>)> {
        let missing: Vec<String> = self
            .vocab
            .words()
            .iter()
            .zip(&self.seen)
            .filter(|(_, seen)| !**seen)
            .map(|(word, _)| display_token(word))
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteVocab { missing });
        }

        // Only an empty vocabulary leaves the matrix unallocated.
        let matrix = match self.matrix {
            Some(matrix) => matrix,
            None => Array2::from_shape_vec((0, self.dims.unwrap_or(0)), Vec::new())?,
        };

        Ok((VocabTable::from_vocab(self.vocab, matrix)?, self.warnings))
    }
}

fn check_dims(dims: &mut Option<usize>, len: usize, line: usize) -> Result<()> {
    match *dims {
        Some(dims) if dims != len => Err(Error::Parse(format!(
            "Vector size did not match in line {}, expected: {}, got: {}",
            line, dims, len
        ))),
        Some(_) => Ok(()),
        None => {
            *dims = Some(len);
            Ok(())
        }
    }
}
