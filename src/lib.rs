//! A library for reading, writing, and editing word embeddings.
//!
//! word-embedding-loader reads embeddings in the GloVe, word2vec text,
//! and word2vec binary formats into a [`VocabTable`](table::VocabTable):
//! a vocabulary bound to the rows of an embedding matrix. The table can
//! be edited (tokens moved, inserted, removed, or the vocabulary
//! shrunk) without breaking the binding, and written in any of the
//! formats.
//!
//! The format of a file can be detected from its content, see
//! [`classify`](detect::classify) and
//! [`EmbeddingStore`](embeddings::EmbeddingStore).

pub mod detect;

pub mod embeddings;

pub mod error;

pub mod format;

pub mod frequency;

pub mod io;

pub mod numeric;

pub mod prelude;

pub mod table;

pub mod text;

pub mod unk;

pub(crate) mod util;

pub mod vocab;

pub mod word2vec;
