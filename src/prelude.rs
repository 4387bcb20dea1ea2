//! Prelude exports the most commonly-used types and traits.

pub use crate::detect::classify;

pub use crate::embeddings::{EmbeddingStore, LoadCondition, LoadOptions, VocabFilter};

pub use crate::error::{Error, LoadWarning, Result};

pub use crate::format::Format;

pub use crate::frequency::Frequencies;

pub use crate::io::ReadOptions;

pub use crate::table::VocabTable;

pub use crate::text::{ReadText, ReadTextDims, WriteText, WriteTextDims};

pub use crate::vocab::{SimpleVocab, Token, TokenEncoding};

pub use crate::word2vec::{ReadWord2Vec, WriteWord2Vec};
