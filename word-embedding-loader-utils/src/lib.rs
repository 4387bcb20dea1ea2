use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};

use word_embedding_loader::prelude::*;

/// Input format selection, `Auto` detects the format from the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Auto,
    Known(Format),
}

impl InputFormat {
    pub fn try_from(format: impl AsRef<str>) -> Result<Self> {
        match format.as_ref() {
            "auto" => Ok(InputFormat::Auto),
            name => match name.parse() {
                Ok(format) => Ok(InputFormat::Known(format)),
                Err(_) => bail!("Unknown embedding format: {}", name),
            },
        }
    }

    pub fn format(self) -> Option<Format> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Known(format) => Some(format),
        }
    }
}

pub fn read_embeddings(
    filename: &str,
    input_format: InputFormat,
    vocab_filename: Option<&str>,
    max_vocab: Option<usize>,
) -> Result<EmbeddingStore> {
    let mut options = LoadOptions {
        format: input_format.format(),
        max_vocab,
        ..LoadOptions::default()
    };

    if let Some(vocab_filename) = vocab_filename {
        let filter = VocabFilter::read_frequencies(vocab_filename)
            .with_context(|| format!("Cannot read vocabulary file {}", vocab_filename))?;
        options = options.with_vocab(filter);
    }

    let store = EmbeddingStore::load_path(filename, options)
        .with_context(|| format!("Cannot read embeddings from {}", filename))?;

    Ok(store)
}

pub fn write_embeddings(store: &EmbeddingStore, filename: &str, format: Format) -> Result<()> {
    store
        .save_path(filename, format)
        .with_context(|| format!("Cannot write embeddings to {}", filename))
}

/// Detect the format of an embedding file.
pub fn detect_format(filename: &str) -> Result<Format> {
    let f = File::open(filename).with_context(|| format!("Cannot open {}", filename))?;
    let format = classify(&mut BufReader::new(f))
        .with_context(|| format!("Cannot detect the format of {}", filename))?;
    Ok(format)
}

/// Every accepted input format name with its description.
pub fn input_formats() -> Vec<(&'static str, &'static str)> {
    vec![
        ("auto", "Determine from content"),
        (Format::Glove.name(), Format::Glove.description()),
        ("word2vec", "Alias of word2vec-text"),
        (Format::Word2VecText.name(), Format::Word2VecText.description()),
        (Format::Word2VecBinary.name(), Format::Word2VecBinary.description()),
    ]
}

/// Lines describing every input format, as printed by `wel list`.
pub fn format_listing() -> Vec<String> {
    input_formats()
        .into_iter()
        .map(|(name, description)| format!("{}: {}", name, description))
        .collect()
}
