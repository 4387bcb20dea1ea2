//! Embedding file formats.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Supported embedding file formats.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// GloVe text format: one `<token> <components>` line per word.
    Glove,

    /// word2vec text format (`-binary 0`): GloVe lines preceded by a
    /// `<count> <dims>` header.
    Word2VecText,

    /// word2vec binary format (`-binary 1`): `<count> <dims>` header,
    /// followed by tokens and little-endian `f32` components.
    Word2VecBinary,
}

impl Format {
    /// All formats, in detection priority order.
    pub const ALL: [Format; 3] = [Format::Glove, Format::Word2VecText, Format::Word2VecBinary];

    /// Select a format by tool name and binary flag.
    ///
    /// `glove` has no binary variant, the flag is ignored for it.
    pub fn from_name(name: &str, binary: bool) -> Result<Self> {
        match name {
            "glove" => {
                if binary {
                    tracing::warn!("Binary flag is ignored for the GloVe format");
                }
                Ok(Format::Glove)
            }
            "word2vec" if binary => Ok(Format::Word2VecBinary),
            "word2vec" => Ok(Format::Word2VecText),
            unknown => Err(Error::UnknownFormat(unknown.to_owned())),
        }
    }

    /// Canonical name of the format.
    pub fn name(self) -> &'static str {
        match self {
            Format::Glove => "glove",
            Format::Word2VecText => "word2vec-text",
            Format::Word2VecBinary => "word2vec-binary",
        }
    }

    /// Human-readable description of the format.
    pub fn description(self) -> &'static str {
        match self {
            Format::Glove => "GloVe by Stanford NLP group.",
            Format::Word2VecText => "word2vec (by Mikolov et al.) with -binary 0 option.",
            Format::Word2VecBinary => "word2vec (by Mikolov et al.) with -binary 1 option.",
        }
    }

    pub fn is_binary(self) -> bool {
        self == Format::Word2VecBinary
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "glove" => Ok(Format::Glove),
            "word2vec" | "word2vec-text" => Ok(Format::Word2VecText),
            "word2vec-binary" => Ok(Format::Word2VecBinary),
            unknown => Err(Error::UnknownFormat(unknown.to_owned())),
        }
    }
}
