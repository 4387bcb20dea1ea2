//! Detection of the embedding format from file content.
//!
//! Only the first two lines are inspected. The format predicates are
//! applied in a fixed order: GloVe, word2vec text, word2vec binary. A
//! word2vec binary file is recognized by its shape header once the text
//! predicates have failed.

use std::io::{BufRead, Seek, SeekFrom};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::{text, word2vec};

/// Determine the format of the embeddings in `reader`.
///
/// The read position of `reader` is restored afterwards. The sanity of
/// the remainder of the data is not checked.
pub fn classify<R>(reader: &mut R) -> Result<Format>
where
    R: BufRead + Seek,
{
    let (line0, line1) = read_two_lines(reader)?;

    let format = if text::check_valid_glove(&line0, &line1) {
        Format::Glove
    } else if text::check_valid_word2vec(&line0, &line1) {
        Format::Word2VecText
    } else if word2vec::check_valid(&line0, &line1) {
        Format::Word2VecBinary
    } else {
        return Err(Error::UnrecognizedFormat);
    };

    tracing::debug!("Detected embedding format: {}", format);

    Ok(format)
}

/// Read the first two lines without advancing the read position.
///
/// Lines include their terminators.
pub fn read_two_lines<R>(reader: &mut R) -> Result<(Vec<u8>, Vec<u8>)>
where
    R: BufRead + Seek,
{
    let start = reader
        .stream_position()
        .map_err(|e| Error::io_error("Cannot get read position", e))?;

    let mut line0 = Vec::new();
    reader
        .read_until(b'\n', &mut line0)
        .map_err(|e| Error::io_error("Cannot read first line", e))?;
    let mut line1 = Vec::new();
    reader
        .read_until(b'\n', &mut line1)
        .map_err(|e| Error::io_error("Cannot read second line", e))?;

    reader
        .seek(SeekFrom::Start(start))
        .map_err(|e| Error::io_error("Cannot restore read position", e))?;

    Ok((line0, line1))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Seek, SeekFrom};

    use super::{classify, read_two_lines};
    use crate::error::Error;
    use crate::format::Format;

    fn word2vec_binary() -> Vec<u8> {
        let mut data = b"2 2\nthe ".to_vec();
        data.extend_from_slice(&0.1f32.to_le_bytes());
        data.extend_from_slice(&0.2f32.to_le_bytes());
        data.extend_from_slice(b"\n, ");
        data.extend_from_slice(&0.3f32.to_le_bytes());
        data.extend_from_slice(&0.4f32.to_le_bytes());
        data.push(b'\n');
        data
    }

    #[test]
    fn two_lines_do_not_advance_reader() {
        let mut cursor = Cursor::new("2 3\n</s> 0.080054 0.088388 -0.07660\nthe -1.4 1.1 0.7");
        let (line0, line1) = read_two_lines(&mut cursor).unwrap();
        assert_eq!(line0, b"2 3\n");
        assert_eq!(line1, b"</s> 0.080054 0.088388 -0.07660\n");
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn two_lines_restore_non_zero_position() {
        let mut cursor = Cursor::new("skip\nthe 0.1 0.2\n, 0.3 0.4\n");
        cursor.seek(SeekFrom::Start(5)).unwrap();
        assert_eq!(classify(&mut cursor).unwrap(), Format::Glove);
        let mut rest = String::new();
        cursor.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "the 0.1 0.2\n, 0.3 0.4\n");
    }

    #[test]
    fn classify_glove() {
        let mut cursor = Cursor::new("the 0.1 0.2\n, 0.3 0.4\n");
        assert_eq!(classify(&mut cursor).unwrap(), Format::Glove);
    }

    #[test]
    fn classify_word2vec_text() {
        let mut cursor = Cursor::new("2 2\nthe 0.1 0.2\n, 0.3 0.4\n");
        assert_eq!(classify(&mut cursor).unwrap(), Format::Word2VecText);
    }

    #[test]
    fn classify_word2vec_binary() {
        let mut cursor = Cursor::new(word2vec_binary());
        assert_eq!(classify(&mut cursor).unwrap(), Format::Word2VecBinary);
    }

    #[test]
    fn classify_rejects_unknown_content() {
        let mut cursor = Cursor::new("hello world\nfoo bar\n");
        assert!(matches!(
            classify(&mut cursor),
            Err(Error::UnrecognizedFormat)
        ));

        let mut cursor = Cursor::new("");
        assert!(matches!(
            classify(&mut cursor),
            Err(Error::UnrecognizedFormat)
        ));
    }
}
