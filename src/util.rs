use std::io::BufRead;

use crate::error::{Error, Result};

/// Read a line into `buf`, without the line terminator.
///
/// Returns the number of bytes consumed from the reader, `0` at the end
/// of the stream.
pub(crate) fn read_line(reader: &mut dyn BufRead, buf: &mut Vec<u8>) -> Result<usize> {
    buf.clear();
    let n = reader
        .read_until(b'\n', buf)
        .map_err(|e| Error::io_error("Cannot read line from embedding file", e))?;

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }

    Ok(n)
}

/// Read bytes up to and excluding `delim`.
///
/// The second component is `false` when the stream ended before the
/// delimiter was found.
pub(crate) fn read_string(reader: &mut dyn BufRead, delim: u8) -> Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    reader
        .read_until(delim, &mut buf)
        .map_err(|e| Error::io_error("Cannot read string", e))?;

    let found = buf.last() == Some(&delim);
    if found {
        buf.pop();
    }

    Ok((buf, found))
}

/// Split a line into fields separated by runs of ASCII whitespace.
pub(crate) fn fields(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|b| b.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
}

/// Parse a `<count> <dimension>` shape line.
///
/// Returns `None` if the line does not consist of exactly two unsigned
/// integers.
pub(crate) fn parse_shape(line: &[u8]) -> Option<(usize, usize)> {
    let mut parts = fields(line);
    let n_words = parse_usize(parts.next()?)?;
    let dims = parse_usize(parts.next()?)?;

    if parts.next().is_some() {
        return None;
    }

    Some((n_words, dims))
}

/// Read the `<count> <dimension>` header of word2vec files.
pub(crate) fn read_shape(reader: &mut dyn BufRead) -> Result<(usize, usize)> {
    let mut line = Vec::new();
    read_line(reader, &mut line)?;
    parse_shape(&line).ok_or_else(|| {
        Error::Parse(format!(
            "Cannot parse shape header '{}'",
            String::from_utf8_lossy(&line).trim()
        ))
    })
}

/// Strip leading and trailing ASCII whitespace.
pub(crate) fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |pos| pos + 1);
    &bytes[start..end]
}

fn parse_usize(field: &[u8]) -> Option<usize> {
    std::str::from_utf8(field).ok()?.parse().ok()
}
