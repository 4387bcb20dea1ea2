//! Encoding of single embedding components.
//!
//! The text formats store components as ASCII decimal literals, the
//! word2vec binary format stores them as little-endian IEEE-754 single
//! precision floats.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Parse a decimal literal.
pub fn parse_component(field: &[u8]) -> Result<f32> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            Error::Parse(format!(
                "Cannot parse vector component '{}'",
                String::from_utf8_lossy(field)
            ))
        })
}

/// Check whether a field is a decimal literal.
pub(crate) fn is_component(field: &[u8]) -> bool {
    parse_component(field).is_ok()
}

/// Format a component as the shortest literal that parses back to the
/// same value.
pub fn format_component(v: f32) -> String {
    v.to_string()
}

/// Allocate a zeroed buffer for one embedding of `dims` components.
///
/// Fails if the dimensionality from a header is too large to allocate.
pub(crate) fn component_buffer(dims: usize) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(dims).map_err(|_| {
        Error::Parse(format!("Cannot allocate an embedding of {} components", dims))
    })?;
    buf.resize(dims, 0f32);
    Ok(buf)
}

/// Read `components.len()` little-endian floats.
pub fn read_components(reader: &mut dyn Read, components: &mut [f32]) -> std::io::Result<()> {
    reader.read_f32_into::<LittleEndian>(components)
}

/// Write components as little-endian floats, without padding.
pub fn write_components<'a>(
    writer: &mut dyn Write,
    components: impl IntoIterator<Item = &'a f32>,
) -> Result<()> {
    for &v in components {
        writer
            .write_f32::<LittleEndian>(v)
            .map_err(|e| Error::io_error("Cannot write embedding component", e))?;
    }

    Ok(())
}
