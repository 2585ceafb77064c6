//! Source generators for embedding a [`SparseImage`] in firmware.
//!
//! Each generator renders the whole unit into memory first; nothing reaches
//! the writer unless rendering succeeded.  Generated code depends only on
//! fixed-width integers and memcpy/memset (or their `core` equivalents).

pub mod c;
pub mod rust;

use std::fmt::{self, Display};
use std::io::{self, Write};

use thiserror::Error;

use crate::blob::{write_blob, BlobError};
use crate::encoder::SparseImage;

/// Default symbol prefix, matching the names existing firmware links against.
pub const DEFAULT_PREFIX: &str = "image";
/// Stream literals per generated source line.
pub const DEFAULT_BYTES_PER_LINE: usize = 16;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Lang {
    #[default]
    C,
    Rust,
    /// Binary container, see [`crate::blob`].
    Blob,
}

impl Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}",
            match self {
                Lang::C    => "c",
                Lang::Rust => "rust",
                Lang::Blob => "blob",
            }
        )
    }
}

/// Configuration for [`emit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    pub lang:           Lang,
    /// Prefix for every generated symbol (`image` -> `image_stream`, ...).
    pub prefix:         String,
    pub bytes_per_line: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            lang:           Lang::C,
            prefix:         DEFAULT_PREFIX.to_owned(),
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
        }
    }
}

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Invalid symbol prefix '{0}': must be an identifier")]
    InvalidPrefix(String),
    #[error("Formatting error: {0}")]
    Fmt(#[from] fmt::Error),
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Render `image` as source text.  Not available for [`Lang::Blob`].
pub fn render(image: &SparseImage, opts: &EmitOptions) -> Result<String, EmitError> {
    check_prefix(&opts.prefix)?;
    match opts.lang {
        Lang::C    => c::render(image, opts),
        Lang::Rust => rust::render(image, opts),
        Lang::Blob => Err(EmitError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "blob output is binary, use emit()",
        ))),
    }
}

/// Render `image` in `opts.lang` and write it to `writer` in one piece.
pub fn emit<W: Write>(image: &SparseImage, opts: &EmitOptions, mut writer: W) -> Result<(), EmitError> {
    let bytes = match opts.lang {
        Lang::Blob => {
            let mut buf = Vec::new();
            write_blob(image, &mut buf)?;
            buf
        }
        _ => render(image, opts)?.into_bytes(),
    };
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn check_prefix(prefix: &str) -> Result<(), EmitError> {
    let mut chars = prefix.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(EmitError::InvalidPrefix(prefix.to_owned()))
    }
}

/// Write `data` as `0x..` literals, `per_line` to a line, each line opened
/// with `indent` and each literal followed by `sep`.
fn write_hex_rows(
    out:      &mut String,
    data:     &[u8],
    per_line: usize,
    indent:   &str,
    sep:      &str,
) -> fmt::Result {
    use std::fmt::Write as _;
    for row in data.chunks(per_line.max(1)) {
        out.push_str(indent);
        for byte in row {
            write!(out, "0x{byte:02x}{sep}")?;
        }
        // Drop trailing whitespace the separator may leave behind.
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        out.push('\n');
    }
    Ok(())
}
