//! Input decoding for SQL Server export scripts.
//!
//! SSMS "Generate Scripts" writes UTF-16-LE with a byte-order-mark; scripts
//! that passed through other tools are usually UTF-8 or Windows-1252. The
//! decode cascade here never fails: UTF-16-LE when the BOM is present, then
//! strict UTF-8, then Windows-1252 (which accepts any byte sequence).
//! Malformed input therefore decodes to *something* rather than erroring,
//! at the cost of possible mojibake.

use encoding_rs::{UTF_16LE, WINDOWS_1252};
use std::io::Read;
use std::path::Path;

/// UTF-16-LE byte-order-mark.
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Compression format detected from file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor.
    pub fn wrap_reader<'a>(
        &self,
        reader: Box<dyn Read + 'a>,
    ) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

/// Decode raw script bytes into text.
///
/// The Windows-1252 fallback cannot fail, so this always returns a string
/// usable by downstream matching.
pub fn decode(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[..2] == UTF16_LE_BOM {
        let (text, _, _) = UTF_16LE.decode(&bytes[2..]);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => WINDOWS_1252.decode(bytes).0.into_owned(),
    }
}
