use crate::error::{JanitorError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Text encoding of a listing file.
///
/// Listings captured by redirecting `gcloud` output in PowerShell arrive as
/// UTF-16LE with a BOM, so the encoding is always stated explicitly rather
/// than sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    #[value(name = "utf-8")]
    Utf8,
    /// UTF-16 honouring a BOM, little-endian when none is present.
    #[serde(rename = "utf-16")]
    #[value(name = "utf-16")]
    Utf16,
    #[serde(rename = "utf-16le")]
    #[value(name = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    #[value(name = "utf-16be")]
    Utf16Be,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        }
    }

    pub fn decode(&self, bytes: &[u8], source_name: &str) -> Result<String> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(body.to_vec()).map_err(|e| JanitorError::Parse {
                    source_name: source_name.to_string(),
                    message: format!("invalid utf-8: {}", e),
                })
            }
            TextEncoding::Utf16 => {
                if let Some(body) = bytes.strip_prefix(UTF16BE_BOM) {
                    decode_utf16(body, false, source_name)
                } else {
                    let body = bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes);
                    decode_utf16(body, true, source_name)
                }
            }
            TextEncoding::Utf16Le => {
                let body = bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes);
                decode_utf16(body, true, source_name)
            }
            TextEncoding::Utf16Be => {
                let body = bytes.strip_prefix(UTF16BE_BOM).unwrap_or(bytes);
                decode_utf16(body, false, source_name)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_utf16(body: &[u8], little_endian: bool, source_name: &str) -> Result<String> {
    if !body.len().is_multiple_of(2) {
        return Err(JanitorError::Parse {
            source_name: source_name.to_string(),
            message: format!("odd byte count ({}) for utf-16 input", body.len()),
        });
    }

    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| JanitorError::Parse {
            source_name: source_name.to_string(),
            message: format!("invalid utf-16: {}", e),
        })
}

/// Read a listing file from disk and decode it.
pub fn read_listing<P: AsRef<Path>>(path: P, encoding: TextEncoding) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), %encoding, bytes = bytes.len(), "read listing");
    encoding.decode(&bytes, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = UTF16LE_BOM.to_vec();
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
        bytes
    }

    #[test]
    fn test_utf16_with_bom() {
        let bytes = utf16le_with_bom("[{\"package\": \"고객\"}]");
        let text = TextEncoding::Utf16.decode(&bytes, "images.json").unwrap();
        assert_eq!(text, "[{\"package\": \"고객\"}]");
    }

    #[test]
    fn test_utf16_big_endian_bom() {
        let mut bytes = UTF16BE_BOM.to_vec();
        bytes.extend("abc".encode_utf16().flat_map(|u| u.to_be_bytes()));
        assert_eq!(TextEncoding::Utf16.decode(&bytes, "x").unwrap(), "abc");
    }

    #[test]
    fn test_utf16_without_bom_defaults_to_le() {
        let bytes: Vec<u8> = "gs://a".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(TextEncoding::Utf16.decode(&bytes, "x").unwrap(), "gs://a");
    }

    #[test]
    fn test_odd_length_is_parse_error() {
        let result = TextEncoding::Utf16Le.decode(&[0x41, 0x00, 0x42], "buckets.txt");
        assert!(matches!(result, Err(JanitorError::Parse { .. })));
    }

    #[test]
    fn test_utf8_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(TextEncoding::Utf8.decode(&bytes, "x").unwrap(), "hello");
    }

    #[test]
    fn test_utf16_bytes_read_as_utf8_fail() {
        let bytes = utf16le_with_bom("[]");
        assert!(TextEncoding::Utf8.decode(&bytes, "images.json").is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TextEncoding::Utf16Le.to_string(), "utf-16le");
        assert_eq!(TextEncoding::Utf8.as_str(), "utf-8");
    }
}
