//! Decoding of subprocess output with a legacy-codepage fallback.
//!
//! Output is decoded with the primary encoding first (UTF-8 unless
//! configured otherwise). Bytes that are malformed in the primary encoding
//! are retried with the fallback, which defaults to Shift_JIS (the
//! Windows-31J / cp932 variant `encoding_rs` ships under that name).

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use tracing::debug;

use crate::error::{Result, ShellError};

const NEWLINE: &str = "\n";

/// Primary/fallback encoding pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    primary: &'static Encoding,
    fallback: &'static Encoding,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            primary: UTF_8,
            fallback: SHIFT_JIS,
        }
    }
}

impl Decoder {
    pub fn new(primary: &'static Encoding, fallback: &'static Encoding) -> Self {
        Self { primary, fallback }
    }

    /// Build a decoder from WHATWG encoding labels (e.g. `"utf-8"`, `"shift_jis"`).
    pub fn from_labels(primary: &str, fallback: &str) -> Result<Self> {
        Ok(Self::new(lookup(primary)?, lookup(fallback)?))
    }

    pub fn primary(&self) -> &'static Encoding {
        self.primary
    }

    pub fn fallback(&self) -> &'static Encoding {
        self.fallback
    }

    /// Decode one byte string, trying the primary encoding then the fallback.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        if let Some(text) = strict_decode(self.primary, bytes) {
            return Ok(text);
        }
        debug!(
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            bytes = bytes.len(),
            "primary decode failed, using fallback"
        );
        strict_decode(self.fallback, bytes).ok_or(ShellError::Decode {
            primary: self.primary.name(),
            fallback: self.fallback.name(),
        })
    }

    /// Decode each element independently and join them, each preceded by a newline.
    pub fn decode_lines<B: AsRef<[u8]>>(&self, lines: &[B]) -> Result<String> {
        let mut joined = String::new();
        for line in lines {
            joined.push_str(NEWLINE);
            joined.push_str(&self.decode(line.as_ref())?);
        }
        Ok(joined)
    }
}

fn lookup(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ShellError::validation(format!("unknown encoding label '{label}'")))
}

fn strict_decode(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|cow| cow.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sjis(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn decodes_utf8_directly() {
        let decoder = Decoder::default();
        assert_eq!(decoder.decode(b"aaa").expect("decode"), "aaa");
        assert_eq!(
            decoder.decode("テスト".as_bytes()).expect("decode"),
            "テスト"
        );
    }

    #[test]
    fn falls_back_to_shift_jis() {
        let decoder = Decoder::default();
        let bytes = sjis("テスト");
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(decoder.decode(&bytes).expect("decode"), "テスト");
    }

    #[test]
    fn decodes_lines_with_leading_newlines() {
        let decoder = Decoder::default();
        let plain: [&[u8]; 2] = [b"aaa", b"bbb"];
        assert_eq!(decoder.decode_lines(&plain).expect("decode"), "\naaa\nbbb");

        let legacy = [sjis("テスト"), sjis("テスト")];
        assert_eq!(
            decoder.decode_lines(&legacy).expect("decode"),
            "\nテスト\nテスト"
        );
    }

    #[test]
    fn empty_input_decodes_to_empty_text() {
        let decoder = Decoder::default();
        assert_eq!(decoder.decode(b"").expect("decode"), "");
        let none: [&[u8]; 0] = [];
        assert_eq!(decoder.decode_lines(&none).expect("decode"), "");
    }

    #[test]
    fn fails_when_neither_encoding_applies() {
        let decoder = Decoder::new(UTF_8, encoding_rs::EUC_JP);
        // 0xFF is invalid as a UTF-8 byte and as an EUC-JP lead byte.
        let err = decoder.decode(&[0xff, 0xff]).expect_err("should fail");
        assert!(matches!(err, ShellError::Decode { .. }));
    }

    #[test]
    fn resolves_labels() {
        let decoder = Decoder::from_labels("utf-8", "windows-31j").expect("labels");
        assert_eq!(decoder.fallback(), SHIFT_JIS);
        assert!(Decoder::from_labels("utf-8", "no-such-encoding").is_err());
    }
}
