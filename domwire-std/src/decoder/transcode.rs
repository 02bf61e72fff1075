//! Character re-encoding of decoded strings.
//!
//! When UTF-8 decoding is enabled, every decoded string is converted into the
//! application encoding by the first transcoder of the chain that supports it:
//!
//! 1. a user-supplied transcoder (e.g. transliterating),
//! 2. [`EncodingRsTranscoder`], backed by `encoding_rs`,
//! 3. [`Latin1Transcoder`], for ISO-8859-1 only.
//!
//! Rust strings are always UTF-8, so a transcoder returns the text as it reads
//! once stored in the target encoding: characters the encoding cannot represent
//! are replaced.

use encoding_rs::Encoding;

/// Converts UTF-8 text into a target character encoding.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a transcoder",
    label = "missing `Transcoder` implementation",
    note = "Transcoders implement `supports` and `transcode`."
)]
pub trait Transcoder: Send + Sync {
    /// A name for diagnostics.
    fn name(&self) -> &str;

    /// Returns `true` if `encoding` can be produced.
    fn supports(&self, encoding: &str) -> bool;

    /// Convert `value` into `encoding`.
    fn transcode(&self, value: &str, encoding: &str) -> String;
}

/// Multi-byte re-encoder covering every WHATWG encoding label.
///
/// Unmappable characters become numeric character references (`&#8364;`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsTranscoder;

impl Transcoder for EncodingRsTranscoder {
    fn name(&self) -> &str {
        "encoding_rs"
    }

    fn supports(&self, encoding: &str) -> bool {
        Encoding::for_label(encoding.trim().as_bytes()).is_some()
    }

    fn transcode(&self, value: &str, encoding: &str) -> String {
        let Some(target) = Encoding::for_label(encoding.trim().as_bytes()) else {
            return value.to_string();
        };
        let (bytes, used, _) = target.encode(value);
        let (text, _) = used.decode_without_bom_handling(&bytes);
        text.into_owned()
    }
}

/// Legacy single-byte transcoder for ISO-8859-1.
///
/// Characters above U+00FF become `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1Transcoder;

const LATIN1_LABELS: &[&str] = &["iso-8859-1", "iso8859-1", "latin1", "l1"];

impl Transcoder for Latin1Transcoder {
    fn name(&self) -> &str {
        "latin1"
    }

    fn supports(&self, encoding: &str) -> bool {
        let encoding = encoding.trim();
        LATIN1_LABELS.iter().any(|l| l.eq_ignore_ascii_case(encoding))
    }

    fn transcode(&self, value: &str, _encoding: &str) -> String {
        value
            .chars()
            .map(|c| if (c as u32) <= 0xff { c } else { '?' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_rs_replaces_unmappable() {
        let t = EncodingRsTranscoder;
        assert!(t.supports("ISO-8859-15"));
        assert!(!t.supports("klingon"));
        assert_eq!(t.transcode("café", "ISO-8859-15"), "café");
        assert_eq!(t.transcode("日", "ISO-8859-15"), "&#26085;");
    }

    #[test]
    fn test_latin1() {
        let t = Latin1Transcoder;
        assert!(t.supports("Latin1"));
        assert!(!t.supports("UTF-8"));
        assert_eq!(t.transcode("é€", "latin1"), "é?");
    }
}
