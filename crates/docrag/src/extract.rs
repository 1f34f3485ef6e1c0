//! Text extraction for ingestable files.

use async_trait::async_trait;
use docrag_core::{ExtractError, TextExtractor};

const SUPPORTED: &[&str] = &["text/plain", "text/markdown", "text/x-markdown"];

/// Extractor for plain text and markdown files.
///
/// Anything that is not UTF-8 text is rejected; richer formats would plug in
/// as further [`TextExtractor`] implementations.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn supported_types(&self) -> &[&str] {
        SUPPORTED
    }

    async fn extract(&self, bytes: &[u8], mime: &str) -> Result<String, ExtractError> {
        if !SUPPORTED.contains(&mime) {
            return Err(ExtractError::UnsupportedType(mime.to_string()));
        }
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractError::Unextractable(format!("invalid utf-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_extracts() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract(b"hello world", "text/plain")
            .await
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn markdown_is_accepted_as_is() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract(b"# Title\n\nbody", "text/markdown")
            .await
            .unwrap();
        assert!(text.starts_with("# Title"));
    }

    #[tokio::test]
    async fn unknown_types_are_unsupported() {
        let extractor = PlainTextExtractor;
        let err = extractor
            .extract(b"%PDF-1.4", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_is_unextractable() {
        let extractor = PlainTextExtractor;
        let err = extractor
            .extract(&[0xff, 0xfe, 0x00], "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unextractable(_)));
    }
}
