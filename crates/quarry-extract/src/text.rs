//! Plain text extraction under the context's text budget

use crate::context::ExtractionContext;
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::generic::describe_file;
use std::fs::File;
use std::io::Read;
use tracing::debug;

/// Cut `text` to at most `budget` bytes without splitting a character
///
/// `None` means unlimited.
///
/// ```
/// use quarry_extract::truncate_to_budget;
///
/// assert_eq!(truncate_to_budget("héllo", Some(2)), "h");
/// assert_eq!(truncate_to_budget("héllo", None), "héllo");
/// ```
pub fn truncate_to_budget(text: &str, budget: Option<usize>) -> &str {
    let Some(budget) = budget else {
        return text;
    };
    if text.len() <= budget {
        return text;
    }

    let mut end = budget;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Extractor for `text/*` files
///
/// Produces the file-level resource typed `nfo:PlainTextDocument` with the
/// content in `nie:plainTextContent`. Reading stops at the text budget;
/// invalid UTF-8 is replaced.
#[derive(Debug, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor
    pub fn new() -> Self {
        Self
    }

    fn read_text(ctx: &ExtractionContext) -> Result<String, ExtractError> {
        let file = File::open(ctx.path())?;
        let mut buf = Vec::new();

        match ctx.text_budget() {
            Some(budget) => {
                file.take(budget as u64).read_to_end(&mut buf)?;
                // Drop a character cut in half by the budget
                if let Err(e) = std::str::from_utf8(&buf) {
                    if e.error_len().is_none() {
                        buf.truncate(e.valid_up_to());
                    }
                }
            }
            None => {
                let mut file = file;
                file.read_to_end(&mut buf)?;
            }
        }

        let text = String::from_utf8_lossy(&buf);
        Ok(truncate_to_budget(&text, ctx.text_budget()).to_string())
    }
}

impl Extractor for TextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn supported_types(&self) -> &[&str] {
        &["text/*"]
    }

    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError> {
        let mut resource = describe_file(ctx)?;
        let text = Self::read_text(ctx)?;

        debug!(
            "Read {} bytes of text from '{}'",
            text.len(),
            ctx.path().display()
        );

        resource.add_type("nfo:PlainTextDocument");
        if !text.is_empty() {
            resource.set_string("nie:plainTextContent", text);
        }

        ctx.set_resource(resource);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    fn text_file(contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_budget("hello world", Some(5)), "hello");
        assert_eq!(truncate_to_budget("hi", Some(10)), "hi");
        assert_eq!(truncate_to_budget("hi", Some(0)), "");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "€" is three bytes
        assert_eq!(truncate_to_budget("a€b", Some(3)), "a");
        assert_eq!(truncate_to_budget("a€b", Some(4)), "a€");
    }

    #[test]
    fn test_extract_plain_text() {
        let (_dir, path) = text_file(b"Dear diary");
        let ctx = ExtractionContext::new(&path, "h:notes", "text/plain", "", 0).unwrap();

        TextExtractor::new().extract(&ctx).unwrap();

        let resource = ctx.resource().unwrap();
        assert!(resource.has_type("nfo:PlainTextDocument"));
        assert!(resource.has_type("nfo:FileDataObject"));
        assert_eq!(resource.first_string("nie:plainTextContent"), Some("Dear diary"));
    }

    #[test]
    fn test_extract_respects_budget() {
        let (_dir, path) = text_file("añb".as_bytes());
        let ctx = ExtractionContext::new(&path, "h:notes", "text/plain", "", 2).unwrap();

        TextExtractor::new().extract(&ctx).unwrap();

        let resource = ctx.resource().unwrap();
        assert_eq!(resource.first_string("nie:plainTextContent"), Some("a"));
    }

    #[test]
    fn test_extract_invalid_utf8_is_replaced() {
        let (_dir, path) = text_file(&[b'o', b'k', 0xff, b'!']);
        let ctx = ExtractionContext::new(&path, "h:notes", "text/plain", "", 0).unwrap();

        TextExtractor::new().extract(&ctx).unwrap();

        let resource = ctx.resource().unwrap();
        assert_eq!(resource.first_string("nie:plainTextContent"), Some("ok\u{fffd}!"));
    }

    #[test]
    fn test_empty_file_has_no_content_property() {
        let (_dir, path) = text_file(b"");
        let ctx = ExtractionContext::new(&path, "h:notes", "text/plain", "", 0).unwrap();

        TextExtractor::new().extract(&ctx).unwrap();

        assert!(ctx.resource().unwrap().first("nie:plainTextContent").is_none());
    }

    proptest! {
        #[test]
        fn prop_truncate_is_bounded_prefix(text in ".*", budget in 0usize..64) {
            let cut = truncate_to_budget(&text, Some(budget));
            prop_assert!(cut.len() <= budget);
            prop_assert!(text.starts_with(cut));
        }
    }
}
