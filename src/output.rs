//! Output document generation.
//!
//! The reference page is a fixed Doxygen/Markdown header followed by the
//! converted bibliography body.

use std::fs;
use std::io;
use std::path::Path;

/// Built-in page header: a titled section with a stable anchor, a note and
/// a horizontal rule.
pub const DEFAULT_HEADER: &str = "References {#references}
==========

@par Notes
This large list collects all references which the project authors have found
convenient.  There is no claim that all of these references get direct use,
or even mention, in the project files.<br><br><hr>
";

/// Concatenates the header and the converted body.
///
/// The header is emitted verbatim, so the output always starts with it,
/// even for an empty body. The body is raw bytes: whatever encoding the
/// `.bbl` had is carried into the page.
pub fn render_document(header: &str, body: &[u8]) -> Vec<u8> {
    let mut document = Vec::with_capacity(header.len() + body.len());
    document.extend_from_slice(header.as_bytes());
    document.extend_from_slice(body);
    document
}

/// Writes the rendered document, truncating any existing file.
pub fn write_document(path: &Path, document: impl AsRef<[u8]>) -> io::Result<()> {
    fs::write(path, document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_document_starts_with_header() {
        let result = render_document(DEFAULT_HEADER, b"Smith, J. 2001.\n");
        assert!(result.starts_with(DEFAULT_HEADER.as_bytes()));
        assert!(result.ends_with(b"Smith, J. 2001.\n"));
    }

    #[test]
    fn test_render_document_empty_body() {
        // Given: an empty converted body
        // When: we render the page
        let result = render_document(DEFAULT_HEADER, b"");

        // Then: the page is exactly the header
        assert_eq!(result, DEFAULT_HEADER.as_bytes());
    }

    #[test]
    fn test_render_document_keeps_non_utf8_body() {
        let result = render_document("H\n", b"G\xf6del");
        assert_eq!(result, b"H\nG\xf6del".to_vec());
    }

    #[test]
    fn test_default_header_contract() {
        let mut lines = DEFAULT_HEADER.lines();
        assert_eq!(lines.next(), Some("References {#references}"));
        assert_eq!(lines.next(), Some("=========="));
        assert!(DEFAULT_HEADER.contains("@par Notes"));
        assert!(DEFAULT_HEADER.trim_end().ends_with("<hr>"));
    }

    #[test]
    fn test_write_document_truncates() {
        // Given: an existing, longer file
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("references.md");
        fs::write(&path, "a much longer previous page").unwrap();

        // When: we write a shorter document over it
        write_document(&path, "new").unwrap();

        // Then: only the new content remains
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
