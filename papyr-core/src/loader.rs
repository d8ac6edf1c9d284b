//! Splitting raw source text into front matter and body.

use crate::error::ParseError;

/// Front-matter dialect, keyed off the delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterFormat {
    /// `+++` delimiters, TOML fields.
    Toml,
    /// `---` delimiters, YAML fields.
    Yaml,
}

/// The two halves of a source file, still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument<'a> {
    pub format: FrontMatterFormat,

    /// The lines between the delimiters, verbatim.
    pub raw_frontmatter: &'a str,

    /// 1-based line of the first front-matter line.
    pub frontmatter_line: usize,

    /// Everything after the closing delimiter line.
    pub body: &'a str,

    /// 1-based line of the first body line.
    pub body_line: usize,
}

/// Locate the front-matter delimiter pair and split the source around it.
///
/// The opening delimiter (`+++` or `---`) must be the entire first line;
/// the block closes at the nearest later line consisting of the same
/// delimiter. Pure function of the input text.
pub fn split_document(source: &str) -> Result<SplitDocument<'_>, ParseError> {
    let mut lines = source.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Err(ParseError::MalformedDocument {
            line: 1,
            reason: "document is empty".to_string(),
        });
    };

    let marker = first.trim_end();
    let format = match marker {
        "+++" => FrontMatterFormat::Toml,
        "---" => FrontMatterFormat::Yaml,
        _ => {
            return Err(ParseError::MalformedDocument {
                line: 1,
                reason: "expected a `+++` or `---` front matter delimiter on the first line"
                    .to_string(),
            })
        }
    };

    let frontmatter_start = first.len();
    let mut offset = frontmatter_start;
    let mut line_no = 1;

    for line in lines {
        line_no += 1;
        if line.trim_end() == marker {
            let body_start = offset + line.len();
            return Ok(SplitDocument {
                format,
                raw_frontmatter: &source[frontmatter_start..offset],
                frontmatter_line: 2,
                body: &source[body_start..],
                body_line: line_no + 1,
            });
        }
        offset += line.len();
    }

    Err(ParseError::MalformedDocument {
        line: 1,
        reason: format!("front matter opened with `{marker}` is never closed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_toml_front_matter() {
        let source = "+++\ntitle = \"Hello\"\nslug = \"hello\"\n+++\nBody text.\n";
        let split = split_document(source).unwrap();

        assert_eq!(split.format, FrontMatterFormat::Toml);
        assert_eq!(split.raw_frontmatter, "title = \"Hello\"\nslug = \"hello\"\n");
        assert_eq!(split.frontmatter_line, 2);
        assert_eq!(split.body, "Body text.\n");
        assert_eq!(split.body_line, 5);
    }

    #[test]
    fn test_split_yaml_front_matter() {
        let source = "---\ntitle: Hello\n---\nBody.\n";
        let split = split_document(source).unwrap();

        assert_eq!(split.format, FrontMatterFormat::Yaml);
        assert_eq!(split.raw_frontmatter, "title: Hello\n");
        assert_eq!(split.body, "Body.\n");
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let source = "# Just markdown\n\nNo front matter.\n";
        let err = split_document(source).unwrap_err();
        match err {
            ParseError::MalformedDocument { line, .. } => assert_eq!(line, 1),
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_delimiter_not_at_position_zero() {
        let source = "\n+++\ntitle = \"x\"\n+++\n";
        assert!(split_document(source).is_err());
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let source = "+++\ntitle = \"Hello\"\nslug = \"hello\"\n";
        let err = split_document(source).unwrap_err();
        match err {
            ParseError::MalformedDocument { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("never closed"));
            }
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_delimiters_do_not_close() {
        // A `---` line does not close a `+++` block.
        let source = "+++\ntitle = \"x\"\n---\n";
        assert!(split_document(source).is_err());
    }

    #[test]
    fn test_empty_body() {
        let source = "+++\ntitle = \"x\"\n+++\n";
        let split = split_document(source).unwrap();
        assert_eq!(split.body, "");
        assert_eq!(split.body_line, 4);
    }

    #[test]
    fn test_crlf_delimiters() {
        let source = "+++\r\ntitle = \"x\"\r\n+++\r\nBody.\r\n";
        let split = split_document(source).unwrap();
        assert_eq!(split.format, FrontMatterFormat::Toml);
        assert_eq!(split.body, "Body.\r\n");
    }
}
