//! Content model for front-mattered articles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A fully parsed source file: metadata plus the ordered body spans.
///
/// Immutable once constructed; rendering never mutates or re-orders it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,

    /// Body content in reading order.
    pub spans: Vec<Span>,

    /// Raw body text (everything after the closing front-matter delimiter).
    /// Span byte ranges index into this string.
    pub body: String,
}

/// Front-matter metadata decoded from the delimited block at the top of a
/// source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frontmatter {
    pub title: String,

    /// URL slug (e.g., "go-profile-guided-optimization").
    pub slug: String,

    /// Publication date.
    pub date: NaiveDate,

    /// Document type (e.g., "post"), stored verbatim.
    #[serde(rename = "type")]
    pub post_type: Option<String>,

    /// Ordered, duplicates permitted.
    pub categories: Vec<String>,

    /// Ordered, duplicates permitted.
    pub tags: Vec<String>,

    pub draft: bool,

    /// Unrecognized fields, retained under their literal names in first-seen
    /// order.
    pub extra: Vec<(String, FieldValue)>,
}

impl Frontmatter {
    /// Look up a retained unknown field by name.
    pub fn extra_field(&self, name: &str) -> Option<&FieldValue> {
        self.extra
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Value of a front-matter field: a scalar or an ordered string sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }
}

/// One contiguous, typed unit of body content, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Prose(ProseSpan),
    CodeBlock(CodeBlockSpan),
    Shortcode(ShortcodeSpan),
}

impl Span {
    /// 1-based source line of the first line this span covers.
    pub fn line(&self) -> usize {
        match self {
            Span::Prose(s) => s.line,
            Span::CodeBlock(s) => s.line,
            Span::Shortcode(s) => s.line,
        }
    }

    /// Byte range this span covers in the body. Ranges of consecutive spans
    /// tile the body with no gaps or overlaps.
    pub fn range(&self) -> Range<usize> {
        match self {
            Span::Prose(s) => s.range.clone(),
            Span::CodeBlock(s) => s.range.clone(),
            Span::Shortcode(s) => s.range.clone(),
        }
    }
}

/// A run of plain body lines, original line breaks preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProseSpan {
    pub text: String,
    pub line: usize,
    pub range: Range<usize>,
}

/// A verbatim code listing, from either a fence or a `highlight` shortcode.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockSpan {
    pub language: Option<String>,

    /// The lines between the delimiter lines, verbatim, including line
    /// endings.
    pub content: String,

    /// Rendering hints (`linenos`, `linenostart`, `hl_lines`, ...).
    pub options: RenderOptions,

    pub line: usize,
    pub range: Range<usize>,
}

/// A named, parameterized block dispatched to a handler at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcodeSpan {
    pub name: String,
    pub options: RenderOptions,

    /// The lines between the markers, verbatim. Empty for self-closing
    /// shortcodes.
    pub body: String,

    pub line: usize,
    pub range: Range<usize>,
}

/// Options attached to a code block or shortcode: `key=value` pairs and bare
/// flags, in source order. Unknown options are preserved; renderers ignore
/// what they don't support.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOptions {
    entries: Vec<(String, OptionValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A bare token with no `=`.
    Flag,
    Value(String),
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key=value`, replacing an earlier entry for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key.into(), OptionValue::Value(value.into()));
    }

    /// Set a bare flag, replacing an earlier entry for the same key.
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.insert(key.into(), OptionValue::Flag);
    }

    fn insert(&mut self, key: String, value: OptionValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// The value of `key`, if present with a value (flags return `None`).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, v)| match v {
            OptionValue::Value(value) if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether `key` appears at all, as a flag or with a value.
    pub fn is_set(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RenderOptions {
    type Item = (String, OptionValue);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// What the renderer does with a shortcode no handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownShortcodePolicy {
    /// Refuse to render the document.
    #[default]
    Abort,

    /// Emit the block's raw source text (escaped) and log a warning.
    Skip,
}

/// A single article in the site: a parsed document plus where it came from.
#[derive(Debug, Clone)]
pub struct Article {
    pub document: Document,

    /// Source path relative to the content directory.
    pub source_path: String,
}

impl Article {
    pub fn slug(&self) -> &str {
        &self.document.frontmatter.slug
    }

    pub fn is_draft(&self) -> bool {
        self.document.frontmatter.draft
    }

    /// Relative output path for this article (no leading slash).
    pub fn output_rel_path(&self) -> String {
        format!("{}.html", self.slug())
    }

    /// URL for this article under a normalized base URL.
    pub fn url_with_base(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.output_rel_path())
    }
}

/// Everything a batch load produced: parsed articles plus per-document
/// diagnostics for the sources that failed.
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
    pub articles: Vec<Article>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteIndex {
    pub fn find_by_slug(&self, slug: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.slug() == slug)
    }

    /// Non-draft articles, newest first.
    pub fn published(&self) -> Vec<&Article> {
        let mut articles: Vec<&Article> =
            self.articles.iter().filter(|a| !a.is_draft()).collect();
        articles.sort_by(|a, b| b.document.frontmatter.date.cmp(&a.document.frontmatter.date));
        articles
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }
}

/// A problem found while loading or rendering one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable machine-readable code (e.g., "parse.unterminated-block").
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub source_path: Option<String>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}
