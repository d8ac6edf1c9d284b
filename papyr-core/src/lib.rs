//! # papyr-core
//!
//! Core library for the papyr article renderer.
//!
//! This crate owns the document model and the parse stages: splitting a
//! source file around its front-matter delimiters, decoding the metadata
//! block, and scanning the body into ordered prose/code/shortcode spans.
//! Rendering lives in `papyr-render`.

pub mod builder;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod loader;
pub mod models;
pub mod scanner;

pub use builder::{BuildError, SiteBuilder};
pub use config::{Config, ConfigError};
pub use error::{BlockKind, ParseError};
pub use models::{
    Article, CodeBlockSpan, Diagnostic, DiagnosticSeverity, Document, FieldValue, Frontmatter,
    OptionValue, ProseSpan, RenderOptions, ShortcodeSpan, SiteIndex, Span, UnknownShortcodePolicy,
};

/// Parse a complete source file into a [`Document`].
///
/// Runs the full parse pipeline: loader, front-matter parser, block scanner.
/// Any failure aborts the document before rendering can start.
///
/// # Example
///
/// ```
/// let source = "+++\ntitle = \"Hello\"\nslug = \"hello\"\ndate = \"2024-06-01\"\n+++\nSome prose.\n";
///
/// let doc = papyr_core::parse_document(source).unwrap();
/// assert_eq!(doc.frontmatter.title, "Hello");
/// assert_eq!(doc.spans.len(), 1);
/// ```
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let split = loader::split_document(source)?;
    let frontmatter = frontmatter::parse_frontmatter(&split)?;
    let spans = scanner::scan_body(split.body, split.body_line)?;

    Ok(Document {
        frontmatter,
        spans,
        body: split.body.to_string(),
    })
}
