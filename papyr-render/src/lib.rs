//! # papyr-render
//!
//! HTML rendering for papyr documents: prose through pulldown-cmark, code
//! blocks through syntect, shortcode blocks through a name-indexed handler
//! registry, pages through Askama templates.

pub mod highlight;
pub mod markdown;
pub mod shortcodes;
pub mod templates;

use papyr_core::{Config, Document, Span, UnknownShortcodePolicy};
use thiserror::Error;

pub use highlight::Highlighter;
pub use markdown::MarkdownConverter;
pub use shortcodes::{ShortcodeHandler, ShortcodeRegistry};
pub use templates::{ArticleEntry, IndexTemplate, PostTemplate};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("line {line}: unknown shortcode `{name}`")]
    UnknownShortcode { name: String, line: usize },
}

/// Renders a parsed document's spans to HTML, preserving source order.
pub struct HtmlRenderer {
    markdown: MarkdownConverter,
    highlighter: Highlighter,
    shortcodes: ShortcodeRegistry,
    unknown_policy: UnknownShortcodePolicy,
}

impl HtmlRenderer {
    /// A renderer with the built-in shortcodes, the default highlight theme,
    /// and the abort policy for unknown shortcodes.
    pub fn new() -> Self {
        Self {
            markdown: MarkdownConverter::new(),
            highlighter: Highlighter::new(),
            shortcodes: ShortcodeRegistry::with_builtins(),
            unknown_policy: UnknownShortcodePolicy::Abort,
        }
    }

    /// A renderer configured from the site config (theme, unknown-shortcode
    /// policy).
    pub fn from_config(config: &Config) -> Self {
        Self {
            highlighter: Highlighter::with_theme(&config.highlight_theme),
            unknown_policy: config.unknown_shortcodes,
            ..Self::new()
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownShortcodePolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn register_shortcode<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&papyr_core::ShortcodeSpan, &str) -> String + Send + Sync + 'static,
    {
        self.shortcodes.register(name, handler);
    }

    /// Render a document's body. Fails before emitting anything if an
    /// unknown shortcode is hit under the abort policy.
    pub fn render_document(&self, document: &Document) -> Result<String, RenderError> {
        self.render_spans(&document.spans, &document.body)
    }

    /// Render spans against the body text they were scanned from (needed to
    /// re-emit raw source under the skip policy).
    pub fn render_spans(&self, spans: &[Span], body: &str) -> Result<String, RenderError> {
        let mut output = String::new();

        for span in spans {
            match span {
                Span::Prose(prose) => push_block(&mut output, &self.markdown.convert(&prose.text)),
                Span::CodeBlock(code) => push_block(&mut output, &self.highlighter.render(code)),
                Span::Shortcode(sc) => match self.shortcodes.get(&sc.name) {
                    Some(handler) => {
                        let body_html = if sc.body.trim().is_empty() {
                            String::new()
                        } else {
                            self.markdown.convert(&sc.body)
                        };
                        push_block(&mut output, &handler(sc, &body_html));
                    }
                    None => match self.unknown_policy {
                        UnknownShortcodePolicy::Abort => {
                            return Err(RenderError::UnknownShortcode {
                                name: sc.name.clone(),
                                line: sc.line,
                            })
                        }
                        UnknownShortcodePolicy::Skip => {
                            tracing::warn!(
                                "Skipping unknown shortcode `{}` at line {}",
                                sc.name,
                                sc.line
                            );
                            let raw = body.get(sc.range.clone()).unwrap_or("");
                            push_block(
                                &mut output,
                                &format!(
                                    "<pre class=\"raw-shortcode\">{}</pre>\n",
                                    shortcodes::html_escape(raw)
                                ),
                            );
                        }
                    },
                },
            }
        }

        Ok(output)
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn push_block(output: &mut String, block: &str) {
    output.push_str(block);
    if !block.is_empty() && !block.ends_with('\n') {
        output.push('\n');
    }
}
