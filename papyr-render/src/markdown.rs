//! Prose conversion through pulldown-cmark.

use pulldown_cmark::{html, Options, Parser};

/// Markdown-to-HTML converter for prose spans and shortcode bodies.
pub struct MarkdownConverter {
    options: Options,
}

impl MarkdownConverter {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    pub fn convert(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}
