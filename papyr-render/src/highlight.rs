//! Code syntax highlighting using syntect.
//!
//! Highlighting runs line by line so the rendering hints attached to a code
//! block (`linenos`, `linenostart`, `hl_lines`) can be applied per line.

use papyr_core::{CodeBlockSpan, RenderOptions};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Highlighter for code-block spans.
pub struct Highlighter {
    theme: Theme,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::with_theme("InspiredGitHub")
    }

    /// Use a named theme from the syntect defaults, falling back to a light
    /// theme when the name is unknown.
    pub fn with_theme(name: &str) -> Self {
        let themes = &theme_set().themes;
        let theme = match themes.get(name) {
            Some(theme) => theme.clone(),
            None => {
                tracing::warn!("Unknown highlight theme '{}', using default", name);
                themes
                    .get("InspiredGitHub")
                    .or_else(|| themes.values().next())
                    .cloned()
                    .unwrap_or_default()
            }
        };

        Self { theme }
    }

    /// Render one code block to HTML, applying its rendering hints.
    pub fn render(&self, block: &CodeBlockSpan) -> String {
        let hints = RenderHints::from_options(&block.options);

        match block.language.as_deref() {
            Some(lang) => self
                .highlighted(lang, &block.content, &hints)
                .unwrap_or_else(|| plain_block(Some(lang), &block.content, &hints)),
            None => plain_block(None, &block.content, &hints),
        }
    }

    fn highlighted(&self, lang: &str, code: &str, hints: &RenderHints) -> Option<String> {
        let ss = syntax_set();
        let syntax = ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_extension(lang))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut body = String::new();

        for (idx, line) in LinesWithEndings::from(code).enumerate() {
            let regions = highlighter.highlight_line(line, ss).ok()?;
            let line_html = styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()?;
            push_line(&mut body, &line_html, idx, hints);
        }

        Some(format!(
            "<div class=\"highlight\"><pre><code class=\"language-{}\">{}</code></pre></div>\n",
            html_escape(lang),
            body
        ))
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// The subset of code-block options this collaborator understands. Anything
/// else stays in the span untouched.
struct RenderHints {
    linenos: bool,
    linenostart: usize,
    hl_lines: Vec<usize>,
}

impl RenderHints {
    fn from_options(options: &RenderOptions) -> Self {
        Self {
            linenos: options.is_set("linenos") && options.get("linenos") != Some("false"),
            linenostart: options
                .get("linenostart")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            hl_lines: options.get("hl_lines").map_or_else(Vec::new, parse_hl_lines),
        }
    }

    fn number(&self, idx: usize) -> usize {
        self.linenostart + idx
    }

    /// Marked lines are 1-based offsets into the block, independent of
    /// `linenostart`.
    fn is_marked(&self, idx: usize) -> bool {
        self.hl_lines.contains(&(idx + 1))
    }
}

/// `"3 5-7"` or `"3,5-7"` into the 1-based offsets to mark.
fn parse_hl_lines(value: &str) -> Vec<usize> {
    let mut out = Vec::new();
    for part in value.split([',', ' ']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((a, b)) = part.split_once('-') {
            if let (Ok(a), Ok(b)) = (a.trim().parse::<usize>(), b.trim().parse::<usize>()) {
                if a <= b {
                    out.extend(a..=b);
                }
            }
        } else if let Ok(n) = part.parse::<usize>() {
            out.push(n);
        }
    }
    out
}

fn push_line(body: &mut String, line_html: &str, idx: usize, hints: &RenderHints) {
    let class = if hints.is_marked(idx) { "line hl" } else { "line" };
    body.push_str(&format!("<span class=\"{class}\">"));
    if hints.linenos {
        body.push_str(&format!(
            "<span class=\"lineno\">{}</span>",
            hints.number(idx)
        ));
    }
    body.push_str(line_html);
    body.push_str("</span>");
}

fn plain_block(language: Option<&str>, code: &str, hints: &RenderHints) -> String {
    let mut body = String::new();
    for (idx, line) in LinesWithEndings::from(code).enumerate() {
        push_line(&mut body, &html_escape(line), idx, hints);
    }

    match language {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(lang),
            body
        ),
        None => format!("<pre><code>{body}</code></pre>\n"),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
