//! Name-indexed shortcode dispatch.
//!
//! The registry is plain data passed into the renderer, not ambient global
//! state. Handlers receive the span and its body already converted to HTML.

use papyr_core::ShortcodeSpan;
use std::collections::HashMap;

/// A shortcode handler: span in, HTML out.
pub type ShortcodeHandler = Box<dyn Fn(&ShortcodeSpan, &str) -> String + Send + Sync>;

/// Mapping from shortcode name to handler.
#[derive(Default)]
pub struct ShortcodeRegistry {
    handlers: HashMap<String, ShortcodeHandler>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in handlers: `note`, `warning`, `figure`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("note", |sc, body| admonition("note", "Note", sc, body));
        registry.register("warning", |sc, body| {
            admonition("warning", "Warning", sc, body)
        });
        registry.register("figure", |sc, _| figure(sc));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&ShortcodeSpan, &str) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&ShortcodeHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// Admonition panel; `title=` overrides the default heading.
fn admonition(kind: &str, default_title: &str, sc: &ShortcodeSpan, body_html: &str) -> String {
    let title = sc.options.get("title").unwrap_or(default_title);
    format!(
        "<div class=\"admonition admonition-{}\"><div class=\"admonition-title\">{}</div><div class=\"admonition-body\">{}</div></div>\n",
        html_escape(kind),
        html_escape(title),
        body_html
    )
}

/// Self-contained image figure with an optional caption.
fn figure(sc: &ShortcodeSpan) -> String {
    let src = sc.options.get("src").unwrap_or("");
    let alt = sc.options.get("alt").or_else(|| sc.options.get("caption")).unwrap_or("");

    let mut html = format!(
        "<figure><img src=\"{}\" alt=\"{}\">",
        html_escape(src),
        html_escape(alt)
    );
    if let Some(caption) = sc.options.get("caption") {
        html.push_str(&format!(
            "<figcaption>{}</figcaption>",
            html_escape(caption)
        ));
    }
    html.push_str("</figure>\n");
    html
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
