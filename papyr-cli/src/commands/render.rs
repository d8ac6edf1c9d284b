//! Render command: one source file to HTML.

use anyhow::{Context, Result};
use askama::Template;
use chrono::Datelike;
use papyr_core::{parse_document, Config};
use papyr_render::{HtmlRenderer, PostTemplate};
use std::fs;
use std::path::Path;

/// Render a single article. Uses the site config when it exists, defaults
/// otherwise, so one-off files render without a project around them.
pub fn render_file(
    config_path: &Path,
    file: &Path,
    output: Option<&Path>,
    standalone: bool,
) -> Result<()> {
    let config = if config_path.exists() {
        Config::from_file(config_path).context("Failed to load configuration")?
    } else {
        Config::default()
    };

    let source =
        fs::read_to_string(file).with_context(|| format!("Failed to read {file:?}"))?;
    let document = parse_document(&source)
        .map_err(|err| anyhow::anyhow!("{}: {}", file.display(), err))?;

    let renderer = HtmlRenderer::from_config(&config);
    let content = renderer.render_document(&document)?;

    let html = if standalone {
        let fm = &document.frontmatter;
        PostTemplate {
            title: fm.title.clone(),
            date: fm.date.format("%B %-d, %Y").to_string(),
            categories: fm.categories.clone(),
            tags: fm.tags.clone(),
            content,
            site_title: config.site.title.clone(),
            site_author: config.site.author.clone(),
            year: chrono::Utc::now().year(),
            base_url: config.normalized_base_url(),
        }
        .render()
        .context("Failed to render post template")?
    } else {
        content
    };

    match output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {path:?}"))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => print!("{html}"),
    }

    Ok(())
}
