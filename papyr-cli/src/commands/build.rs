//! Build command implementation.

use anyhow::{Context, Result};
use askama::Template;
use chrono::Datelike;
use papyr_core::{Article, Config, SiteBuilder};
use papyr_render::{ArticleEntry, HtmlRenderer, IndexTemplate, PostTemplate};
use std::fs;
use std::path::Path;

/// Build the whole site: parse every source, render every article, write
/// the pages and the index listing.
pub fn build_site(config_path: &Path) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    tracing::info!("Building site: {}", config.site.title);

    let builder = SiteBuilder::new(config.clone());
    let index = builder.load().context("Failed to load content directory")?;

    for diag in &index.diagnostics {
        tracing::warn!(
            "{}: {} ({})",
            diag.source_path.as_deref().unwrap_or("<unknown>"),
            diag.message,
            diag.code
        );
    }

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let renderer = HtmlRenderer::from_config(&config);
    let base_url = config.normalized_base_url();
    let year = current_year();

    let mut rendered = 0usize;
    let mut failed = index.error_count();
    let mut entries: Vec<ArticleEntry> = Vec::new();

    for article in index.published() {
        match render_article_page(&config, &renderer, article, &base_url, year) {
            Ok(page) => {
                let out_path = output_dir.join(article.output_rel_path());
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {parent:?}"))?;
                }
                fs::write(&out_path, page)
                    .with_context(|| format!("Failed to write {out_path:?}"))?;

                entries.push(ArticleEntry {
                    url: article.url_with_base(&base_url),
                    title: article.document.frontmatter.title.clone(),
                    date: article.document.frontmatter.date.to_string(),
                });
                rendered += 1;
            }
            Err(err) => {
                tracing::error!("Failed to render {}: {}", article.source_path, err);
                failed += 1;
            }
        }
    }

    write_index_page(&config, &output_dir, entries, year)?;

    if failed > 0 {
        tracing::warn!("Rendered {} articles, {} failed", rendered, failed);
    } else {
        tracing::info!("Rendered {} articles", rendered);
    }

    Ok(())
}

fn render_article_page(
    config: &Config,
    renderer: &HtmlRenderer,
    article: &Article,
    base_url: &str,
    year: i32,
) -> Result<String> {
    let content = renderer.render_document(&article.document)?;
    let fm = &article.document.frontmatter;

    PostTemplate {
        title: fm.title.clone(),
        date: fm.date.format("%B %-d, %Y").to_string(),
        categories: fm.categories.clone(),
        tags: fm.tags.clone(),
        content,
        site_title: config.site.title.clone(),
        site_author: config.site.author.clone(),
        year,
        base_url: base_url.to_string(),
    }
    .render()
    .context("Failed to render post template")
}

fn write_index_page(
    config: &Config,
    output_dir: &Path,
    entries: Vec<ArticleEntry>,
    year: i32,
) -> Result<()> {
    // `SiteIndex::published` already ordered these newest first.
    let page = IndexTemplate {
        site_title: config.site.title.clone(),
        site_description: config.site.description.clone(),
        site_author: config.site.author.clone(),
        year,
        articles: entries,
    }
    .render()
    .context("Failed to render index template")?;

    let path = output_dir.join("index.html");
    fs::write(&path, page).with_context(|| format!("Failed to write {path:?}"))
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}
