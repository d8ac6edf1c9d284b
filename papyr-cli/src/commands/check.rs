//! Check command: parse and render everything, report diagnostics, write
//! nothing.

use anyhow::{bail, Context, Result};
use papyr_core::{Config, Diagnostic, DiagnosticSeverity, SiteBuilder};
use papyr_render::HtmlRenderer;
use std::path::Path;

pub fn check_site(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let builder = SiteBuilder::new(config.clone());
    let index = builder.load().context("Failed to load content directory")?;

    let mut diagnostics = index.diagnostics.clone();

    // Dry-run the renderer so unknown shortcodes surface here too.
    let renderer = HtmlRenderer::from_config(&config);
    for article in &index.articles {
        if let Err(err) = renderer.render_document(&article.document) {
            diagnostics.push(Diagnostic {
                code: "render.unknown-shortcode".to_string(),
                message: err.to_string(),
                severity: DiagnosticSeverity::Error,
                source_path: Some(article.source_path.clone()),
                line: None,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        for diag in &diagnostics {
            let severity = match diag.severity {
                DiagnosticSeverity::Error => "error",
                DiagnosticSeverity::Warning => "warning",
            };
            println!(
                "{severity}: {}: {} ({})",
                diag.source_path.as_deref().unwrap_or("<unknown>"),
                diag.message,
                diag.code
            );
        }
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == DiagnosticSeverity::Error)
        .count();
    if errors > 0 {
        bail!("{} problem(s) found", errors);
    }

    if !json {
        println!("ok: {} article(s) checked", index.articles.len());
    }
    Ok(())
}
