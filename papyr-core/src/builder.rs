//! Batch discovery and parsing of article sources.
//!
//! One malformed document never stops the batch: failures become
//! diagnostics and the remaining sources still load.

use crate::config::Config;
use crate::error::ParseError;
use crate::models::{Article, Diagnostic, DiagnosticSeverity, SiteIndex};
use crate::parse_document;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Walks the content directory and parses every article source.
pub struct SiteBuilder {
    config: Config,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse all sources into a [`SiteIndex`].
    pub fn load(&self) -> Result<SiteIndex, BuildError> {
        let sources = self.discover_sources()?;

        tracing::info!("Found {} article sources", sources.len());

        let content_dir = self.config.content_dir();
        let mut articles: Vec<Article> = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut seen_slugs: HashMap<String, String> = HashMap::new();

        for path in &sources {
            let rel = path
                .strip_prefix(&content_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => {
                    tracing::error!("Failed to read {:?}: {}", path, err);
                    diagnostics.push(Diagnostic {
                        code: "io.read".to_string(),
                        message: err.to_string(),
                        severity: DiagnosticSeverity::Error,
                        source_path: Some(rel),
                        line: None,
                    });
                    continue;
                }
            };

            match parse_document(&source) {
                Ok(document) => {
                    let slug = document.frontmatter.slug.clone();
                    if let Some(existing) = seen_slugs.get(&slug) {
                        tracing::warn!("Duplicate slug `{}` in {}", slug, rel);
                        diagnostics.push(Diagnostic {
                            code: "slug.duplicate".to_string(),
                            message: format!(
                                "slug `{slug}` already used by {existing}"
                            ),
                            severity: DiagnosticSeverity::Error,
                            source_path: Some(rel),
                            line: None,
                        });
                        continue;
                    }
                    seen_slugs.insert(slug, rel.clone());
                    articles.push(Article {
                        document,
                        source_path: rel,
                    });
                }
                Err(err) => {
                    tracing::error!("Failed to parse {:?}: {}", path, err);
                    diagnostics.push(parse_diagnostic(&err, rel));
                }
            }
        }

        Ok(SiteIndex {
            articles,
            diagnostics,
        })
    }

    /// Discover all article sources in the content directory, in a stable
    /// order.
    fn discover_sources(&self) -> Result<Vec<PathBuf>, BuildError> {
        let content_dir = self.config.content_dir();
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);
        let mut sources = Vec::new();

        for entry in WalkDir::new(&content_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if !is_markdown(entry.path()) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&content_dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }

            sources.push(entry.path().to_path_buf());
        }

        Ok(sources)
    }
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

fn parse_diagnostic(err: &ParseError, source_path: String) -> Diagnostic {
    let code = match err {
        ParseError::MalformedDocument { .. } => "parse.malformed",
        ParseError::MissingField(_) => "frontmatter.missing-field",
        ParseError::InvalidField { .. } => "frontmatter.invalid-field",
        ParseError::UnterminatedBlock { .. } => "parse.unterminated-block",
    };

    Diagnostic {
        code: code.to_string(),
        message: err.to_string(),
        severity: DiagnosticSeverity::Error,
        source_path: Some(source_path),
        line: err.line(),
    }
}
