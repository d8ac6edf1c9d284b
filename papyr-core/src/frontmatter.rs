//! Front-matter decoding into the typed metadata record.

use crate::error::ParseError;
use crate::loader::{FrontMatterFormat, SplitDocument};
use crate::models::{FieldValue, Frontmatter};
use chrono::NaiveDate;

/// Decode a split document's front-matter block.
///
/// `title`, `slug`, and `date` are required; `type` is stored verbatim;
/// `categories` and `tags` keep their source order. Unknown fields are
/// retained, not rejected.
pub fn parse_frontmatter(split: &SplitDocument<'_>) -> Result<Frontmatter, ParseError> {
    let fields = match split.format {
        FrontMatterFormat::Toml => decode_toml(split)?,
        FrontMatterFormat::Yaml => decode_yaml(split)?,
    };
    build_frontmatter(fields, split)
}

/// Field list in source order, values flattened to scalars or string lists.
type Fields = Vec<(String, FieldValue)>;

fn decode_toml(split: &SplitDocument<'_>) -> Result<Fields, ParseError> {
    let table: toml::Table = split.raw_frontmatter.parse().map_err(|err: toml::de::Error| {
        let line = err
            .span()
            .map(|span| offset_to_line(split, span.start))
            .unwrap_or(split.frontmatter_line);
        ParseError::MalformedDocument {
            line,
            reason: err.message().to_string(),
        }
    })?;

    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_value_to_field(value)))
        .collect())
}

fn toml_value_to_field(value: toml::Value) -> FieldValue {
    match value {
        toml::Value::Array(items) => {
            FieldValue::List(items.into_iter().map(toml_scalar_to_string).collect())
        }
        other => FieldValue::Scalar(toml_scalar_to_string(other)),
    }
}

fn toml_scalar_to_string(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Datetime(d) => d.to_string(),
        other => other.to_string(),
    }
}

fn decode_yaml(split: &SplitDocument<'_>) -> Result<Fields, ParseError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(split.raw_frontmatter).map_err(|err| {
            let line = err
                .location()
                .map(|loc| split.frontmatter_line - 1 + loc.line())
                .unwrap_or(split.frontmatter_line);
            ParseError::MalformedDocument {
                line,
                reason: err.to_string(),
            }
        })?;

    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(ParseError::MalformedDocument {
            line: split.frontmatter_line,
            reason: "front matter must be a mapping of key/value fields".to_string(),
        });
    };

    Ok(mapping
        .into_iter()
        .map(|(key, value)| (yaml_scalar_to_string(key), yaml_value_to_field(value)))
        .collect())
}

fn yaml_value_to_field(value: serde_yaml::Value) -> FieldValue {
    match value {
        serde_yaml::Value::Sequence(items) => {
            FieldValue::List(items.into_iter().map(yaml_scalar_to_string).collect())
        }
        other => FieldValue::Scalar(yaml_scalar_to_string(other)),
    }
}

fn yaml_scalar_to_string(value: serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn build_frontmatter(fields: Fields, split: &SplitDocument<'_>) -> Result<Frontmatter, ParseError> {
    let mut title = None;
    let mut slug = None;
    let mut date = None;
    let mut post_type = None;
    let mut categories = Vec::new();
    let mut tags = Vec::new();
    let mut draft = false;
    let mut extra = Vec::new();

    for (key, value) in fields {
        match key.as_str() {
            "title" => title = Some(expect_scalar(&key, value, split)?),
            "slug" => slug = Some(expect_scalar(&key, value, split)?),
            "date" => {
                let raw = expect_scalar(&key, value, split)?;
                date = Some(parse_date(&raw, field_line(split, &key))?);
            }
            "type" => post_type = Some(expect_scalar(&key, value, split)?),
            "categories" => categories = expect_list(value),
            "tags" => tags = expect_list(value),
            "draft" => {
                let raw = expect_scalar(&key, value, split)?;
                draft = match raw.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(ParseError::InvalidField {
                            field: key.clone(),
                            line: field_line(split, &key),
                            reason: format!("expected true or false, found `{raw}`"),
                        })
                    }
                };
            }
            _ => extra.push((key, value)),
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ParseError::MissingField("title".to_string()))?;
    let slug = slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ParseError::MissingField("slug".to_string()))?;
    let date = date.ok_or_else(|| ParseError::MissingField("date".to_string()))?;

    Ok(Frontmatter {
        title,
        slug,
        date,
        post_type,
        categories,
        tags,
        draft,
        extra,
    })
}

fn expect_scalar(
    field: &str,
    value: FieldValue,
    split: &SplitDocument<'_>,
) -> Result<String, ParseError> {
    match value {
        FieldValue::Scalar(s) => Ok(s),
        FieldValue::List(_) => Err(ParseError::InvalidField {
            field: field.to_string(),
            line: field_line(split, field),
            reason: "expected a single value, found a list".to_string(),
        }),
    }
}

fn expect_list(value: FieldValue) -> Vec<String> {
    match value {
        FieldValue::List(items) => items,
        // A lone scalar reads as a one-element sequence.
        FieldValue::Scalar(s) => vec![s],
    }
}

/// `2023-10-22`, or an RFC 3339 datetime truncated to its date part.
fn parse_date(value: &str, line: usize) -> Result<NaiveDate, ParseError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if value.len() > 10 && value.is_char_boundary(10) {
        let (head, rest) = value.split_at(10);
        if rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Ok(date);
            }
        }
    }
    Err(ParseError::InvalidField {
        field: "date".to_string(),
        line,
        reason: format!("`{value}` is not a calendar date"),
    })
}

/// Locate a field's 1-based source line by scanning the raw block. Falls
/// back to the block's first line when the key can't be found (e.g. quoted
/// keys).
fn field_line(split: &SplitDocument<'_>, field: &str) -> usize {
    for (idx, line) in split.raw_frontmatter.lines().enumerate() {
        if let Some(rest) = line.trim_start().strip_prefix(field) {
            let rest = rest.trim_start();
            if rest.starts_with('=') || rest.starts_with(':') {
                return split.frontmatter_line + idx;
            }
        }
    }
    split.frontmatter_line
}

fn offset_to_line(split: &SplitDocument<'_>, offset: usize) -> usize {
    let offset = offset.min(split.raw_frontmatter.len());
    split.frontmatter_line + split.raw_frontmatter[..offset].matches('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::split_document;

    fn parse(source: &str) -> Result<Frontmatter, ParseError> {
        parse_frontmatter(&split_document(source).unwrap())
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let source = r#"+++
date = "2023-10-22"
slug = "go-pgo"
categories = ['go']
tags = ['go', 'performance']
title = "Exploring Profile-Guided Optimization"
type = "post"
+++
Body.
"#;

        let fm = parse(source).unwrap();
        assert_eq!(fm.title, "Exploring Profile-Guided Optimization");
        assert_eq!(fm.slug, "go-pgo");
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2023, 10, 22).unwrap());
        assert_eq!(fm.post_type.as_deref(), Some("post"));
        assert_eq!(fm.categories, vec!["go"]);
        assert_eq!(fm.tags, vec!["go", "performance"]);
        assert!(!fm.draft);
        assert!(fm.extra.is_empty());
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let source = r#"---
title: Hello
slug: hello
date: "2025-01-01"
tags:
  - rust
  - parsing
---
Body.
"#;

        let fm = parse(source).unwrap();
        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(fm.tags, vec!["rust", "parsing"]);
    }

    #[test]
    fn test_category_order_preserved() {
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\ndate = \"2023-01-01\"\ncategories = ['B', 'A', 'B']\n+++\n";
        let fm = parse(source).unwrap();
        assert_eq!(fm.categories, vec!["B", "A", "B"]);
    }

    #[test]
    fn test_unknown_fields_retained_in_order() {
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\ndate = \"2023-01-01\"\nseries = \"go-internals\"\nweight = 3\n+++\n";
        let fm = parse(source).unwrap();

        assert_eq!(
            fm.extra,
            vec![
                ("series".to_string(), FieldValue::Scalar("go-internals".to_string())),
                ("weight".to_string(), FieldValue::Scalar("3".to_string())),
            ]
        );
        assert_eq!(
            fm.extra_field("series").and_then(FieldValue::as_scalar),
            Some("go-internals")
        );
    }

    #[test]
    fn test_datetime_truncates_to_date() {
        let source =
            "+++\ntitle = \"x\"\nslug = \"x\"\ndate = \"2023-10-22T14:05:00+02:00\"\n+++\n";
        let fm = parse(source).unwrap();
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2023, 10, 22).unwrap());
    }

    #[test]
    fn test_unquoted_toml_date() {
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\ndate = 2023-10-22\n+++\n";
        let fm = parse(source).unwrap();
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2023, 10, 22).unwrap());
    }

    #[test]
    fn test_invalid_date_reports_field_line() {
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\ndate = \"next tuesday\"\n+++\n";
        match parse(source).unwrap_err() {
            ParseError::InvalidField { field, line, .. } => {
                assert_eq!(field, "date");
                assert_eq!(line, 4);
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\n+++\n";
        match parse(source).unwrap_err() {
            ParseError::MissingField(field) => assert_eq!(field, "date"),
            other => panic!("expected MissingField, got {other:?}"),
        }

        let source = "+++\nslug = \"x\"\ndate = \"2023-01-01\"\n+++\n";
        match parse(source).unwrap_err() {
            ParseError::MissingField(field) => assert_eq!(field, "title"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_title_is_missing() {
        let source = "+++\ntitle = \"  \"\nslug = \"x\"\ndate = \"2023-01-01\"\n+++\n";
        assert!(matches!(
            parse(source).unwrap_err(),
            ParseError::MissingField(field) if field == "title"
        ));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let source = "+++\ntitle = \"unclosed\nslug = \"x\"\n+++\n";
        match parse(source).unwrap_err() {
            ParseError::MalformedDocument { line, .. } => assert!(line >= 2),
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_where_list_expected() {
        // A lone string is accepted as a one-element sequence.
        let source = "+++\ntitle = \"x\"\nslug = \"x\"\ndate = \"2023-01-01\"\ntags = \"go\"\n+++\n";
        let fm = parse(source).unwrap();
        assert_eq!(fm.tags, vec!["go"]);
    }

    #[test]
    fn test_list_where_scalar_expected() {
        let source = "+++\ntitle = ['a', 'b']\nslug = \"x\"\ndate = \"2023-01-01\"\n+++\n";
        assert!(matches!(
            parse(source).unwrap_err(),
            ParseError::InvalidField { field, .. } if field == "title"
        ));
    }
}
