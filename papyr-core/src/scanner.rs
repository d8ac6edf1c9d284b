//! Body scanning into ordered prose, code, and shortcode spans.
//!
//! The scan is line-oriented: delimiter lines are recognized at column zero,
//! everything else is prose. Two delimiter families exist, ``` fences and
//! `{{< name ... >}}` shortcode markers; `highlight` shortcodes are lowered
//! to code-block spans so the renderer has a single code path. Span byte
//! ranges tile the body exactly.

use crate::error::{BlockKind, ParseError};
use crate::models::{
    CodeBlockSpan, OptionValue, ProseSpan, RenderOptions, ShortcodeSpan, Span,
};
use regex::Regex;
use std::sync::OnceLock;

fn shortcode_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\{\{<\s*(?P<name>[A-Za-z][A-Za-z0-9_-]*)(?P<args>\s+.*?)?\s*>\}\}$")
            .expect("valid regex")
    })
}

fn shortcode_self_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\{\{<\s*(?P<name>[A-Za-z][A-Za-z0-9_-]*)(?P<args>\s+.*?)?\s*/>\}\}$")
            .expect("valid regex")
    })
}

fn shortcode_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\{\{<\s*/\s*(?P<name>[A-Za-z][A-Za-z0-9_-]*)\s*>\}\}$").expect("valid regex")
    })
}

fn fence_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<marker>`{3,})(?P<info>[^`]*)$").expect("valid regex"))
}

/// Scan a body into spans. `first_line` is the 1-based source line of the
/// body's first line (from the loader), so errors point into the original
/// file.
pub fn scan_body(body: &str, first_line: usize) -> Result<Vec<Span>, ParseError> {
    let lines = collect_lines(body, first_line);
    let mut spans = Vec::new();
    let mut prose_start: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        match classify(lines[i].raw, lines[i].number)? {
            LineToken::Plain => {
                prose_start.get_or_insert(i);
                i += 1;
            }
            LineToken::FenceOpen { marker_len, language } => {
                flush_prose(&lines, &mut prose_start, i, &mut spans);
                let close = (i + 1..lines.len())
                    .find(|&j| fence_close_len(lines[j].raw).is_some_and(|len| len >= marker_len))
                    .ok_or(ParseError::UnterminatedBlock {
                        kind: BlockKind::Fence,
                        line: lines[i].number,
                    })?;
                spans.push(Span::CodeBlock(CodeBlockSpan {
                    language,
                    content: join_lines(&lines, i + 1, close),
                    options: RenderOptions::new(),
                    line: lines[i].number,
                    range: lines[i].start..line_end(&lines[close]),
                }));
                i = close + 1;
            }
            LineToken::ShortcodeOpen { name, args } => {
                flush_prose(&lines, &mut prose_start, i, &mut spans);
                // Flat matching: the nearest close marker for this name wins.
                let close = (i + 1..lines.len())
                    .find(|&j| {
                        shortcode_close_regex()
                            .captures(lines[j].raw.trim_end())
                            .is_some_and(|caps| &caps["name"] == name)
                    })
                    .ok_or(ParseError::UnterminatedBlock {
                        kind: BlockKind::Shortcode,
                        line: lines[i].number,
                    })?;
                let body = join_lines(&lines, i + 1, close);
                let range = lines[i].start..line_end(&lines[close]);
                spans.push(make_shortcode_span(&name, &args, body, lines[i].number, range));
                i = close + 1;
            }
            LineToken::ShortcodeSelfClose { name, args } => {
                flush_prose(&lines, &mut prose_start, i, &mut spans);
                let range = lines[i].start..line_end(&lines[i]);
                spans.push(make_shortcode_span(
                    &name,
                    &args,
                    String::new(),
                    lines[i].number,
                    range,
                ));
                i += 1;
            }
            LineToken::ShortcodeClose { name } => {
                return Err(ParseError::MalformedDocument {
                    line: lines[i].number,
                    reason: format!(
                        "closing marker `{{{{< /{name} >}}}}` has no matching opening marker"
                    ),
                });
            }
        }
    }

    flush_prose(&lines, &mut prose_start, lines.len(), &mut spans);
    Ok(spans)
}

struct SourceLine<'a> {
    /// Verbatim, including the trailing newline where the source has one.
    raw: &'a str,
    start: usize,
    number: usize,
}

fn line_end(line: &SourceLine<'_>) -> usize {
    line.start + line.raw.len()
}

fn collect_lines(body: &str, first_line: usize) -> Vec<SourceLine<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (idx, raw) in body.split_inclusive('\n').enumerate() {
        lines.push(SourceLine {
            raw,
            start,
            number: first_line + idx,
        });
        start += raw.len();
    }
    lines
}

fn join_lines(lines: &[SourceLine<'_>], from: usize, to: usize) -> String {
    lines[from..to].iter().map(|l| l.raw).collect()
}

fn flush_prose(
    lines: &[SourceLine<'_>],
    prose_start: &mut Option<usize>,
    end: usize,
    spans: &mut Vec<Span>,
) {
    if let Some(start) = prose_start.take() {
        spans.push(Span::Prose(ProseSpan {
            text: join_lines(lines, start, end),
            line: lines[start].number,
            range: lines[start].start..lines[end - 1].start + lines[end - 1].raw.len(),
        }));
    }
}

enum LineToken {
    Plain,
    FenceOpen {
        marker_len: usize,
        language: Option<String>,
    },
    ShortcodeOpen {
        name: String,
        args: String,
    },
    ShortcodeSelfClose {
        name: String,
        args: String,
    },
    ShortcodeClose {
        name: String,
    },
}

fn classify(raw: &str, number: usize) -> Result<LineToken, ParseError> {
    let line = raw.trim_end();

    let fence = fence_open_regex().captures(line);
    let close = shortcode_close_regex().captures(line);
    let self_close = shortcode_self_close_regex().captures(line);
    let open = shortcode_open_regex().captures(line);

    // The two delimiter families are syntactically distinct; a line matching
    // both is a contract violation, not a tie to break.
    if fence.is_some() && (close.is_some() || self_close.is_some() || open.is_some()) {
        return Err(ParseError::MalformedDocument {
            line: number,
            reason: "line matches both a code fence and a shortcode delimiter".to_string(),
        });
    }

    if let Some(caps) = close {
        return Ok(LineToken::ShortcodeClose {
            name: caps["name"].to_string(),
        });
    }
    if let Some(caps) = self_close {
        return Ok(LineToken::ShortcodeSelfClose {
            name: caps["name"].to_string(),
            args: caps.name("args").map_or(String::new(), |m| m.as_str().to_string()),
        });
    }
    if let Some(caps) = open {
        return Ok(LineToken::ShortcodeOpen {
            name: caps["name"].to_string(),
            args: caps.name("args").map_or(String::new(), |m| m.as_str().to_string()),
        });
    }
    if let Some(caps) = fence {
        let info = caps["info"].trim();
        return Ok(LineToken::FenceOpen {
            marker_len: caps["marker"].len(),
            language: info.split_whitespace().next().map(str::to_string),
        });
    }

    Ok(LineToken::Plain)
}

/// A closing fence: a line of nothing but backticks, at least three.
fn fence_close_len(raw: &str) -> Option<usize> {
    let line = raw.trim_end();
    (line.len() >= 3 && line.bytes().all(|b| b == b'`')).then(|| line.len())
}

fn make_shortcode_span(
    name: &str,
    args: &str,
    body: String,
    line: usize,
    range: std::ops::Range<usize>,
) -> Span {
    let options = parse_shortcode_args(args);
    if name == "highlight" {
        let (language, options) = lower_highlight_args(options);
        Span::CodeBlock(CodeBlockSpan {
            language,
            content: body,
            options,
            line,
            range,
        })
    } else {
        Span::Shortcode(ShortcodeSpan {
            name: name.to_string(),
            options,
            body,
            line,
            range,
        })
    }
}

/// Parse a shortcode argument list: space-separated `key=value` pairs and
/// bare flags, with single or double quotes grouping spaces.
fn parse_shortcode_args(input: &str) -> RenderOptions {
    let mut options = RenderOptions::new();
    let mut iter = input.chars().peekable();

    loop {
        while iter.peek().is_some_and(|c| c.is_whitespace()) {
            iter.next();
        }
        if iter.peek().is_none() {
            break;
        }

        let mut token = String::new();
        let mut eq_at: Option<usize> = None;
        let mut quote: Option<char> = None;

        while let Some(&c) = iter.peek() {
            match quote {
                Some(q) => {
                    iter.next();
                    if c == q {
                        quote = None;
                    } else {
                        token.push(c);
                    }
                }
                None => {
                    if c.is_whitespace() {
                        break;
                    }
                    iter.next();
                    match c {
                        '"' | '\'' => quote = Some(c),
                        '=' if eq_at.is_none() => {
                            eq_at = Some(token.len());
                            token.push(c);
                        }
                        _ => token.push(c),
                    }
                }
            }
        }

        match eq_at {
            Some(idx) => {
                let value = token[idx + 1..].to_string();
                token.truncate(idx);
                options.set(token, value);
            }
            None => options.set_flag(token),
        }
    }

    options
}

/// `{{< highlight go "linenos=table,linenostart=1" >}}`: the first bare token
/// is the language; a quoted option string unpacks comma-separated
/// `key=value` pieces; explicit `key=value` args pass through.
fn lower_highlight_args(args: RenderOptions) -> (Option<String>, RenderOptions) {
    let mut language = None;
    let mut options = RenderOptions::new();

    for (key, value) in args {
        match value {
            OptionValue::Flag => {
                if language.is_none() && !key.contains('=') && !key.contains(',') {
                    language = Some(key);
                } else {
                    merge_packed_options(&mut options, &key);
                }
            }
            OptionValue::Value(value) => options.set(key, value),
        }
    }

    (language, options)
}

fn merge_packed_options(options: &mut RenderOptions, packed: &str) {
    for piece in packed.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match piece.split_once('=') {
            Some((key, value)) => options.set(key.trim(), value.trim()),
            None => options.set_flag(piece),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(body: &str) -> Vec<Span> {
        scan_body(body, 1).unwrap()
    }

    #[test]
    fn test_prose_only_coalesces() {
        let body = "First paragraph.\n\nSecond paragraph\nacross two lines.\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::Prose(p) => {
                assert_eq!(p.text, body);
                assert_eq!(p.line, 1);
            }
            other => panic!("expected prose, got {other:?}"),
        }
    }

    #[test]
    fn test_highlight_shortcode_becomes_code_block() {
        let body = "Intro.\n{{< highlight go \"linenos=table,linenostart=1\" >}}\nfunc main() {}\n{{< / highlight >}}\nOutro.\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 3);
        match &spans[1] {
            Span::CodeBlock(cb) => {
                assert_eq!(cb.language.as_deref(), Some("go"));
                assert_eq!(cb.content, "func main() {}\n");
                assert_eq!(cb.options.get("linenos"), Some("table"));
                assert_eq!(cb.options.get("linenostart"), Some("1"));
                assert_eq!(cb.line, 2);
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_highlight_without_options() {
        let body = "{{< highlight text >}}\n$ go test -bench=.\n{{< /highlight >}}\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::CodeBlock(cb) => {
                assert_eq!(cb.language.as_deref(), Some("text"));
                assert_eq!(cb.content, "$ go test -bench=.\n");
                assert!(cb.options.is_empty());
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_fence_with_language() {
        let body = "```rust\nfn main() {}\n```\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::CodeBlock(cb) => {
                assert_eq!(cb.language.as_deref(), Some("rust"));
                assert_eq!(cb.content, "fn main() {}\n");
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_fence_markers_inside_shortcode_stay_verbatim() {
        let body = "{{< highlight md >}}\n```\nnested\n```\n{{< /highlight >}}\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::CodeBlock(cb) => assert_eq!(cb.content, "```\nnested\n```\n"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_shortcode_markers_inside_fence_stay_verbatim() {
        let body = "```\n{{< note >}}\n```\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::CodeBlock(cb) => assert_eq!(cb.content, "{{< note >}}\n"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_named_shortcode_with_options() {
        let body = "{{< note title=\"Heads up\" collapsible >}}\nInner *markdown*.\n{{< /note >}}\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::Shortcode(sc) => {
                assert_eq!(sc.name, "note");
                assert_eq!(sc.options.get("title"), Some("Heads up"));
                assert!(sc.options.is_set("collapsible"));
                assert_eq!(sc.body, "Inner *markdown*.\n");
            }
            other => panic!("expected shortcode, got {other:?}"),
        }
    }

    #[test]
    fn test_self_closing_shortcode() {
        let body = "{{< figure src=\"pgo.svg\" caption=\"CPU profile\" />}}\n";
        let spans = scan(body);

        assert_eq!(spans.len(), 1);
        match &spans[0] {
            Span::Shortcode(sc) => {
                assert_eq!(sc.name, "figure");
                assert_eq!(sc.options.get("src"), Some("pgo.svg"));
                assert_eq!(sc.options.get("caption"), Some("CPU profile"));
                assert!(sc.body.is_empty());
            }
            other => panic!("expected shortcode, got {other:?}"),
        }
    }

    #[test]
    fn test_spans_tile_the_body() {
        let body = "Intro prose.\n\n{{< highlight go >}}\npackage main\n{{< /highlight >}}\n\nMiddle.\n```sh\nls\n```\nTail without newline";
        let spans = scan(body);

        let rebuilt: String = spans.iter().map(|s| &body[s.range()]).collect();
        assert_eq!(rebuilt, body);

        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.range().start, expected_start);
            expected_start = span.range().end;
        }
        assert_eq!(expected_start, body.len());
    }

    #[test]
    fn test_unterminated_fence_reports_opening_line() {
        let body = "Prose.\n\n```go\nfunc main() {}\n";
        match scan_body(body, 1).unwrap_err() {
            ParseError::UnterminatedBlock { kind, line } => {
                assert_eq!(kind, BlockKind::Fence);
                assert_eq!(line, 3);
            }
            other => panic!("expected UnterminatedBlock, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_shortcode_reports_opening_line() {
        let body = "{{< note >}}\nnever closed\n";
        match scan_body(body, 10).unwrap_err() {
            ParseError::UnterminatedBlock { kind, line } => {
                assert_eq!(kind, BlockKind::Shortcode);
                assert_eq!(line, 10);
            }
            other => panic!("expected UnterminatedBlock, got {other:?}"),
        }
    }

    #[test]
    fn test_close_without_open() {
        let body = "{{< /note >}}\n";
        assert!(matches!(
            scan_body(body, 1).unwrap_err(),
            ParseError::MalformedDocument { line: 1, .. }
        ));
    }

    #[test]
    fn test_close_of_other_name_does_not_match() {
        let body = "{{< note >}}\nbody\n{{< /warning >}}\n";
        assert!(matches!(
            scan_body(body, 1).unwrap_err(),
            ParseError::UnterminatedBlock { kind: BlockKind::Shortcode, line: 1 }
        ));
    }

    #[test]
    fn test_inline_shortcode_is_prose() {
        // Markers are only recognized as whole lines.
        let body = "See {{< ref \"other\" >}} for details.\n";
        let spans = scan(body);
        assert!(matches!(&spans[0], Span::Prose(_)));
    }

    #[test]
    fn test_empty_body() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_longer_close_fence_matches() {
        let body = "```\ncode\n`````\n";
        let spans = scan(body);
        assert_eq!(spans.len(), 1);
        assert!(matches!(&spans[0], Span::CodeBlock(_)));
    }

    #[test]
    fn test_parse_args_quoting() {
        let opts = parse_shortcode_args(" src=\"a b.png\" alt='x y' bare \"k=v,w\" ");
        assert_eq!(opts.get("src"), Some("a b.png"));
        assert_eq!(opts.get("alt"), Some("x y"));
        assert!(opts.is_set("bare"));
        // Quoted token: the '=' inside stays part of the flag name.
        assert!(opts.is_set("k=v,w"));
    }
}
