//! # Assistant Markup Parser
//!
//! File: cli/src/chat/render/markup.rs
//!
//! ## Overview
//!
//! Assistant replies may carry a tiny markdown-like dialect:
//!
//! - `**text**` → bold
//! - `[label](url)` → link
//! - a literal newline → line break
//!
//! Parsing produces a flat list of typed `Span`s that back-ends turn into
//! HTML or terminal text. The scan is a single left-to-right pass: once a
//! construct matches, its inner text is taken verbatim and never scanned
//! again, so `**[a](b)**` is bold text reading `[a](b)`.
//!
//! Bold text, link labels, and link targets cannot span lines. Link targets
//! must use an allowed scheme (`http`, `https`, `mailto`, `tel`) or be
//! relative; anything else stays literal text.
//!
use serde::Serialize;
use tracing::warn;

/// One typed piece of rendered message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Span {
    Text { text: String },
    Bold { text: String },
    Link { label: String, href: String },
    Break,
}

impl Span {
    pub fn text(text: impl Into<String>) -> Self {
        Span::Text { text: text.into() }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Span::Bold { text: text.into() }
    }

    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Span::Link {
            label: label.into(),
            href: href.into(),
        }
    }
}

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Removes the characters that open bold or link markup and folds line
/// breaks into spaces, so the text reads as plain prose when it is placed
/// inside assistant markup.
pub fn strip_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '[' | ']'))
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Parses assistant markup into spans.
pub fn parse_markup(content: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut rest = content;

    while let Some(ch) = rest.chars().next() {
        if let Some((span, consumed)) = match_bold(rest).or_else(|| match_link(rest)) {
            flush_text(&mut text, &mut spans);
            spans.push(span);
            rest = &rest[consumed..];
            continue;
        }
        if ch == '\n' {
            flush_text(&mut text, &mut spans);
            spans.push(Span::Break);
        } else {
            text.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    flush_text(&mut text, &mut spans);
    spans
}

fn flush_text(text: &mut String, spans: &mut Vec<Span>) {
    if !text.is_empty() {
        spans.push(Span::Text {
            text: std::mem::take(text),
        });
    }
}

/// `**inner**`, shortest match on a single line. Empty `inner` is allowed.
fn match_bold(input: &str) -> Option<(Span, usize)> {
    let body = input.strip_prefix("**")?;
    let end = body.find("**")?;
    let inner = &body[..end];
    if inner.contains('\n') {
        return None;
    }
    Some((Span::bold(inner), end + 4))
}

/// `[label](href)` with non-empty label and href.
fn match_link(input: &str) -> Option<(Span, usize)> {
    let body = input.strip_prefix('[')?;
    let label_end = body.find(']')?;
    let label = &body[..label_end];
    if label.is_empty() || label.contains('\n') {
        return None;
    }
    let target = body[label_end + 1..].strip_prefix('(')?;
    let href_end = target.find(')')?;
    let href = &target[..href_end];
    if href.is_empty() || href.contains('\n') {
        return None;
    }
    if !is_safe_href(href) {
        warn!("Ignoring link with disallowed target: {}", href);
        return None;
    }
    // '[' + label + "](" + href + ')'
    let consumed = 1 + label_end + 2 + href_end + 1;
    Some((Span::link(label, href), consumed))
}

/// True for relative targets and for the allowed absolute schemes.
pub fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    match href.find(':') {
        None => true,
        Some(colon) => {
            // A ':' after the first '/', '?' or '#' is part of a relative path.
            if href[..colon].contains(&['/', '?', '#'][..]) {
                return true;
            }
            let scheme = href[..colon].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_link_and_break() {
        let spans = parse_markup("**hi** [go](http://x)\nline2");
        assert_eq!(
            spans,
            vec![
                Span::bold("hi"),
                Span::text(" "),
                Span::link("go", "http://x"),
                Span::Break,
                Span::text("line2"),
            ]
        );
    }

    #[test]
    fn test_plain_text_is_single_span() {
        assert_eq!(parse_markup("just words"), vec![Span::text("just words")]);
        assert!(parse_markup("").is_empty());
    }

    #[test]
    fn test_bold_is_shortest_match() {
        assert_eq!(
            parse_markup("**a** and **b**"),
            vec![Span::bold("a"), Span::text(" and "), Span::bold("b")]
        );
        assert_eq!(parse_markup("***a**"), vec![Span::bold("*a")]);
    }

    #[test]
    fn test_unclosed_markup_stays_literal() {
        assert_eq!(parse_markup("**open"), vec![Span::text("**open")]);
        assert_eq!(parse_markup("[label](nowhere"), vec![Span::text("[label](nowhere")]);
        assert_eq!(parse_markup("[label] (x)"), vec![Span::text("[label] (x)")]);
    }

    #[test]
    fn test_bold_does_not_cross_lines() {
        assert_eq!(
            parse_markup("**a\nb**"),
            vec![Span::text("**a"), Span::Break, Span::text("b**")]
        );
    }

    #[test]
    fn test_inner_markup_not_rematched() {
        assert_eq!(parse_markup("**[a](/b)**"), vec![Span::bold("[a](/b)")]);
        assert_eq!(
            parse_markup("[**a**](/b)"),
            vec![Span::link("**a**", "/b")]
        );
    }

    #[test]
    fn test_unsafe_link_is_literal() {
        let spans = parse_markup("[click](javascript:alert(1))");
        assert!(spans.iter().all(|s| !matches!(s, Span::Link { .. })));
    }

    #[test]
    fn test_is_safe_href() {
        assert!(is_safe_href("https://eyogi.org/courses"));
        assert!(is_safe_href("mailto:office@eyogi.org"));
        assert!(is_safe_href("/courses?age=8"));
        assert!(is_safe_href("#fees"));
        assert!(is_safe_href("/search?q=a:b"));
        assert!(!is_safe_href("javascript:alert(1)"));
        assert!(!is_safe_href("DATA:text/html,x"));
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(
            parse_markup("🙏 **नमस्ते**"),
            vec![Span::text("🙏 "), Span::bold("नमस्ते")]
        );
    }

    #[test]
    fn test_strip_markup_leaves_plain_text() {
        let name = strip_markup("[x](https://evil.example) **Ravi**\nKumar");
        assert_eq!(name, "x(https://evil.example) Ravi Kumar");
        assert!(parse_markup(&name).iter().all(|s| matches!(s, Span::Text { .. })));
    }
}
