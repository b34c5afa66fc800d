//! # HTML Back-end
//!
//! File: cli/src/chat/render/html.rs
//!
//! Every piece of text and every attribute value is escaped; the only tags
//! emitted are the ones built here from typed spans.
//!
use super::{Badge, RenderedMessage, Span};
use crate::chat::message::Speaker;
use crate::core::templating::escape_html;
use std::fmt::Write;

pub fn spans_to_html(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text { text } => out.push_str(&escape_html(text)),
            Span::Bold { text } => {
                let _ = write!(out, "<strong>{}</strong>", escape_html(text));
            }
            Span::Link { label, href } => {
                let _ = write!(
                    out,
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                    escape_html(href),
                    escape_html(label)
                );
            }
            Span::Break => out.push_str("<br>"),
        }
    }
    out
}

fn badge_class(badge: &Badge) -> &'static str {
    match badge {
        Badge::Persona(_) => "badge badge-persona",
        Badge::Intent(_) => "badge badge-intent",
        Badge::Confidence(_) => "badge badge-confidence",
    }
}

pub fn message_to_html(message: &RenderedMessage) -> String {
    let speaker = match message.speaker {
        Speaker::User => "user",
        Speaker::Assistant => "assistant",
    };
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="message message-{}" data-id="{}">"#,
        speaker,
        escape_html(message.id.as_str())
    );
    let _ = write!(out, r#"<div class="content">{}</div>"#, spans_to_html(&message.body));

    if !message.badges.is_empty() {
        out.push_str(r#"<div class="meta">"#);
        for badge in &message.badges {
            let _ = write!(
                out,
                r#"<span class="{}">{}</span>"#,
                badge_class(badge),
                escape_html(&badge.label())
            );
        }
        out.push_str("</div>");
    }

    if let Some(fact) = &message.fact {
        let _ = write!(
            out,
            r#"<aside class="did-you-know"><strong>Did You Know?</strong><p>{}</p></aside>"#,
            escape_html(fact)
        );
    }

    let _ = write!(
        out,
        r#"<time datetime="{}">{}</time></div>"#,
        message.created_at.to_rfc3339(),
        escape_html(&message.display_time())
    );
    out
}

/// Full transcript, one message element per line.
pub fn transcript_to_html(messages: &[RenderedMessage]) -> String {
    let mut out = String::from(r#"<div class="chat-log">"#);
    out.push('\n');
    for message in messages {
        out.push_str(&message_to_html(message));
        out.push('\n');
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{Message, ReplyMeta};
    use crate::chat::render::{parse_markup, render_message};

    #[test]
    fn test_markup_round_trip() {
        let html = spans_to_html(&parse_markup("**hi** [go](http://x)\nline2"));
        assert_eq!(
            html,
            r#"<strong>hi</strong> <a href="http:&#x2F;&#x2F;x" target="_blank" rel="noopener noreferrer">go</a><br>line2"#
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let html = spans_to_html(&parse_markup("<script>alert(1)</script> & **<b>**"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<strong>&lt;b&gt;</strong>"));
        assert!(html.contains("&amp;"));
    }

    #[test]
    fn test_href_attribute_is_escaped() {
        let html = spans_to_html(&[Span::link("x", r#"/a"onmouseover="b"#)]);
        assert!(html.contains(r#"href="&#x2F;a&quot;onmouseover=&quot;b""#));
    }

    #[test]
    fn test_user_message_html_has_no_markup() {
        let html = message_to_html(&render_message(&Message::user("**not bold**")));
        assert!(html.contains("message-user"));
        assert!(!html.contains("<strong>"));
        assert!(html.contains("**not bold**"));
    }

    #[test]
    fn test_meta_and_fact_sections() {
        let msg = Message::assistant(
            "ok",
            ReplyMeta {
                persona: Some("parent".into()),
                intent: None,
                confidence: Some(1.0),
                supplementary_fact: Some("Om is a sacred sound.".into()),
            },
        );
        let html = message_to_html(&render_message(&msg));
        assert!(html.contains(r#"<span class="badge badge-persona">parent</span>"#));
        assert!(html.contains(r#"<span class="badge badge-confidence">100%</span>"#));
        assert!(!html.contains("badge-intent"));
        assert!(html.contains("Did You Know?"));
        assert!(html.contains("Om is a sacred sound."));

        let bare = message_to_html(&render_message(&Message::fallback("sorry")));
        assert!(!bare.contains(r#"class="meta""#));
        assert!(!bare.contains("did-you-know"));
    }
}
