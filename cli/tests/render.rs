//! # Render Command Integration Tests
//!
//! File: cli/tests/render.rs
//!
//! The render command only reads markup, so these run against whatever
//! configuration the machine provides.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_render_html_from_argument() {
    chat_cmd()
        .args(["render", "**hi** [go](http://x)"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<strong>hi</strong> <a href="http:&#x2F;&#x2F;x" target="_blank" rel="noopener noreferrer">go</a>"#,
        ));
}

#[test]
fn test_render_html_from_stdin() {
    chat_cmd()
        .arg("render")
        .write_stdin("line one\n<b>line</b> two\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "line one<br>&lt;b&gt;line&lt;&#x2F;b&gt; two",
        ));
}

#[test]
fn test_render_text_drops_markup() {
    chat_cmd()
        .args(["render", "--format", "text", "**Namaste** [courses](/courses)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Namaste courses (/courses)"));
}

#[test]
fn test_render_spans_json() {
    chat_cmd()
        .args(["render", "--format", "spans", "[bad](javascript:alert(1))"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""kind": "text""#)
                .and(predicate::str::contains("javascript:alert(1)"))
                .and(predicate::str::contains(r#""kind": "link""#).not()),
        );
}
