//! # Conversation Library Tests
//!
//! File: cli/tests/conversation.rs
//!
//! ## Overview
//!
//! Drives `gurukul_chat::chat::Conversation` through the public API with
//! classifiers whose timing the test controls.
//!

use anyhow::anyhow;
use async_trait::async_trait;
use gurukul_chat::chat::render::{html, render_log, Badge};
use gurukul_chat::chat::{
    ChatSettings, ChatState, Classifier, ClassifierReply, Conversation, Pacing,
    ScriptedClassifier, SessionContext, Speaker, UserProfile,
};
use gurukul_chat::core::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Replies to each text only once the test releases it.
#[derive(Default)]
struct Gated {
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl Gated {
    fn gate(&self, text: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(text.to_string(), rx);
        tx
    }
}

#[async_trait]
impl Classifier for Gated {
    async fn classify(&self, text: &str, _user: Option<&UserProfile>) -> Result<ClassifierReply> {
        let gate = self.gates.lock().remove(text);
        if let Some(gate) = gate {
            gate.await.map_err(|_| anyhow!("gate dropped"))?;
        }
        Ok(ClassifierReply::new(format!("reply to {}", text)))
    }
}

struct Unreachable;

#[async_trait]
impl Classifier for Unreachable {
    async fn classify(&self, _text: &str, _user: Option<&UserProfile>) -> Result<ClassifierReply> {
        Err(anyhow!("connection refused"))
    }
}

fn open(classifier: Arc<dyn Classifier>, context: SessionContext) -> Conversation {
    Conversation::builder(classifier)
        .settings(ChatSettings {
            pacing: Pacing::immediate(),
            ..Default::default()
        })
        .context(context)
        .open(None)
        .unwrap()
}

fn contents(conversation: &Conversation) -> Vec<String> {
    conversation
        .messages()
        .iter()
        .map(|m| m.content().to_string())
        .collect()
}

#[tokio::test]
async fn test_replies_land_in_resolution_order() {
    let classifier = Arc::new(Gated::default());
    let release_a = classifier.gate("A");
    let release_b = classifier.gate("B");
    let conversation = open(classifier.clone(), SessionContext::anonymous());

    let task_a = conversation.submit("A").unwrap();
    let task_b = conversation.submit("B").unwrap();
    assert_eq!(conversation.state(), ChatState::AwaitingReply);
    assert_eq!(&contents(&conversation)[1..], ["A", "B"]);

    release_b.send(()).unwrap();
    task_b.await.unwrap();
    // A is still outstanding.
    assert_eq!(conversation.state(), ChatState::AwaitingReply);

    release_a.send(()).unwrap();
    task_a.await.unwrap();
    assert_eq!(conversation.state(), ChatState::Idle);
    assert_eq!(
        &contents(&conversation)[1..],
        ["A", "B", "reply to B", "reply to A"]
    );
}

#[tokio::test]
async fn test_classifier_failure_appends_fallback() {
    let conversation = open(Arc::new(Unreachable), SessionContext::anonymous());
    conversation.submit("hello").unwrap().await.unwrap();

    let messages = conversation.messages();
    assert_eq!(messages.len(), 3);
    let fallback = &messages[2];
    assert_eq!(fallback.speaker(), Speaker::Assistant);
    assert!(fallback.content().starts_with("I apologize"));
    assert!(fallback.intent().is_none());
    assert!(fallback.confidence().is_none());
    assert_eq!(conversation.state(), ChatState::Idle);
}

#[tokio::test]
async fn test_welcome_uses_first_name_or_friend() {
    let signed_in = open(
        Arc::new(Gated::default()),
        SessionContext::signed_in(UserProfile::named("Priya Shah")),
    );
    assert!(signed_in.messages()[0].content().contains("Namaste Priya!"));

    let anonymous = open(Arc::new(Gated::default()), SessionContext::anonymous());
    assert!(anonymous.messages()[0].content().contains("Namaste friend!"));
}

#[tokio::test]
async fn test_clear_keeps_outstanding_reply() {
    let classifier = Arc::new(Gated::default());
    let release = classifier.gate("slow");
    let conversation = open(classifier.clone(), SessionContext::anonymous());

    let task = conversation.submit("slow").unwrap();
    conversation.clear();
    assert_eq!(conversation.len(), 1);
    assert!(conversation.messages()[0].content().contains("Chat cleared"));

    release.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.messages()[1].content(), "reply to slow");
}

#[tokio::test]
async fn test_quick_questions_only_before_first_submission() {
    let conversation = open(Arc::new(Gated::default()), SessionContext::anonymous());
    assert_eq!(conversation.quick_questions().len(), 8);
    conversation.submit("hi").unwrap().await.unwrap();
    assert!(conversation.quick_questions().is_empty());
    conversation.clear();
    assert_eq!(conversation.quick_questions().len(), 8);
}

#[tokio::test]
async fn test_scripted_reply_renders_badges_and_links() {
    let conversation = open(
        Arc::new(ScriptedClassifier::builtin().unwrap()),
        SessionContext::signed_in(UserProfile::named("Priya Shah")),
    );
    conversation.submit("What is the fee structure?");
    conversation.wait_idle().await;

    let rendered = render_log(&conversation.messages());
    let reply = &rendered[2];
    assert!(reply.badges.contains(&Badge::Intent("fee_inquiry".into())));
    assert!(reply.badges.contains(&Badge::Confidence(90)));

    let page = html::transcript_to_html(&rendered);
    assert!(page.contains(r#"<a href="&#x2F;courses""#));
}
