//! # Voice Capture Adapter
//!
//! File: cli/src/chat/voice.rs
//!
//! ## Overview
//!
//! Speech-to-text is an optional input channel. Whether the host can
//! capture speech is decided once, when the conversation is built, and
//! handed in as a `VoiceCapability`; the conversation never probes the
//! environment again.
//!
//! A `SpeechRecognizer` starts a capture and reports progress as
//! `VoiceEvent`s over a channel. The returned `CaptureHandle` stops it.
//! Only the `Final` transcript is submitted to the conversation.
//!
//! `ScriptedRecognizer` replays canned transcripts. The terminal host uses
//! it when a transcripts file is configured, and tests use it directly.
//!
use crate::core::error::{ChatError, Result};
use anyhow::{anyhow, Context};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Started,
    /// Partial transcript; informational only.
    Interim(String),
    Final(String),
    Error(String),
    Ended,
}

/// A running capture. Stopping must be idempotent.
pub trait CaptureHandle: Send {
    fn stop(&mut self);
}

pub trait SpeechRecognizer: Send + Sync {
    fn start(
        &self,
        language: &str,
        events: UnboundedSender<VoiceEvent>,
    ) -> Result<Box<dyn CaptureHandle>>;
}

#[derive(Clone)]
pub enum VoiceCapability {
    Available(Arc<dyn SpeechRecognizer>),
    Unavailable,
}

impl VoiceCapability {
    pub fn resolve(recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        match recognizer {
            Some(r) => VoiceCapability::Available(r),
            None => VoiceCapability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, VoiceCapability::Available(_))
    }
}

impl fmt::Debug for VoiceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceCapability::Available(_) => write!(f, "VoiceCapability::Available"),
            VoiceCapability::Unavailable => write!(f, "VoiceCapability::Unavailable"),
        }
    }
}

/// Replays queued transcripts, one per capture.
///
/// A capture with an empty queue reports a `no-speech` error, like a
/// microphone that heard nothing.
pub struct ScriptedRecognizer {
    transcripts: Mutex<VecDeque<String>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(transcripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            transcripts: Mutex::new(transcripts.into_iter().map(Into::into).collect()),
        }
    }

    /// One transcript per non-blank line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read voice transcripts: {}", path.display()))?;
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        debug!("Loaded {} voice transcripts from {}", lines.len(), path.display());
        Ok(Self::new(lines))
    }

    pub fn remaining(&self) -> usize {
        self.transcripts.lock().len()
    }
}

struct ScriptedCapture {
    task: Option<JoinHandle<()>>,
}

impl CaptureHandle for ScriptedCapture {
    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(
        &self,
        language: &str,
        events: UnboundedSender<VoiceEvent>,
    ) -> Result<Box<dyn CaptureHandle>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| anyhow!(ChatError::VoiceCapture("no async runtime".to_string())))?;
        let transcript = self.transcripts.lock().pop_front();
        debug!("Scripted capture started (lang={})", language);

        let task = runtime.spawn(async move {
            let _ = events.send(VoiceEvent::Started);
            match transcript {
                Some(text) => {
                    if let Some(first_word) = text.split_whitespace().next() {
                        let _ = events.send(VoiceEvent::Interim(first_word.to_string()));
                    }
                    let _ = events.send(VoiceEvent::Final(text));
                }
                None => {
                    let _ = events.send(VoiceEvent::Error("no-speech".to_string()));
                }
            }
            let _ = events.send(VoiceEvent::Ended);
        });
        Ok(Box::new(ScriptedCapture { task: Some(task) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn drain(recognizer: &ScriptedRecognizer) -> Vec<VoiceEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = recognizer.start("en-US", tx).unwrap();
        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn test_scripted_capture_emits_transcript() {
        let recognizer = ScriptedRecognizer::new(["tell me about fees"]);
        assert_eq!(
            drain(&recognizer).await,
            vec![
                VoiceEvent::Started,
                VoiceEvent::Interim("tell".into()),
                VoiceEvent::Final("tell me about fees".into()),
                VoiceEvent::Ended,
            ]
        );
        assert_eq!(recognizer.remaining(), 0);
    }

    #[tokio::test]
    async fn test_empty_queue_reports_no_speech() {
        let recognizer = ScriptedRecognizer::new(Vec::<String>::new());
        let events = drain(&recognizer).await;
        assert!(events.contains(&VoiceEvent::Error("no-speech".into())));
        assert_eq!(events.last(), Some(&VoiceEvent::Ended));
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.txt");
        std::fs::write(&path, "first\n\n  second  \n").unwrap();
        let recognizer = ScriptedRecognizer::from_file(&path).unwrap();
        assert_eq!(recognizer.remaining(), 2);
    }

    #[test]
    fn test_capability_resolution() {
        assert!(!VoiceCapability::resolve(None).is_available());
        let r: Arc<dyn SpeechRecognizer> = Arc::new(ScriptedRecognizer::new(["x"]));
        assert!(VoiceCapability::resolve(Some(r)).is_available());
    }
}
