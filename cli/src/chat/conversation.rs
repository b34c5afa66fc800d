//! # Conversation State Machine
//!
//! File: cli/src/chat/conversation.rs
//!
//! ## Overview
//!
//! A `Conversation` owns the ordered message log of one open chat widget,
//! the "assistant is composing" state, and the voice `listening` flag. All
//! mutations go through it.
//!
//! ## States
//!
//! - `Idle`: no classification is outstanding
//! - `AwaitingReply`: at least one submission is waiting for its reply
//!
//! `submit` appends the user message synchronously and spawns the
//! classification on the Tokio runtime the conversation was opened in. Each
//! submission ends with exactly one assistant message (the reply, or the
//! fallback if the classifier fails) and exactly one return towards `Idle`,
//! enforced by a drop guard so that even a cancelled task releases its slot.
//!
//! Overlapping submissions are allowed. No request correlation is kept, so
//! replies land in the order their classifications *resolve*, not the order
//! they were sent.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use gurukul_chat::chat::{Conversation, ScriptedClassifier, SessionContext, UserProfile};
//! use std::sync::Arc;
//!
//! # async fn run() -> gurukul_chat::core::error::Result<()> {
//! let conversation = Conversation::builder(Arc::new(ScriptedClassifier::builtin()?))
//!     .context(SessionContext::signed_in(UserProfile::named("Priya Shah")))
//!     .open(None)?;
//!
//! conversation.submit("How do I enroll in a course?");
//! conversation.wait_idle().await;
//! assert_eq!(conversation.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
use crate::chat::classifier::{Classifier, UserProfile};
use crate::chat::message::Message;
use crate::chat::voice::{CaptureHandle, VoiceCapability, VoiceEvent};
use crate::chat::welcome::Greeter;
use crate::core::config::{AssistantConfig, Config, PacingConfig};
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use parking_lot::Mutex;
use rand::Rng;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Capability invoked when the visitor signs out from inside the chat.
pub type SignOut = Arc<dyn Fn() + Send + Sync>;

/// Who is chatting, passed in explicitly by the host.
#[derive(Clone, Default)]
pub struct SessionContext {
    pub user: Option<UserProfile>,
    sign_out: Option<SignOut>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserProfile) -> Self {
        Self {
            user: Some(user),
            sign_out: None,
        }
    }

    pub fn with_sign_out(mut self, sign_out: SignOut) -> Self {
        self.sign_out = Some(sign_out);
        self
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .field("sign_out", &self.sign_out.is_some())
            .finish()
    }
}

/// Randomised delay applied before a successful reply becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
    }

    async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            trace!("Pacing reply by {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

/// Behavioural settings of a conversation.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub pacing: Pacing,
    pub language: String,
    pub fallback_message: String,
    pub quick_questions: Vec<String>,
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing: Pacing::from_config(&config.pacing),
            language: config.voice.language.clone(),
            fallback_message: config.assistant.fallback_message.clone(),
            quick_questions: config.assistant.quick_questions.clone(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingReply,
}

struct LogState {
    messages: Vec<Message>,
    in_flight: usize,
    /// Bumped by `clear()`; only used to flag replies that land after a clear.
    epoch: u64,
    listening: bool,
    capture: Option<Box<dyn CaptureHandle>>,
    /// Bumped on every capture start/stop so events from a replaced capture are ignored.
    capture_generation: u64,
}

struct Inner {
    state: Mutex<LogState>,
    context: Mutex<SessionContext>,
    classifier: Arc<dyn Classifier>,
    greeter: Greeter,
    settings: ChatSettings,
    voice: VoiceCapability,
    runtime: Handle,
    changes: watch::Sender<u64>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(mut capture) = self.state.get_mut().capture.take() {
            capture.stop();
        }
        debug!("Conversation dropped");
    }
}

pub struct ConversationBuilder {
    classifier: Arc<dyn Classifier>,
    greeter: Option<Greeter>,
    settings: ChatSettings,
    voice: VoiceCapability,
    context: SessionContext,
}

impl ConversationBuilder {
    pub fn greeter(mut self, greeter: Greeter) -> Self {
        self.greeter = Some(greeter);
        self
    }

    pub fn settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn voice(mut self, voice: VoiceCapability) -> Self {
        self.voice = voice;
        self
    }

    pub fn context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }

    /// Opens the chat: seeds the welcome message, then auto-submits
    /// `initial_message` if one is given.
    ///
    /// Must be called from within a Tokio runtime; replies are spawned on it.
    pub fn open(self, initial_message: Option<&str>) -> Result<Conversation> {
        let runtime = Handle::try_current().map_err(|_| anyhow!(ChatError::RuntimeMissing))?;
        let greeter = match self.greeter {
            Some(greeter) => greeter,
            None => Greeter::new(&AssistantConfig::default())?,
        };
        let welcome = greeter.welcome(self.context.user.as_ref())?;
        let (changes, _) = watch::channel(0);

        let conversation = Conversation {
            inner: Arc::new(Inner {
                state: Mutex::new(LogState {
                    messages: vec![welcome],
                    in_flight: 0,
                    epoch: 0,
                    listening: false,
                    capture: None,
                    capture_generation: 0,
                }),
                context: Mutex::new(self.context),
                classifier: self.classifier,
                greeter,
                settings: self.settings,
                voice: self.voice,
                runtime,
                changes,
            }),
        };
        info!(
            "Conversation opened (voice: {:?})",
            conversation.inner.voice
        );

        if let Some(text) = initial_message {
            conversation.submit(text);
        }
        Ok(conversation)
    }
}

/// Handle to an open conversation. Clones share the same log.
#[derive(Clone)]
pub struct Conversation {
    inner: Arc<Inner>,
}

/// Releases one in-flight slot when dropped.
struct InFlight(Conversation);

impl Drop for InFlight {
    fn drop(&mut self) {
        {
            let mut state = self.0.inner.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            debug!(in_flight = state.in_flight, "Submission finished");
        }
        self.0.notify();
    }
}

impl Conversation {
    pub fn builder(classifier: Arc<dyn Classifier>) -> ConversationBuilder {
        ConversationBuilder {
            classifier,
            greeter: None,
            settings: ChatSettings::default(),
            voice: VoiceCapability::Unavailable,
            context: SessionContext::anonymous(),
        }
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|revision| *revision += 1);
    }

    /// Receives a new revision number after every change to the log or flags.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    /// Snapshot of the ordered log.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> ChatState {
        if self.inner.state.lock().in_flight > 0 {
            ChatState::AwaitingReply
        } else {
            ChatState::Idle
        }
    }

    /// Drives the typing indicator.
    pub fn is_composing(&self) -> bool {
        self.state() == ChatState::AwaitingReply
    }

    pub fn is_listening(&self) -> bool {
        self.inner.state.lock().listening
    }

    pub fn voice_available(&self) -> bool {
        self.inner.voice.is_available()
    }

    pub fn assistant_name(&self) -> &str {
        self.inner.greeter.assistant_name()
    }

    /// Suggested openers, offered only while the log holds at most the greeting.
    pub fn quick_questions(&self) -> &[String] {
        if self.len() <= 1 {
            &self.inner.settings.quick_questions
        } else {
            &[]
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.context.lock().user.clone()
    }

    /// Forgets the current user and invokes the host's sign-out capability.
    /// Later submissions are classified anonymously.
    pub fn sign_out(&self) {
        let sign_out = {
            let mut context = self.inner.context.lock();
            context.user = None;
            context.sign_out.clone()
        };
        info!("Signing out of the chat session");
        if let Some(sign_out) = sign_out {
            sign_out();
        }
        self.notify();
    }

    /// Appends a user message and dispatches it for classification.
    ///
    /// Returns `None` (and changes nothing) for empty or whitespace-only
    /// input. Otherwise returns the handle of the task that will append the
    /// assistant reply; dropping the handle does not cancel it.
    pub fn submit(&self, text: &str) -> Option<JoinHandle<()>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty submission");
            return None;
        }
        let user = self.current_user();
        let epoch = {
            let mut state = self.inner.state.lock();
            state.messages.push(Message::user(text));
            state.in_flight += 1;
            debug!(in_flight = state.in_flight, "Submission accepted, awaiting reply");
            state.epoch
        };
        self.notify();

        // Owned by the task so the slot is released even if it never runs.
        let in_flight = InFlight(self.clone());
        let text = text.to_string();
        Some(self.inner.runtime.spawn(async move {
            in_flight.0.resolve(text, user, epoch).await;
            drop(in_flight);
        }))
    }

    async fn resolve(&self, text: String, user: Option<UserProfile>, epoch: u64) {
        let reply = match self.inner.classifier.classify(&text, user.as_ref()).await {
            Ok(reply) => {
                if let Some(confidence) = reply.confidence {
                    if !(0.0..=1.0).contains(&confidence) {
                        warn!(
                            "Classifier returned confidence {} outside [0, 1]",
                            confidence
                        );
                    }
                }
                self.inner.settings.pacing.pause().await;
                Message::from_reply(reply)
            }
            Err(e) => {
                error!("Error processing message: {:?}", e);
                Message::fallback(self.inner.settings.fallback_message.as_str())
            }
        };
        self.append(reply, epoch);
    }

    fn append(&self, message: Message, epoch: u64) {
        {
            let mut state = self.inner.state.lock();
            if state.epoch != epoch {
                debug!("Reply to a message sent before the log was cleared; appending anyway");
            }
            state.messages.push(message);
        }
        self.notify();
    }

    /// Replaces the log with a single fresh greeting. In-flight replies are
    /// not cancelled and will still be appended.
    pub fn clear(&self) {
        {
            let mut state = self.inner.state.lock();
            state.messages = vec![self.inner.greeter.cleared()];
            state.epoch += 1;
            if state.in_flight > 0 {
                debug!(in_flight = state.in_flight, "Cleared with replies outstanding");
            }
        }
        info!("Conversation cleared");
        self.notify();
    }

    /// Waits until no submission is outstanding.
    pub async fn wait_idle(&self) {
        let mut changes = self.subscribe();
        while self.is_composing() {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Starts listening, stopping any capture already running first.
    ///
    /// Fails with `ChatError::VoiceUnavailable` (and leaves all state
    /// untouched) when the host has no speech capability.
    pub fn start_voice_capture(&self) -> Result<()> {
        let recognizer = match &self.inner.voice {
            VoiceCapability::Available(recognizer) => Arc::clone(recognizer),
            VoiceCapability::Unavailable => {
                warn!("Voice capture requested but speech recognition is unavailable");
                return Err(anyhow!(ChatError::VoiceUnavailable));
            }
        };
        self.stop_voice_capture();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handle = recognizer
            .start(&self.inner.settings.language, events_tx)
            .map_err(|e| anyhow!(ChatError::VoiceCapture(format!("{:#}", e))))?;
        let generation = {
            let mut state = self.inner.state.lock();
            state.capture_generation += 1;
            state.capture = Some(handle);
            state.listening = true;
            state.capture_generation
        };
        info!("Voice capture started");
        self.notify();

        let inner = Arc::downgrade(&self.inner);
        self.inner
            .runtime
            .spawn(pump_voice_events(inner, events_rx, generation));
        Ok(())
    }

    /// Stops the active capture, if any. A transcript that arrives later is discarded.
    pub fn stop_voice_capture(&self) {
        let handle = {
            let mut state = self.inner.state.lock();
            if !state.listening && state.capture.is_none() {
                return;
            }
            state.listening = false;
            state.capture_generation += 1;
            state.capture.take()
        };
        if let Some(mut handle) = handle {
            handle.stop();
        }
        info!("Voice capture stopped");
        self.notify();
    }

    /// Microphone button: stops when listening, starts otherwise.
    /// Returns whether the conversation is now listening.
    pub fn toggle_voice_capture(&self) -> Result<bool> {
        if self.is_listening() {
            self.stop_voice_capture();
            Ok(false)
        } else {
            self.start_voice_capture()?;
            Ok(true)
        }
    }

    /// Applies one event from the capture started as `generation`.
    /// Returns `false` once the capture is over.
    fn handle_voice_event(&self, event: VoiceEvent, generation: u64) -> bool {
        if self.inner.state.lock().capture_generation != generation {
            debug!("Discarding voice event from a stopped capture: {:?}", event);
            return false;
        }
        match event {
            VoiceEvent::Started => debug!("Voice capture listening"),
            VoiceEvent::Interim(partial) => trace!("Interim transcript: {}", partial),
            VoiceEvent::Final(transcript) => {
                debug!("Final transcript: {}", transcript);
                self.end_capture(generation);
                // The reply task runs on its own; nothing to wait for here.
                let _ = self.submit(&transcript);
            }
            VoiceEvent::Error(reason) => {
                warn!("Voice capture error: {}", reason);
                self.end_capture(generation);
            }
            VoiceEvent::Ended => self.end_capture(generation),
        }
        true
    }

    fn end_capture(&self, generation: u64) {
        let released = {
            let mut state = self.inner.state.lock();
            if state.capture_generation != generation || !state.listening {
                return;
            }
            state.listening = false;
            state.capture.take()
        };
        drop(released);
        debug!("Voice capture ended");
        self.notify();
    }

    /// Closes the widget: stops voice capture. The log is dropped with the
    /// last handle.
    pub fn close(&self) {
        self.stop_voice_capture();
        info!("Conversation closed");
    }
}

/// Forwards recognizer events to the conversation. Holds the conversation
/// weakly so a capture that is still running does not keep it open.
async fn pump_voice_events(
    inner: Weak<Inner>,
    mut events: mpsc::UnboundedReceiver<VoiceEvent>,
    generation: u64,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            debug!("Conversation dropped, ending voice event pump");
            return;
        };
        let conversation = Conversation { inner };
        if !conversation.handle_voice_event(event, generation) {
            return;
        }
    }
    if let Some(inner) = inner.upgrade() {
        let conversation = Conversation { inner };
        conversation.end_capture(generation);
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Conversation")
            .field("messages", &state.messages.len())
            .field("in_flight", &state.in_flight)
            .field("listening", &state.listening)
            .finish()
    }
}
