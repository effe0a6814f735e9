//! One chat: ordered turns, the submit/generate/reveal state machine, and the
//! events background work posts back to it.
//!
//! A session is owned by the thread that owns the display. Background work
//! (the generation task, the reveal timer, snapshot writes) never mutates it;
//! it sends a [`SessionEvent`] that the owner feeds to
//! [`ConversationSession::handle_event`]. Because every transition runs on
//! that one owner, checking `Idle` and moving to `Generating` is a single step.

use crate::config::Settings;
use crate::error::{PersistenceError, SessionError};
use crate::ollama::{GenerationOptions, Generator};
use crate::reveal::{RevealAnimator, RevealRate, TickNotifier};
use crate::transcript::{format_turns, TranscriptStore, Turn, TURN_SEPARATOR};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type SessionId = u64;

pub const THINKING_PLACEHOLDER: &str = "AI: Thinking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Generating,
    Animating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("Session is busy ({0:?})")]
    Busy(Status),
}

#[derive(Debug, Error)]
pub enum ClearError {
    #[error("Cannot clear while the session is {0:?}")]
    Busy(Status),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug)]
pub struct SessionEvent {
    pub session: SessionId,
    pub kind: SessionEventKind,
}

#[derive(Debug)]
pub enum SessionEventKind {
    /// The exchange finished. On success the reply is already in the transcript.
    GenerationFinished(Result<String, SessionError>),
    /// The reveal timer is due a tick.
    RevealTick(u64),
    SnapshotSaved(PathBuf),
    SnapshotFailed(PersistenceError),
}

/// Shared collaborators handed to every session.
#[derive(Clone)]
pub struct SessionContext {
    pub generator: Arc<dyn Generator>,
    pub store: Arc<dyn TranscriptStore>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
}

struct Pending {
    prompt: String,
    reveal: RevealRate,
    /// Turns as they were before submission, restored on failure.
    rollback: Vec<Turn>,
}

pub struct ConversationSession {
    id: SessionId,
    model_id: String,
    turns: Vec<Turn>,
    status: Status,
    pending: Option<Pending>,
    /// Conversation text preceding the entry being revealed.
    reveal_base: String,
    animator: RevealAnimator,
    input: String,
    error: Option<String>,
    notice: Option<String>,
    ctx: SessionContext,
}

impl ConversationSession {
    /// An idle session over already loaded turns. Submitting and revealing
    /// spawn tasks, so those need a tokio runtime.
    pub fn new(id: SessionId, model_id: String, turns: Vec<Turn>, ctx: SessionContext) -> Self {
        let events = ctx.events.clone();
        let notify: TickNotifier = Arc::new(move |reveal_id| {
            let _ = events.send(SessionEvent {
                session: id,
                kind: SessionEventKind::RevealTick(reveal_id),
            });
        });

        Self {
            id,
            model_id,
            turns,
            status: Status::Idle,
            pending: None,
            reveal_base: String::new(),
            animator: RevealAnimator::new(notify),
            input: String::new(),
            error: None,
            notice: None,
            ctx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.prompt.as_str())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Input is only blocked while a reply is being generated.
    pub fn is_input_enabled(&self) -> bool {
        self.status != Status::Generating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_messages(&mut self) {
        self.error = None;
        self.notice = None;
    }

    /// Submits the current input buffer and clears it on acceptance.
    pub fn submit_input(&mut self, settings: Settings) -> Result<(), Rejected> {
        let prompt = self.input.clone();
        self.submit(&prompt, settings)?;
        self.input.clear();
        Ok(())
    }

    /// Starts one exchange in the background.
    ///
    /// Rejected without side effects when the prompt is blank or the session
    /// is not idle.
    pub fn submit(&mut self, prompt: &str, settings: Settings) -> Result<(), Rejected> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Rejected::EmptyPrompt);
        }
        if self.status != Status::Idle {
            debug!(session = self.id, status = ?self.status, "Submission rejected");
            return Err(Rejected::Busy(self.status));
        }

        self.status = Status::Generating;
        self.error = None;
        self.notice = None;
        self.pending = Some(Pending {
            prompt: prompt.to_string(),
            reveal: settings.reveal,
            rollback: self.turns.clone(),
        });
        info!(session = self.id, model = %self.model_id, "Submitting prompt");

        tokio::spawn(run_exchange(
            self.ctx.clone(),
            self.id,
            self.model_id.clone(),
            self.turns.clone(),
            prompt.to_string(),
            settings.generation,
        ));
        Ok(())
    }

    /// Applies a message posted by background work. Returns whether the
    /// visible text changed.
    pub fn handle_event(&mut self, kind: SessionEventKind) -> bool {
        match kind {
            SessionEventKind::GenerationFinished(Ok(reply)) => self.on_generation_success(reply),
            SessionEventKind::GenerationFinished(Err(e)) => self.on_generation_failure(e),
            SessionEventKind::RevealTick(reveal_id) => self.on_reveal_tick(reveal_id),
            SessionEventKind::SnapshotSaved(path) => {
                debug!(session = self.id, path = %path.display(), "History snapshot saved");
                false
            }
            SessionEventKind::SnapshotFailed(e) => {
                self.notice = Some(format!("History snapshot not saved: {e}"));
                true
            }
        }
    }

    fn on_generation_success(&mut self, reply: String) -> bool {
        let Some(pending) = self.pending.take() else {
            warn!(session = self.id, "Generation result without a pending prompt");
            return false;
        };

        let user = Turn::user(pending.prompt);
        let assistant = Turn::assistant(reply);
        let entry = format!("{user}{TURN_SEPARATOR}{assistant}");

        self.reveal_base = format_turns(&self.turns);
        self.turns.push(user);
        self.turns.push(assistant);

        self.status = Status::Animating;
        self.animator.reveal(entry, pending.reveal);
        if !self.animator.is_active() {
            self.status = Status::Idle;
        }
        info!(session = self.id, turns = self.turns.len(), "Exchange complete");
        true
    }

    fn on_generation_failure(&mut self, error: SessionError) -> bool {
        if let Some(pending) = self.pending.take() {
            self.turns = pending.rollback;
        }
        self.status = Status::Idle;
        warn!(session = self.id, error = %error, "Exchange failed, conversation rolled back");
        self.error = Some(error.to_string());
        true
    }

    fn on_reveal_tick(&mut self, reveal_id: u64) -> bool {
        if self.status != Status::Animating {
            return false;
        }
        let changed = self.animator.on_tick(reveal_id);
        if !self.animator.is_active() {
            self.status = Status::Idle;
        }
        changed
    }

    /// Shows the rest of the reply immediately. Generation is unaffected.
    pub fn skip(&mut self) -> bool {
        if self.status != Status::Animating {
            return false;
        }
        self.animator.skip();
        self.status = Status::Idle;
        true
    }

    pub fn set_reveal_rate(&mut self, rate: RevealRate) {
        self.animator.set_rate(rate);
    }

    /// Empties the conversation. The in-memory turns are only dropped after
    /// the transcript was truncated.
    pub fn clear_conversation(&mut self) -> Result<(), ClearError> {
        if self.status != Status::Idle {
            return Err(ClearError::Busy(self.status));
        }
        if let Err(e) = self.ctx.store.clear(&self.model_id) {
            warn!(session = self.id, error = %e, "Clearing transcript failed");
            self.error = Some(e.to_string());
            return Err(e.into());
        }
        self.turns.clear();
        self.reveal_base.clear();
        self.error = None;
        info!(session = self.id, model = %self.model_id, "Conversation cleared");
        Ok(())
    }

    /// Text the UI should show for this chat right now.
    pub fn current_display_text(&self) -> String {
        match self.status {
            Status::Idle => format_turns(&self.turns),
            Status::Generating => {
                let prompt = self.pending_prompt().unwrap_or_default();
                join_sections(
                    &format_turns(&self.turns),
                    &format!("{}{TURN_SEPARATOR}{THINKING_PLACEHOLDER}", Turn::user(prompt)),
                )
            }
            Status::Animating => join_sections(&self.reveal_base, self.animator.display()),
        }
    }
}

fn join_sections(head: &str, tail: &str) -> String {
    if head.is_empty() {
        tail.to_string()
    } else {
        format!("{head}{TURN_SEPARATOR}{tail}")
    }
}

/// Background half of a submission. Persists before reporting success so a
/// closed tab still gets its history written.
async fn run_exchange(
    ctx: SessionContext,
    session: SessionId,
    model_id: String,
    prior: Vec<Turn>,
    prompt: String,
    options: GenerationOptions,
) {
    let post = |kind| {
        let _ = ctx.events.send(SessionEvent { session, kind });
    };

    let reply = match ctx
        .generator
        .generate(&model_id, &format_turns(&prior), &prompt, &options)
        .await
    {
        // Turns are trimmed on reload, so memory keeps the same form.
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            post(SessionEventKind::GenerationFinished(Err(e.into())));
            return;
        }
    };

    let exchange = vec![Turn::user(prompt), Turn::assistant(reply.clone())];
    let appended = {
        let store = Arc::clone(&ctx.store);
        let model_id = model_id.clone();
        let exchange = exchange.clone();
        blocking(move || store.append(&model_id, &exchange)).await
    };
    if let Err(e) = appended {
        post(SessionEventKind::GenerationFinished(Err(e.into())));
        return;
    }
    post(SessionEventKind::GenerationFinished(Ok(reply)));

    let mut all = prior;
    all.extend(exchange);
    let store = Arc::clone(&ctx.store);
    match blocking(move || store.save_snapshot(&model_id, &all)).await {
        Ok(path) => post(SessionEventKind::SnapshotSaved(path)),
        Err(e) => {
            warn!(session, error = %e, "Saving history snapshot failed");
            post(SessionEventKind::SnapshotFailed(e));
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T, PersistenceError>
where
    F: FnOnce() -> Result<T, PersistenceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(PersistenceError::Interrupted(e.to_string())))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::transcript::FileTranscriptStore;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Replies from a script, one entry per call.
    pub(crate) struct ScriptedGenerator {
        replies: Mutex<Vec<Result<String, GenerationError>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(
            &self,
            _model: &str,
            prior_turns: &str,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((prior_turns.to_string(), prompt.to_string()));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(GenerationError::GenerationFailed("script exhausted".to_string()));
            }
            replies.remove(0)
        }
    }

    /// File store whose `clear` always fails.
    struct ClearFails(FileTranscriptStore);

    impl TranscriptStore for ClearFails {
        fn ensure_exists(&self, model_id: &str) -> Result<(), PersistenceError> {
            self.0.ensure_exists(model_id)
        }
        fn load(&self, model_id: &str) -> Result<Vec<Turn>, PersistenceError> {
            self.0.load(model_id)
        }
        fn append(&self, model_id: &str, turns: &[Turn]) -> Result<(), PersistenceError> {
            self.0.append(model_id, turns)
        }
        fn clear(&self, model_id: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::io(
                "clear",
                self.0.transcript_path(model_id),
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }
        fn save_snapshot(&self, model_id: &str, turns: &[Turn]) -> Result<PathBuf, PersistenceError> {
            self.0.save_snapshot(model_id, turns)
        }
    }

    pub(crate) fn settings() -> Settings {
        Settings {
            generation: GenerationOptions::default(),
            reveal: RevealRate::new(4, Duration::from_millis(10)),
        }
    }

    struct Harness {
        _dir: TempDir,
        store: Arc<FileTranscriptStore>,
        session: ConversationSession,
        rx: mpsc::UnboundedReceiver<SessionEvent>,
    }

    impl Harness {
        fn new(generator: Arc<ScriptedGenerator>) -> Self {
            let dir = tempdir().unwrap();
            let store = Arc::new(FileTranscriptStore::new(dir.path()));
            Self::with_store(dir, store.clone(), store, generator)
        }

        fn with_store(
            dir: TempDir,
            files: Arc<FileTranscriptStore>,
            store: Arc<dyn TranscriptStore>,
            generator: Arc<ScriptedGenerator>,
        ) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            let ctx = SessionContext {
                generator,
                store: store.clone(),
                events: tx,
            };
            store.ensure_exists("m1").unwrap();
            let turns = store.load("m1").unwrap();
            Self {
                _dir: dir,
                store: files,
                session: ConversationSession::new(1, "m1".to_string(), turns, ctx),
                rx,
            }
        }

        /// Feeds events until the reply has arrived (or failed).
        async fn await_reply(&mut self) {
            while self.session.status() == Status::Generating {
                let event = self.rx.recv().await.expect("event channel closed");
                self.session.handle_event(event.kind);
            }
        }

        /// Feeds events until the session is idle again.
        async fn settle(&mut self) {
            loop {
                let event = self.rx.recv().await.expect("event channel closed");
                assert_eq!(event.session, 1);
                self.session.handle_event(event.kind);
                if self.session.status() == Status::Idle {
                    return;
                }
            }
        }

        fn transcript(&self) -> String {
            fs::read_to_string(self.store.transcript_path("m1")).unwrap()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_exchange_is_persisted_and_revealed() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        assert!(h.session.turns().is_empty());
        assert_eq!(h.transcript(), "");

        h.session.submit("hi", settings()).unwrap();
        assert_eq!(h.session.status(), Status::Generating);
        assert_eq!(h.session.pending_prompt(), Some("hi"));
        assert!(!h.session.is_input_enabled());
        assert_eq!(h.session.current_display_text(), "You: hi\n\nAI: Thinking...");
        assert!(h.session.turns().is_empty());

        let event = h.rx.recv().await.unwrap();
        assert!(h.session.handle_event(event.kind));
        assert_eq!(h.session.status(), Status::Animating);
        assert!(h.session.is_input_enabled());
        assert_eq!(h.session.pending_prompt(), None);
        assert_eq!(h.session.current_display_text(), "You: hi\n\n");

        h.settle().await;
        assert_eq!(h.session.current_display_text(), "You: hi\n\nAI: hello");
        assert_eq!(
            h.session.turns(),
            &[Turn::user("hi"), Turn::assistant("hello")]
        );
        assert_eq!(h.transcript(), "You: hi\n\nAI: hello\n\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_whitespace_survives_reload() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![
            Ok(String::new()),
            Ok("hello\n".to_string()),
            Ok("  \n".to_string()),
        ]));

        for prompt in ["hi", "again", "once more"] {
            h.session.submit(prompt, settings()).unwrap();
            h.settle().await;
        }

        let expected = vec![
            Turn::user("hi"),
            Turn::assistant(""),
            Turn::user("again"),
            Turn::assistant("hello"),
            Turn::user("once more"),
            Turn::assistant(""),
        ];
        assert_eq!(h.session.turns(), expected.as_slice());
        assert_eq!(h.store.load("m1").unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prior_turns_are_sent_and_shown() {
        let generator = ScriptedGenerator::new(vec![Ok("one".to_string()), Ok("two".to_string())]);
        let mut h = Harness::new(generator.clone());

        h.session.submit("first", settings()).unwrap();
        h.settle().await;
        h.session.submit("second", settings()).unwrap();
        h.await_reply().await;
        assert_eq!(
            h.session.current_display_text(),
            "You: first\n\nAI: one\n\nYou: second\n\n"
        );
        h.settle().await;

        let prompts = generator.prompts.lock().unwrap().clone();
        assert_eq!(prompts[0], (String::new(), "first".to_string()));
        assert_eq!(prompts[1], ("You: first\n\nAI: one".to_string(), "second".to_string()));
        assert_eq!(
            h.session.current_display_text(),
            "You: first\n\nAI: one\n\nYou: second\n\nAI: two"
        );
    }

    #[tokio::test]
    async fn test_failed_generation_rolls_back() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Err(
            GenerationError::ConnectFailed("connection refused".to_string()),
        )]));
        h.store.append("m1", &[Turn::user("old"), Turn::assistant("reply")]).unwrap();
        h.session = {
            let turns = h.store.load("m1").unwrap();
            ConversationSession::new(1, "m1".to_string(), turns, h.session.ctx.clone())
        };
        let before = h.session.turns().to_vec();
        let transcript_before = h.transcript();

        h.session.submit("hi", settings()).unwrap();
        h.settle().await;

        assert_eq!(h.session.turns(), before.as_slice());
        assert_eq!(h.transcript(), transcript_before);
        assert!(h.session.error().unwrap().contains("connection refused"));
        assert!(h.session.is_input_enabled());
        assert_eq!(h.session.pending_prompt(), None);
        assert_eq!(h.session.current_display_text(), "You: old\n\nAI: reply");
    }

    #[tokio::test]
    async fn test_rejections_spawn_nothing() {
        let generator = ScriptedGenerator::new(vec![Ok("hello".to_string())]);
        let mut h = Harness::new(generator.clone());

        assert_eq!(h.session.submit("   \n", settings()), Err(Rejected::EmptyPrompt));
        assert_eq!(h.session.status(), Status::Idle);

        h.session.submit("hi", settings()).unwrap();
        assert_eq!(
            h.session.submit("again", settings()),
            Err(Rejected::Busy(Status::Generating))
        );
        assert_eq!(h.session.pending_prompt(), Some("hi"));

        let event = h.rx.recv().await.unwrap();
        h.session.handle_event(event.kind);
        assert_eq!(h.session.status(), Status::Animating);
        assert_eq!(
            h.session.submit("again", settings()),
            Err(Rejected::Busy(Status::Animating))
        );

        h.session.skip();
        tokio::task::yield_now().await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skip_finishes_reveal() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("a long reply".to_string())]));
        h.session.submit("hi", settings()).unwrap();
        let event = h.rx.recv().await.unwrap();
        h.session.handle_event(event.kind);

        assert!(h.session.skip());
        assert_eq!(h.session.status(), Status::Idle);
        assert_eq!(h.session.current_display_text(), "You: hi\n\nAI: a long reply");
        assert!(!h.session.handle_event(SessionEventKind::RevealTick(1)));
        assert!(!h.session.skip());
    }

    #[tokio::test]
    async fn test_submit_input_clears_buffer() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        h.session.set_input("  hi  ");
        h.session.submit_input(settings()).unwrap();
        assert_eq!(h.session.input(), "");
        assert_eq!(h.session.pending_prompt(), Some("hi"));

        h.session.set_input("   ");
        assert_eq!(h.session.submit_input(settings()), Err(Rejected::EmptyPrompt));
        assert_eq!(h.session.input(), "   ");
    }

    #[tokio::test]
    async fn test_clear_conversation() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        h.session.submit("hi", settings()).unwrap();
        h.settle().await;

        h.session.clear_conversation().unwrap();
        assert!(h.session.turns().is_empty());
        assert_eq!(h.transcript(), "");
        assert_eq!(h.session.current_display_text(), "");
    }

    #[tokio::test]
    async fn test_clear_failure_changes_nothing() {
        let dir = tempdir().unwrap();
        let files = Arc::new(FileTranscriptStore::new(dir.path()));
        files.append("m1", &[Turn::user("keep"), Turn::assistant("me")]).unwrap();
        let store = Arc::new(ClearFails((*files).clone()));
        let mut h = Harness::with_store(
            dir,
            files,
            store,
            ScriptedGenerator::new(vec![]),
        );
        let before = h.session.turns().to_vec();

        let result = h.session.clear_conversation();

        assert!(matches!(result, Err(ClearError::Persistence(_))));
        assert_eq!(h.session.turns(), before.as_slice());
        assert_eq!(h.transcript(), "You: keep\n\nAI: me\n\n");
        assert!(h.session.error().is_some());
    }

    #[tokio::test]
    async fn test_clear_rejected_while_generating() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        h.session.submit("hi", settings()).unwrap();
        assert!(matches!(
            h.session.clear_conversation(),
            Err(ClearError::Busy(Status::Generating))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_written_after_exchange() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        h.session.submit("hi", settings()).unwrap();

        let mut snapshot = None;
        while snapshot.is_none() {
            let event = h.rx.recv().await.unwrap();
            match event.kind {
                SessionEventKind::SnapshotSaved(path) => snapshot = Some(path),
                other => {
                    h.session.handle_event(other);
                }
            }
        }

        let snapshot = snapshot.unwrap();
        assert!(snapshot.starts_with(h.store.history_dir("m1")));
        assert_eq!(fs::read_to_string(snapshot).unwrap(), "You: hi\n\nAI: hello\n\n");
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_only_a_notice() {
        let mut h = Harness::new(ScriptedGenerator::new(vec![Ok("hello".to_string())]));
        let error = PersistenceError::Interrupted("cancelled".to_string());

        assert!(h.session.handle_event(SessionEventKind::SnapshotFailed(error)));
        assert!(h.session.notice().unwrap().contains("cancelled"));
        assert!(h.session.error().is_none());
        assert_eq!(h.session.status(), Status::Idle);
        h.session.submit("hi", settings()).unwrap();
    }
}
