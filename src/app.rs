use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::error::DiscoveryError;
use crate::manager::SessionManager;
use crate::session::{Rejected, SessionContext, SessionEvent, Status};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::style::Style;
use std::path::PathBuf;
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tui_textarea::{Input, TextArea};

pub const SETUP_INSTRUCTIONS: &str = "To use NeuraTalk, you need to:\n\n\
    1. Install Ollama from https://ollama.ai\n\
    2. Start the Ollama service with 'ollama serve'\n\
    3. Install a model with 'ollama pull <model-name>'\n\n\
    Example: ollama pull llama3.2";

#[derive(Debug, PartialEq, Clone)]
pub enum Action {
    Render,
    Resize(u16, u16),
    Quit,
    Error(String),
    UserInput(crossterm::event::KeyEvent),
    Scroll(i16),
    LoadModels,
    ModelsLoaded(Vec<String>),
    DiscoveryFailed(DiscoveryError),
    EnterModelSelect,
    SwitchMode(Mode),
    OpenChat(String),
    CloseChat,
    LastChat,
    NextChat,
    SendMessage,
    SkipReveal,
    ClearHistory,
    ChangeSpeed(f64),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Mode {
    Insert,
    Normal,
    ModelSelect,
}

pub struct App<'a> {
    pub manager: SessionManager,
    pub catalog: ModelCatalog,
    pub action_tx: mpsc::UnboundedSender<Action>,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub models: Vec<String>,
    pub selected_model: usize,
    pub input: TextArea<'a>,
    pub vertical_scroll: u16,
    pub auto_scroll: bool,
    pub mode: Mode,
    pub loading: bool,
    pub error: Option<String>,
    pub show_help: bool,
    pub show_setup: bool,
    pub spinner_state: ThrobberState,
}

fn new_input<'a>() -> TextArea<'a> {
    let mut textarea = TextArea::default();
    // Disable default cursor line style (underline)
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Type a message...");
    textarea
}

impl<'a> App<'a> {
    pub fn new(
        action_tx: mpsc::UnboundedSender<Action>,
        config: Config,
        ctx: SessionContext,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            manager: SessionManager::new(ctx),
            catalog: ModelCatalog::new(config.ollama_binary.clone()),
            action_tx,
            config,
            config_path,
            models: Vec::new(),
            selected_model: 0,
            input: new_input(),
            vertical_scroll: 0,
            auto_scroll: true,
            mode: Mode::Insert,
            loading: false,
            error: None,
            show_help: false,
            show_setup: false,
            spinner_state: ThrobberState::default(),
        }
    }

    /// True while the focused chat waits for its reply.
    pub fn is_generating(&self) -> bool {
        self.manager
            .current()
            .is_some_and(|s| s.status() == Status::Generating)
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) -> bool {
        let visible = self.manager.current_id() == Some(event.session);
        let changed = self.manager.dispatch(event);
        changed && visible
    }

    fn send_message(&mut self) {
        let content = self.input.lines().join("\n");
        if content.trim().is_empty() {
            return;
        }
        let settings = self.config.settings();
        let Some(session) = self.manager.current_mut() else {
            self.error = Some("Open a chat first (Ctrl+o)".to_string());
            return;
        };

        session.set_input(content);
        match session.submit_input(settings) {
            Ok(()) => {
                self.input = new_input();
                self.error = None;
                self.auto_scroll = true;
            }
            Err(Rejected::Busy(_)) => {
                self.error = Some("Wait for the current reply to finish".to_string());
            }
            Err(Rejected::EmptyPrompt) => {}
        }
    }

    fn open_chat(&mut self, model: &str) {
        match self.manager.create_session(model) {
            Ok(_) => {
                self.error = None;
                self.vertical_scroll = 0;
                self.auto_scroll = true;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn change_speed(&mut self, delta: f64) {
        self.config
            .set_animation_speed(self.config.animation_speed + delta);
        self.manager.set_reveal_rate(self.config.settings().reveal);
        info!(speed = self.config.animation_speed, "Animation speed changed");

        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Saving settings failed");
                self.error = Some(format!("Settings not saved: {e}"));
            }
        }
    }

    fn scroll(&mut self, delta: i16) {
        if delta > 0 {
            self.vertical_scroll = self.vertical_scroll.saturating_add(delta as u16);
        } else {
            self.vertical_scroll = self.vertical_scroll.saturating_sub(delta.unsigned_abs());
        }
        self.auto_scroll = false;
    }

    pub async fn update(&mut self, action: Action) -> bool {
        match action {
            Action::Error(e) => {
                self.error = Some(e);
                self.loading = false;
                true
            }
            Action::LoadModels => {
                self.loading = true;
                let catalog = self.catalog.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = tokio::task::spawn_blocking(move || catalog.list_models()).await;
                    let action = match result {
                        Ok(Ok(models)) => Action::ModelsLoaded(models),
                        Ok(Err(e)) => Action::DiscoveryFailed(e),
                        Err(e) => Action::Error(format!("Model discovery crashed: {e}")),
                    };
                    let _ = tx.send(action);
                });
                true
            }
            Action::ModelsLoaded(models) => {
                self.loading = false;
                self.show_setup = false;
                self.models = models;
                self.selected_model = 0;
                true
            }
            Action::DiscoveryFailed(e) => {
                warn!(error = %e, "Model discovery failed");
                self.loading = false;
                self.models.clear();
                self.show_setup = true;
                self.error = Some(e.to_string());
                true
            }
            Action::EnterModelSelect => {
                self.mode = Mode::ModelSelect;
                true
            }
            Action::SwitchMode(mode) => {
                self.mode = mode;
                true
            }
            Action::OpenChat(model) => {
                self.open_chat(&model);
                self.mode = Mode::Insert;
                true
            }
            Action::CloseChat => {
                if let Some(id) = self.manager.current_id() {
                    self.manager.close_session(id);
                }
                true
            }
            Action::LastChat => {
                match self.manager.focus_last_chat() {
                    Ok(Some(_)) => self.auto_scroll = true,
                    Ok(None) => self.error = Some("No previous chat".to_string()),
                    Err(e) => self.error = Some(e.to_string()),
                }
                true
            }
            Action::NextChat => {
                if self.manager.focus_next() {
                    self.auto_scroll = true;
                }
                true
            }
            Action::SendMessage => {
                self.send_message();
                true
            }
            Action::SkipReveal => self.manager.current_mut().is_some_and(|s| s.skip()),
            Action::ClearHistory => {
                if let Some(session) = self.manager.current_mut() {
                    match session.clear_conversation() {
                        Ok(()) => {
                            self.vertical_scroll = 0;
                            self.error = None;
                        }
                        Err(e) => self.error = Some(e.to_string()),
                    }
                }
                true
            }
            Action::ChangeSpeed(delta) => {
                self.change_speed(delta);
                true
            }
            Action::Scroll(delta) => {
                self.scroll(delta);
                true
            }
            Action::UserInput(key) => {
                self.handle_key(key);
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Global shortcuts
        if ctrl {
            let action = match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('l') => Some(Action::ClearHistory),
                KeyCode::Char('o') => Some(Action::EnterModelSelect),
                KeyCode::Char('r') => Some(Action::LastChat),
                KeyCode::Char('w') => Some(Action::CloseChat),
                _ => None,
            };
            if let Some(action) = action {
                let _ = self.action_tx.send(action);
                return;
            }
        }

        if self.show_help {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::F(1) => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match self.mode {
            Mode::Insert => match key.code {
                KeyCode::Esc => {
                    let _ = self.action_tx.send(Action::SwitchMode(Mode::Normal));
                }
                KeyCode::F(1) => self.show_help = true,
                KeyCode::PageUp => self.scroll(-5),
                KeyCode::PageDown => self.scroll(5),
                KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => {
                    let _ = self.action_tx.send(Action::SendMessage);
                }
                _ => {
                    // Typing is disabled while a reply is generated.
                    if !self.is_generating() {
                        self.input.input(Input::from(key));
                    }
                }
            },
            Mode::Normal => match key.code {
                KeyCode::Char('i') | KeyCode::Enter => {
                    let _ = self.action_tx.send(Action::SwitchMode(Mode::Insert));
                }
                KeyCode::Char('q') => {
                    let _ = self.action_tx.send(Action::Quit);
                }
                KeyCode::Char('s') => {
                    let _ = self.action_tx.send(Action::SkipReveal);
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    let _ = self.action_tx.send(Action::ChangeSpeed(10.0));
                }
                KeyCode::Char('-') => {
                    let _ = self.action_tx.send(Action::ChangeSpeed(-10.0));
                }
                KeyCode::Tab => {
                    let _ = self.action_tx.send(Action::NextChat);
                }
                KeyCode::Char('j') | KeyCode::Down => self.scroll(1),
                KeyCode::Char('k') | KeyCode::Up => self.scroll(-1),
                KeyCode::PageUp => self.scroll(-10),
                KeyCode::PageDown => self.scroll(10),
                KeyCode::F(1) => self.show_help = true,
                _ => {} // Ignore other keys in Normal mode
            },
            Mode::ModelSelect => match key.code {
                KeyCode::Esc => {
                    let _ = self.action_tx.send(Action::SwitchMode(Mode::Insert));
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected_model = self.selected_model.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.selected_model + 1 < self.models.len() {
                        self.selected_model += 1;
                    }
                }
                KeyCode::Char('r') => {
                    let _ = self.action_tx.send(Action::LoadModels);
                }
                KeyCode::Enter => {
                    if let Some(model) = self.models.get(self.selected_model) {
                        let _ = self.action_tx.send(Action::OpenChat(model.clone()));
                    }
                }
                _ => {} // Ignore other keys in ModelSelect mode
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::ScriptedGenerator;
    use crate::transcript::{FileTranscriptStore, TranscriptStore, Turn};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        store: Arc<FileTranscriptStore>,
        app: App<'static>,
        rx: mpsc::UnboundedReceiver<Action>,
        events: mpsc::UnboundedReceiver<SessionEvent>,
    }

    fn fixture(replies: Vec<Result<String, crate::error::GenerationError>>) -> Fixture {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileTranscriptStore::new(dir.path().join("conversations")));
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let ctx = SessionContext {
            generator: ScriptedGenerator::new(replies),
            store: store.clone(),
            events: events_tx,
        };
        let config = Config {
            conversations_dir: Some(dir.path().join("conversations")),
            ..Config::default()
        };
        let config_path = Some(dir.path().join("config.toml"));
        Fixture {
            _dir: dir,
            store,
            app: App::new(tx, config, ctx, config_path),
            rx,
            events,
        }
    }

    fn key(code: KeyCode) -> Action {
        Action::UserInput(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[tokio::test]
    async fn test_app_initialization() {
        let f = fixture(vec![]);
        assert!(f.app.manager.sessions().is_empty());
        assert_eq!(f.app.mode, Mode::Insert);
        assert!(f.app.auto_scroll);
    }

    #[tokio::test]
    async fn test_models_loaded() {
        let mut f = fixture(vec![]);
        let models = vec!["model1".to_string(), "model2".to_string()];
        f.app.update(Action::ModelsLoaded(models.clone())).await;

        assert_eq!(f.app.models, models);
        assert!(!f.app.loading);
    }

    #[tokio::test]
    async fn test_discovery_failure_shows_setup() {
        let mut f = fixture(vec![]);
        f.app
            .update(Action::DiscoveryFailed(DiscoveryError::NoModelsInstalled))
            .await;
        assert!(f.app.show_setup);
        assert!(f.app.error.as_ref().unwrap().contains("ollama pull"));
    }

    #[tokio::test]
    async fn test_user_typing() {
        let mut f = fixture(vec![]);
        f.app.update(key(KeyCode::Char('a'))).await;
        assert_eq!(f.app.input.lines()[0], "a");
    }

    #[tokio::test]
    async fn test_send_without_chat_reports_error() {
        let mut f = fixture(vec![]);
        f.app.update(key(KeyCode::Char('a'))).await;
        f.app.update(Action::SendMessage).await;
        assert!(f.app.error.is_some());
        assert_eq!(f.app.input.lines()[0], "a");
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let mut f = fixture(vec![Ok("hello".to_string())]);
        f.app.update(Action::OpenChat("m1".to_string())).await;
        f.app.update(key(KeyCode::Char('h'))).await;
        f.app.update(key(KeyCode::Char('i'))).await;
        f.app.update(Action::SendMessage).await;

        assert!(f.app.is_generating());
        assert_eq!(f.app.input.lines()[0], "");
        // Typing is ignored while generating.
        f.app.update(key(KeyCode::Char('x'))).await;
        assert_eq!(f.app.input.lines()[0], "");

        let event = f.events.recv().await.unwrap();
        assert!(f.app.handle_session_event(event));
        f.app.update(Action::SkipReveal).await;

        let session = f.app.manager.current().unwrap();
        assert_eq!(session.current_display_text(), "You: hi\n\nAI: hello");
        assert_eq!(
            f.store.load("m1").unwrap(),
            vec![Turn::user("hi"), Turn::assistant("hello")]
        );
    }

    #[tokio::test]
    async fn test_scroll_logic() {
        let mut f = fixture(vec![]);
        f.app.vertical_scroll = 10;
        f.app.update(key(KeyCode::PageUp)).await;
        assert_eq!(f.app.vertical_scroll, 5);
        assert!(!f.app.auto_scroll);

        f.app.update(key(KeyCode::PageDown)).await;
        assert_eq!(f.app.vertical_scroll, 10);
    }

    #[tokio::test]
    async fn test_resize_left_to_main_loop() {
        let mut f = fixture(vec![]);
        assert!(!f.app.update(Action::Resize(80, 24)).await);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mut f = fixture(vec![]);
        f.app.update(Action::Error("Connection failed".to_string())).await;
        assert_eq!(f.app.error, Some("Connection failed".to_string()));
        assert!(!f.app.loading);
    }

    #[tokio::test]
    async fn test_model_select_opens_chat() {
        let mut f = fixture(vec![]);
        f.app
            .update(Action::ModelsLoaded(vec!["a".to_string(), "b".to_string()]))
            .await;
        f.app.update(Action::EnterModelSelect).await;
        assert_eq!(f.app.mode, Mode::ModelSelect);

        f.app.update(key(KeyCode::Down)).await;
        f.app.update(key(KeyCode::Enter)).await;
        assert_eq!(f.rx.recv().await, Some(Action::OpenChat("b".to_string())));

        f.app.update(Action::OpenChat("b".to_string())).await;
        assert_eq!(f.app.mode, Mode::Insert);
        assert_eq!(f.app.manager.current().unwrap().model_id(), "b");
        assert!(f.store.transcript_path("b").exists());
    }

    #[tokio::test]
    async fn test_ctrl_c_in_model_select() {
        let mut f = fixture(vec![]);
        f.app.mode = Mode::ModelSelect;

        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        f.app.update(Action::UserInput(key)).await;

        match f.rx.try_recv() {
            Ok(Action::Quit) => {}
            other => panic!("Expected Quit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_help_menu_toggle() {
        let mut f = fixture(vec![]);
        f.app.update(key(KeyCode::F(1))).await;
        assert!(f.app.show_help);
        f.app.update(key(KeyCode::Esc)).await;
        assert!(!f.app.show_help);
        f.app.update(key(KeyCode::F(1))).await;
        f.app.update(key(KeyCode::Char('q'))).await;
        assert!(!f.app.show_help);
    }

    #[tokio::test]
    async fn test_change_speed_persists_settings() {
        let mut f = fixture(vec![]);
        f.app.update(Action::ChangeSpeed(10.0)).await;
        assert_eq!(f.app.config.animation_speed, 30.0);

        let path = f.app.config_path.clone().unwrap();
        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.animation_speed, 30.0);
    }

    #[tokio::test]
    async fn test_last_chat_reopens() {
        let mut f = fixture(vec![]);
        f.app.update(Action::LastChat).await;
        assert!(f.app.error.is_some());

        f.app.update(Action::OpenChat("m1".to_string())).await;
        f.app.update(Action::CloseChat).await;
        assert!(f.app.manager.current().is_none());

        f.app.update(Action::LastChat).await;
        assert_eq!(f.app.manager.current().unwrap().model_id(), "m1");
    }
}
