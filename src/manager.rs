use crate::error::PersistenceError;
use crate::reveal::RevealRate;
use crate::session::{ConversationSession, SessionContext, SessionEvent, SessionId, Status};
use tracing::{debug, info};

/// The open chats (one per tab), which one is focused, and which one was
/// opened last.
pub struct SessionManager {
    ctx: SessionContext,
    sessions: Vec<ConversationSession>,
    /// Closed while generating. Kept until the reply lands so a reopened
    /// tab picks the same session back up.
    detached: Vec<ConversationSession>,
    current: Option<SessionId>,
    last_chat: Option<LastChat>,
    next_id: SessionId,
}

#[derive(Debug, Clone)]
struct LastChat {
    id: SessionId,
    model_id: String,
}

impl SessionManager {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            sessions: Vec::new(),
            detached: Vec::new(),
            current: None,
            last_chat: None,
            next_id: 1,
        }
    }

    /// Opens a chat bound to `model_id`, loading its transcript.
    ///
    /// A model never has two open sessions: asking again focuses the existing one.
    pub fn create_session(&mut self, model_id: &str) -> Result<SessionId, PersistenceError> {
        if let Some(existing) = self.sessions.iter().find(|s| s.model_id() == model_id) {
            let id = existing.id();
            debug!(session = id, model = model_id, "Model already open, focusing");
            self.focus(id);
            return Ok(id);
        }

        if let Some(index) = self.detached.iter().position(|s| s.model_id() == model_id) {
            let session = self.detached.remove(index);
            let id = session.id();
            info!(session = id, model = model_id, "Reopened chat with reply in flight");
            self.sessions.push(session);
            self.focus(id);
            return Ok(id);
        }

        self.ctx.store.ensure_exists(model_id)?;
        let turns = self.ctx.store.load(model_id)?;

        let id = self.next_id;
        self.next_id += 1;
        info!(session = id, model = model_id, turns = turns.len(), "Opened chat");
        self.sessions.push(ConversationSession::new(
            id,
            model_id.to_string(),
            turns,
            self.ctx.clone(),
        ));
        self.current = Some(id);
        self.last_chat = Some(LastChat {
            id,
            model_id: model_id.to_string(),
        });
        Ok(id)
    }

    /// Closes the tab. An exchange in flight still completes and persists.
    pub fn close_session(&mut self, id: SessionId) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id() == id) else {
            return false;
        };
        let session = self.sessions.remove(index);
        info!(session = id, "Closed chat");
        if session.status() == Status::Generating {
            self.detached.push(session);
        }

        if self.current == Some(id) {
            let next = index.min(self.sessions.len().saturating_sub(1));
            self.current = self.sessions.get(next).map(|s| s.id());
        }
        true
    }

    pub fn focus(&mut self, id: SessionId) -> bool {
        let Some(session) = self.sessions.iter().find(|s| s.id() == id) else {
            return false;
        };
        self.last_chat = Some(LastChat {
            id,
            model_id: session.model_id().to_string(),
        });
        self.current = Some(id);
        true
    }

    /// Focuses the next tab, wrapping around.
    pub fn focus_next(&mut self) -> bool {
        if self.sessions.is_empty() {
            return false;
        }
        let index = self
            .current
            .and_then(|id| self.sessions.iter().position(|s| s.id() == id))
            .map_or(0, |i| (i + 1) % self.sessions.len());
        let id = self.sessions[index].id();
        self.focus(id)
    }

    /// Re-selects the last chat, reopening it from its transcript if its tab
    /// was closed. `None` when no chat was ever opened.
    pub fn focus_last_chat(&mut self) -> Result<Option<SessionId>, PersistenceError> {
        let Some(last) = self.last_chat.clone() else {
            return Ok(None);
        };
        if self.focus(last.id) {
            return Ok(Some(last.id));
        }
        self.create_session(&last.model_id).map(Some)
    }

    /// Routes a background message to its session. A closed session still
    /// waiting for its reply takes it without a reveal and is then released;
    /// anything else for a closed tab is dropped.
    pub fn dispatch(&mut self, event: SessionEvent) -> bool {
        if let Some(session) = self.get_mut(event.session) {
            return session.handle_event(event.kind);
        }

        match self.detached.iter().position(|s| s.id() == event.session) {
            Some(index) => {
                let session = &mut self.detached[index];
                session.handle_event(event.kind);
                session.skip();
                if session.status() == Status::Idle {
                    debug!(session = event.session, "Closed chat finished its exchange");
                    self.detached.remove(index);
                }
            }
            None => debug!(session = event.session, "Dropping event for closed chat"),
        }
        false
    }

    pub fn set_reveal_rate(&mut self, rate: RevealRate) {
        for session in &mut self.sessions {
            session.set_reveal_rate(rate);
        }
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current
    }

    pub fn current(&self) -> Option<&ConversationSession> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current_mut(&mut self) -> Option<&mut ConversationSession> {
        let id = self.current?;
        self.get_mut(id)
    }

    pub fn get(&self, id: SessionId) -> Option<&ConversationSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut ConversationSession> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    pub fn sessions(&self) -> &[ConversationSession] {
        &self.sessions
    }
}
