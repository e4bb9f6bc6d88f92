use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    // Assistant-style message reporting a failed answer
    pub is_error: bool,
}

impl Message {
    pub fn user(id: String, content: String, timestamp: DateTime<Local>) -> Self {
        Self {
            id,
            role: Role::User,
            content,
            timestamp,
            is_error: false,
        }
    }

    pub fn assistant(id: String, content: String, timestamp: DateTime<Local>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content,
            timestamp,
            is_error: false,
        }
    }

    pub fn error(id: String, content: String, timestamp: DateTime<Local>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(id, content, timestamp)
        }
    }

    /// Localized hour:minute shown under each bubble.
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Hands out message ids derived from creation time.
///
/// Ids are the creation time in milliseconds, bumped past the previous id when
/// two messages land in the same millisecond, so they stay unique and strictly
/// increasing within a session.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, at: DateTime<Local>) -> String {
        let id = at.timestamp_millis().max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// The only ways a [`ChatState`] may change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    AppendUser {
        id: String,
        content: String,
        at: DateTime<Local>,
    },
    AppendAssistant {
        id: String,
        content: String,
        at: DateTime<Local>,
        is_error: bool,
    },
    SetComposer(String),
    SetPending(bool),
}

/// Conversation state of one session: the thread, the composer draft and the
/// pending flag. Messages are append-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    messages: Vec<Message>,
    composer: String,
    pending: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn send_enabled(&self) -> bool {
        !self.composer.trim().is_empty() && !self.pending
    }

    pub fn show_clear(&self) -> bool {
        !self.composer.is_empty()
    }

    pub fn apply(mut self, transition: Transition) -> Self {
        match transition {
            Transition::AppendUser { id, content, at } => {
                self.messages.push(Message::user(id, content, at));
            }
            Transition::AppendAssistant {
                id,
                content,
                at,
                is_error,
            } => {
                let message = if is_error {
                    Message::error(id, content, at)
                } else {
                    Message::assistant(id, content, at)
                };
                self.messages.push(message);
            }
            Transition::SetComposer(text) => self.composer = text,
            Transition::SetPending(pending) => self.pending = pending,
        }
        self
    }

    /// Text a submit would send: a non-empty explicit text verbatim, otherwise
    /// the trimmed composer. `None` when the text is blank or a reply is still
    /// pending.
    pub fn resolve_submission(&self, text: Option<&str>) -> Option<String> {
        if self.pending {
            return None;
        }
        let query = match text.filter(|t| !t.is_empty()) {
            Some(explicit) => explicit,
            None => self.composer.trim(),
        };
        if query.trim().is_empty() {
            None
        } else {
            Some(query.to_string())
        }
    }

    /// Next state after a submit together with the query to answer, or `None`
    /// if the submit is a no-op.
    pub fn begin_submit(
        &self,
        text: Option<&str>,
        ids: &mut IdGenerator,
        at: DateTime<Local>,
    ) -> Option<(ChatState, String)> {
        let query = self.resolve_submission(text)?;
        let next = self
            .clone()
            .apply(Transition::AppendUser {
                id: ids.next_id(at),
                content: query.clone(),
                at,
            })
            .apply(Transition::SetComposer(String::new()))
            .apply(Transition::SetPending(true));
        Some((next, query))
    }

    /// Appends the reply (or the error standing in for it) and clears pending.
    pub fn complete_reply(
        self,
        content: String,
        is_error: bool,
        ids: &mut IdGenerator,
        at: DateTime<Local>,
    ) -> Self {
        self.apply(Transition::AppendAssistant {
            id: ids.next_id(at),
            content,
            at,
            is_error,
        })
        .apply(Transition::SetPending(false))
    }
}
