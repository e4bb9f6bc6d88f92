use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app_state::{ChatState, IdGenerator, Message, Transition};
use crate::config::ChatConfig;
use crate::constants::SUGGESTED_QUESTIONS;
use crate::events::{self, Key, KeyAction};
use crate::responder::{answer_within, error_reply, AnswerError, Responder};
use crate::view;

#[derive(Debug)]
struct Reply {
    query: String,
    outcome: Result<String, AnswerError>,
}

/// One in-memory conversation.
///
/// All mutations go through `&mut self`, so the owner serializes them. A submit
/// spawns the answer as a task; its result comes back through
/// [`ChatSession::next_reply`]. Dropping the session aborts a reply still in
/// flight.
#[derive(Debug)]
pub struct ChatSession {
    state: ChatState,
    ids: IdGenerator,
    responder: Arc<dyn Responder>,
    answer_timeout: Duration,
    composer_columns: usize,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: mpsc::UnboundedReceiver<Reply>,
    in_flight: Option<JoinHandle<()>>,
    // message count at the last scroll check
    seen_messages: usize,
    // composer rewritten by the session rather than typed by the user
    composer_replaced: bool,
}

impl ChatSession {
    pub fn new(responder: Arc<dyn Responder>, config: &ChatConfig) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            state: ChatState::new(),
            ids: IdGenerator::new(),
            responder,
            answer_timeout: config.answer_timeout,
            composer_columns: config.composer_columns,
            replies_tx,
            replies_rx,
            in_flight: None,
            seen_messages: 0,
            composer_replaced: false,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn composer_height(&self) -> u32 {
        view::composer_height(self.state.composer(), self.composer_columns)
    }

    /// Sends `text`, or the trimmed composer when `text` is `None`. Returns
    /// `false` without touching state when there is nothing to send or a reply
    /// is still pending.
    pub fn submit(&mut self, text: Option<&str>) -> bool {
        let Some((next, query)) = self.state.begin_submit(text, &mut self.ids, Local::now()) else {
            debug!(pending = self.state.is_pending(), "Submit ignored");
            return false;
        };
        self.state = next;
        self.composer_replaced = true;
        info!(query = %query, "Question submitted");
        self.spawn_reply(query);
        true
    }

    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match SUGGESTED_QUESTIONS.get(index) {
            Some(question) => self.submit(Some(*question)),
            None => {
                warn!(index, "Unknown suggestion index");
                false
            }
        }
    }

    pub fn update_composer(&mut self, text: String) {
        self.set_composer(text);
    }

    pub fn clear_composer(&mut self) {
        self.set_composer(String::new());
        self.composer_replaced = true;
    }

    pub fn handle_key(&mut self, key: &Key, shift: bool, cursor: Option<usize>) -> KeyAction {
        let action = events::handle_key(key, shift, cursor);
        match &action {
            KeyAction::Submit => {
                self.submit(None);
            }
            KeyAction::InsertNewline { cursor } => {
                let text = events::insert_newline(self.state.composer(), *cursor);
                self.set_composer(text);
                self.composer_replaced = true;
            }
            KeyAction::PassThrough => {}
        }
        action
    }

    /// True when the thread changed since the last call, i.e. the view should
    /// scroll to the newest message.
    pub fn take_scroll_to_latest(&mut self) -> bool {
        let count = self.state.messages().len();
        let changed = count != self.seen_messages;
        self.seen_messages = count;
        changed
    }

    /// True when the composer text was rewritten (cleared, submitted, newline
    /// inserted) since the last call, so the input control must be overwritten.
    pub fn take_composer_replaced(&mut self) -> bool {
        std::mem::take(&mut self.composer_replaced)
    }

    /// Waits for the pending reply and appends it. Never resolves while
    /// nothing is pending. Cancel safe.
    pub async fn next_reply(&mut self) -> Option<Message> {
        let reply = self.replies_rx.recv().await?;
        self.apply_reply(reply)
    }

    fn set_composer(&mut self, text: String) {
        self.state = std::mem::take(&mut self.state).apply(Transition::SetComposer(text));
    }

    fn spawn_reply(&mut self, query: String) {
        let responder = Arc::clone(&self.responder);
        let tx = self.replies_tx.clone();
        let timeout = self.answer_timeout;
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = answer_within(responder.as_ref(), &query, timeout).await;
            // receiver gone means the session was dropped
            let _ = tx.send(Reply { query, outcome });
        }));
    }

    fn apply_reply(&mut self, reply: Reply) -> Option<Message> {
        self.in_flight = None;
        let (content, is_error) = match reply.outcome {
            Ok(answer) => {
                info!(query = %reply.query, "Answer received");
                (answer, false)
            }
            Err(e) => {
                warn!(query = %reply.query, error = %e, "Answer failed");
                (error_reply(&e), true)
            }
        };
        self.state = std::mem::take(&mut self.state).complete_reply(
            content,
            is_error,
            &mut self.ids,
            Local::now(),
        );
        self.state.messages().last().cloned()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!("Aborting in-flight reply");
            handle.abort();
        }
    }
}
