//! Serializable snapshots of a session, as consumed by the templates and the
//! browser script.

use serde::Serialize;

use crate::app_state::{ChatState, Message, Role};
use crate::constants::{
    COMPOSER_LINE_HEIGHT, COMPOSER_MAX_HEIGHT, COMPOSER_VERTICAL_PADDING, PENDING_LABEL,
    SUGGESTED_QUESTIONS, WELCOME_TEXT, WELCOME_TITLE,
};

/// Height of the auto-growing composer for `text`, capped at
/// [`COMPOSER_MAX_HEIGHT`].
pub fn composer_height(text: &str, columns: usize) -> u32 {
    // every '\n' starts a row, including a trailing one
    let rows = textwrap::wrap(text, columns.max(1)).len().max(1);
    let rows = u32::try_from(rows).unwrap_or(u32::MAX);
    rows.saturating_mul(COMPOSER_LINE_HEIGHT)
        .saturating_add(COMPOSER_VERTICAL_PADDING)
        .min(COMPOSER_MAX_HEIGHT)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub time: String,
    pub is_error: bool,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            role: message.role,
            content: message.content.clone(),
            time: message.display_time(),
            is_error: message.is_error,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuggestionView {
    pub index: usize,
    pub text: &'static str,
}

pub fn suggestions() -> Vec<SuggestionView> {
    SUGGESTED_QUESTIONS
        .iter()
        .copied()
        .enumerate()
        .map(|(index, text)| SuggestionView { index, text })
        .collect()
}

/// Context for the `thread.html` fragment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreadView {
    pub messages: Vec<MessageView>,
    pub pending: bool,
    pub pending_label: &'static str,
    pub show_welcome: bool,
    pub welcome_title: &'static str,
    pub welcome_text: &'static str,
    pub suggestions: Vec<SuggestionView>,
}

impl ThreadView {
    pub fn from_state(state: &ChatState) -> Self {
        Self {
            messages: state.messages().iter().map(MessageView::from).collect(),
            pending: state.is_pending(),
            pending_label: PENDING_LABEL,
            show_welcome: state.is_empty(),
            welcome_title: WELCOME_TITLE,
            welcome_text: WELCOME_TEXT,
            suggestions: suggestions(),
        }
    }
}

/// Everything the browser needs to repaint after a state change.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatView {
    pub thread_html: String,
    pub composer: String,
    /// The session rewrote the composer (submit, clear, newline insert).
    pub replace_composer: bool,
    /// Sequence number of the last client frame applied. The browser only
    /// adopts `composer` when this matches its latest frame.
    pub ack: u64,
    pub composer_height: u32,
    pub pending: bool,
    pub send_enabled: bool,
    pub show_clear: bool,
    pub show_welcome: bool,
    pub scroll_to_latest: bool,
    pub message_count: usize,
}

impl ChatView {
    pub fn build(
        state: &ChatState,
        thread_html: String,
        composer_height: u32,
        replace_composer: bool,
        scroll_to_latest: bool,
    ) -> Self {
        Self {
            thread_html,
            composer: state.composer().to_string(),
            replace_composer,
            ack: 0,
            composer_height,
            pending: state.is_pending(),
            send_enabled: state.send_enabled(),
            show_clear: state.show_clear(),
            show_welcome: state.is_empty(),
            scroll_to_latest,
            message_count: state.messages().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::Transition;

    #[test]
    fn test_empty_composer_is_one_row() {
        assert_eq!(composer_height("", 80), COMPOSER_LINE_HEIGHT + COMPOSER_VERTICAL_PADDING);
        assert_eq!(composer_height("hello", 80), 56);
    }

    #[test]
    fn test_composer_grows_with_lines() {
        assert_eq!(composer_height("a\nb", 80), 2 * 24 + 32);
        assert_eq!(composer_height("a\nb\n", 80), 3 * 24 + 32);
        assert_eq!(composer_height("a\n\nb", 80), 3 * 24 + 32);
    }

    #[test]
    fn test_composer_grows_with_wrapping() {
        let text = "word ".repeat(30); // ~150 columns
        assert_eq!(composer_height(text.trim_end(), 80), 2 * 24 + 32);
    }

    #[test]
    fn test_composer_height_is_capped() {
        let text = "line\n".repeat(50);
        assert_eq!(composer_height(&text, 80), COMPOSER_MAX_HEIGHT);
    }

    #[test]
    fn test_thread_view_empty_state() {
        let view = ThreadView::from_state(&ChatState::new());
        assert!(view.show_welcome);
        assert_eq!(view.suggestions.len(), 6);
        assert_eq!(view.suggestions[0].text, "How is the Prime Minister elected in Nepal?");
        assert_eq!(view.suggestions[5].index, 5);
    }

    #[test]
    fn test_chat_view_mirrors_state() {
        let state = ChatState::new()
            .apply(Transition::SetComposer("draft".into()))
            .apply(Transition::SetPending(true));
        let view = ChatView::build(&state, "<p></p>".into(), 56, true, false);
        assert_eq!(view.composer, "draft");
        assert!(view.replace_composer);
        assert!(!view.scroll_to_latest);
        assert!(view.pending);
        assert!(!view.send_enabled);
        assert!(view.show_clear);
        assert!(view.show_welcome);
        assert_eq!(view.message_count, 0);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
