use serde::Deserialize;

/// Keys the composer distinguishes. Everything but Enter passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other(String),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            other => Key::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Default newline insertion is suppressed and the composer is submitted.
    Submit,
    /// Literal newline at the cursor (character offset), or at the end.
    InsertNewline { cursor: Option<usize> },
    /// No special handling.
    PassThrough,
}

pub fn handle_key(key: &Key, shift: bool, cursor: Option<usize>) -> KeyAction {
    match (key, shift) {
        (Key::Enter, false) => KeyAction::Submit,
        (Key::Enter, true) => KeyAction::InsertNewline { cursor },
        _ => KeyAction::PassThrough,
    }
}

/// Inserts `\n` at a character offset, clamping offsets past the end.
pub fn insert_newline(text: &str, cursor: Option<usize>) -> String {
    let chars = text.chars().count();
    let at = cursor.unwrap_or(chars).min(chars);
    let byte = text
        .char_indices()
        .nth(at)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(text.len() + 1);
    out.push_str(&text[..byte]);
    out.push('\n');
    out.push_str(&text[byte..]);
    out
}

/// Events sent by the browser over the session socket.
///
/// `composer` on `submit` and `key` is the browser's input text at the time
/// of the event. It replaces the session's composer before the event is
/// handled, so the browser stays the owner of what was typed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Submit {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        composer: Option<String>,
    },
    Suggestion {
        index: usize,
    },
    Composer {
        text: String,
    },
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        cursor: Option<usize>,
        #[serde(default)]
        composer: Option<String>,
    },
    Clear,
}

/// One client frame: an event plus the browser's sequence number, echoed
/// back as `ack` once the event has been applied.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientFrame {
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub event: ClientEvent,
}

/// Sequence number of a frame whose event could not be parsed.
#[derive(Debug, Default, Deserialize)]
pub struct FrameSeq {
    #[serde(default)]
    pub seq: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_submits() {
        assert_eq!(handle_key(&Key::Enter, false, None), KeyAction::Submit);
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        assert_eq!(
            handle_key(&Key::Enter, true, Some(3)),
            KeyAction::InsertNewline { cursor: Some(3) }
        );
    }

    #[test]
    fn test_other_keys_pass_through() {
        assert_eq!(handle_key(&Key::from("a"), false, None), KeyAction::PassThrough);
        assert_eq!(handle_key(&Key::from("Tab"), true, None), KeyAction::PassThrough);
    }

    #[test]
    fn test_insert_newline_positions() {
        assert_eq!(insert_newline("abc", None), "abc\n");
        assert_eq!(insert_newline("abc", Some(1)), "a\nbc");
        assert_eq!(insert_newline("abc", Some(0)), "\nabc");
        assert_eq!(insert_newline("abc", Some(99)), "abc\n");
        assert_eq!(insert_newline("", None), "\n");
    }

    #[test]
    fn test_insert_newline_counts_characters() {
        assert_eq!(insert_newline("héllo", Some(2)), "hé\nllo");
        assert_eq!(insert_newline("🏛️ hi", Some(3)), "🏛️ \nhi");
    }

    #[test]
    fn test_parse_client_events() {
        let submit: ClientEvent = serde_json::from_str(r#"{"type":"submit"}"#).unwrap();
        assert_eq!(
            submit,
            ClientEvent::Submit {
                text: None,
                composer: None
            }
        );

        let key: ClientEvent =
            serde_json::from_str(r#"{"type":"key","key":"Enter","shift":true}"#).unwrap();
        assert_eq!(
            key,
            ClientEvent::Key {
                key: "Enter".into(),
                shift: true,
                cursor: None,
                composer: None
            }
        );

        let suggestion: ClientEvent =
            serde_json::from_str(r#"{"type":"suggestion","index":3}"#).unwrap();
        assert_eq!(suggestion, ClientEvent::Suggestion { index: 3 });

        let clear: ClientEvent = serde_json::from_str(r#"{"type":"clear"}"#).unwrap();
        assert_eq!(clear, ClientEvent::Clear);
    }

    #[test]
    fn test_frame_carries_sequence_and_composer() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"seq":7,"type":"key","key":"Enter","composer":"hello\nworld"}"#,
        )
        .unwrap();
        assert_eq!(frame.seq, Some(7));
        assert_eq!(
            frame.event,
            ClientEvent::Key {
                key: "Enter".into(),
                shift: false,
                cursor: None,
                composer: Some("hello\nworld".into())
            }
        );

        let bare: ClientFrame = serde_json::from_str(r#"{"type":"clear"}"#).unwrap();
        assert_eq!(bare.seq, None);
        assert_eq!(bare.event, ClientEvent::Clear);
    }

    #[test]
    fn test_sequence_survives_unknown_event() {
        let raw = r#"{"seq":4,"type":"explode"}"#;
        assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
        assert_eq!(serde_json::from_str::<FrameSeq>(raw).unwrap().seq, Some(4));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"explode"}"#).is_err());
    }
}
