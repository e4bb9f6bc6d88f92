// Terminal front end for a chat session.
// Each input line is typed into the composer and submitted with Enter; a line
// ending in '\' continues the draft on the next line (Shift+Enter).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, instrument};

use crate::app_state::{ChatState, Message};
use crate::config::ChatConfig;
use crate::constants::{APP_NAME, PENDING_LABEL, SUGGESTED_QUESTIONS, WELCOME_TEXT, WELCOME_TITLE};
use crate::events::Key;
use crate::responder::SimulatedResponder;
use crate::session::ChatSession;

#[derive(Debug, PartialEq, Eq)]
enum TerminalInput {
    Clear,
    Suggestion(usize),
    Continue(String),
    Line(String),
}

fn parse_line(line: &str, draft_empty: bool) -> TerminalInput {
    if line.trim() == "/clear" {
        return TerminalInput::Clear;
    }
    if draft_empty {
        if let Ok(n) = line.trim().parse::<usize>() {
            if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) {
                return TerminalInput::Suggestion(n - 1);
            }
        }
    }
    match line.strip_suffix('\\') {
        Some(head) => TerminalInput::Continue(head.to_string()),
        None => TerminalInput::Line(line.to_string()),
    }
}

pub async fn run_terminal_chat(config: &ChatConfig) -> Result<()> {
    let responder = Arc::new(SimulatedResponder::new(config.reply_delay));
    let session = ChatSession::new(responder, config);
    let state = run_chat(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!(messages = state.messages().len(), "Terminal chat ended");
    Ok(())
}

/// Drives `session` from `input` until EOF and returns the final state.
#[instrument(skip_all)]
pub async fn run_chat<R, W>(mut session: ChatSession, input: R, mut output: W) -> Result<ChatState>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_welcome(&mut output).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let draft = session.state().composer().to_string();
        match parse_line(&line, draft.is_empty()) {
            TerminalInput::Clear => {
                session.clear_composer();
                say(&mut output, "(draft cleared)\n").await?;
                continue;
            }
            TerminalInput::Suggestion(index) => {
                if session.select_suggestion(index) {
                    say(&mut output, &format!("> {}\n", SUGGESTED_QUESTIONS[index])).await?;
                }
            }
            TerminalInput::Continue(text) => {
                session.update_composer(format!("{draft}{text}"));
                session.handle_key(&Key::Enter, true, None);
                continue;
            }
            TerminalInput::Line(text) => {
                session.update_composer(format!("{draft}{text}"));
                session.handle_key(&Key::Enter, false, None);
            }
        }

        if session.state().is_pending() {
            say(&mut output, &format!("{PENDING_LABEL}\n")).await?;
            if let Some(reply) = session.next_reply().await {
                write_message(&mut output, &reply).await?;
            }
        }
    }

    Ok(session.state().clone())
}

async fn write_welcome<W: AsyncWrite + Unpin>(output: &mut W) -> Result<()> {
    let mut text = format!("🏛️  {WELCOME_TITLE}\n{WELCOME_TEXT}\n\nTry asking:\n");
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        text.push_str(&format!("  {}. 💡 {}\n", i + 1, question));
    }
    text.push_str("\nType a number to pick a suggestion. End a line with \\ to continue on the next line, /clear to drop the draft.\n\n");
    say(output, &text).await
}

async fn write_message<W: AsyncWrite + Unpin>(output: &mut W, message: &Message) -> Result<()> {
    let text = format!("\n{} · {}\n{}\n\n", APP_NAME, message.display_time(), message.content);
    say(output, &text).await
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output
        .write_all(text.as_bytes())
        .await
        .context("Failed to write output")?;
    output.flush().await.context("Failed to flush output")?;
    Ok(())
}
