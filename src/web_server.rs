use std::{net::SocketAddr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    serve, Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink, Stream};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::app_state::ChatState;
use crate::config::ChatConfig;
use crate::constants::{API_SERVICE_NAME, APP_NAME, APP_TAGLINE, COMPOSER_PLACEHOLDER};
use crate::events::{ClientEvent, ClientFrame, FrameSeq, Key};
use crate::responder::{answer_within, Responder, SimulatedResponder};
use crate::session::ChatSession;
use crate::view::{ChatView, ThreadView};

/// Envelope for every frame the server sends over the session socket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub message_type: String,
    pub payload: serde_json::Value,
}

impl ServerMessage {
    pub fn info(message: &str) -> Self {
        Self {
            message_type: "Info".to_string(),
            payload: serde_json::json!({ "message": message }),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            message_type: "Error".to_string(),
            payload: serde_json::json!({ "message": message }),
        }
    }

    pub fn state(view: &ChatView) -> serde_json::Result<Self> {
        Ok(Self {
            message_type: "State".to_string(),
            payload: serde_json::to_value(view)?,
        })
    }
}

/// Template environment, reloaded from disk when files change.
pub struct Templates {
    reloader: AutoReloader,
}

impl Templates {
    pub fn new(dir: &str) -> Self {
        let dir = dir.to_string();
        let reloader = AutoReloader::new(move |notifier| {
            // Create the loader *inside* the closure
            let mut env = Environment::new();
            env.set_loader(path_loader(&dir));
            notifier.watch_path(&dir, true);
            Ok(env)
        });
        Self { reloader }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        let env = self.reloader.acquire_env()?;
        let template = env.get_template(name)?;
        template.render(ctx)
    }
}

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<Templates>,
    config: Arc<ChatConfig>,
    responder: Arc<dyn Responder>,
}

impl AppState {
    pub fn new(config: ChatConfig, responder: Arc<dyn Responder>) -> Self {
        Self {
            templates: Arc::new(Templates::new(&config.templates_dir)),
            config: Arc::new(config),
            responder,
        }
    }
}

fn render_page<S: Serialize>(
    templates: &Templates,
    name: &str,
    ctx: S,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    templates.render(name, ctx).map(Html).map_err(|e| {
        error!("Failed to get or render template {}: {}", name, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("Internal Server Error: {}", e)),
        )
    })
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    render_page(
        &state.templates,
        "index.html",
        minijinja::context! {
            title => APP_NAME,
            tagline => APP_TAGLINE,
        },
    )
}

/// The chat fragment the page shell loads lazily, rendered in its empty state.
async fn chat_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let thread = ThreadView::from_state(&ChatState::new());
    let thread_html = state
        .templates
        .render("thread.html", &thread)
        .map_err(|e| {
            error!("Failed to render empty thread: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })?;
    render_page(
        &state.templates,
        "chat.html",
        minijinja::context! {
            app_name => APP_NAME,
            tagline => APP_TAGLINE,
            placeholder => COMPOSER_PLACEHOLDER,
            thread_html => minijinja::Value::from_safe_string(thread_html),
        },
    )
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": API_SERVICE_NAME,
        })),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, detail: String) -> ApiError {
    (status, Json(serde_json::json!({ "detail": detail })))
}

/// One-shot question answering, outside any chat session.
#[instrument(skip(state, request))]
async fn api_chat_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Question cannot be empty".to_string(),
        ));
    }

    match answer_within(
        state.responder.as_ref(),
        &request.question,
        state.config.answer_timeout,
    )
    .await
    {
        Ok(answer) => {
            info!(question = %request.question, "API question answered");
            Ok(Json(QueryResponse {
                question: request.question,
                answer,
            }))
        }
        Err(e) => {
            error!(question = %request.question, error = %e, "API question failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing query: {}", e),
            ))
        }
    }
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    debug!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let span = info_span!("session", id = %Uuid::new_v4());
    async move {
        info!("New WebSocket connection established");
        let session = ChatSession::new(Arc::clone(&state.responder), &state.config);
        let (sender, receiver) = socket.split();
        drive_session(session, &state.templates, receiver, sender).await;
        info!("WebSocket connection closed");
    }
    .instrument(span)
    .await
}

pub fn apply_client_event(session: &mut ChatSession, event: ClientEvent) {
    match event {
        ClientEvent::Submit { text, composer } => {
            if let Some(composer) = composer {
                session.update_composer(composer);
            }
            session.submit(text.as_deref());
        }
        ClientEvent::Suggestion { index } => {
            session.select_suggestion(index);
        }
        ClientEvent::Composer { text } => session.update_composer(text),
        ClientEvent::Key {
            key,
            shift,
            cursor,
            composer,
        } => {
            if let Some(composer) = composer {
                session.update_composer(composer);
            }
            session.handle_key(&Key::from(key.as_str()), shift, cursor);
        }
        ClientEvent::Clear => session.clear_composer(),
    }
}

pub fn render_view(
    session: &mut ChatSession,
    templates: &Templates,
    ack: u64,
) -> Result<ChatView, minijinja::Error> {
    let thread_html = templates.render("thread.html", ThreadView::from_state(session.state()))?;
    let scroll_to_latest = session.take_scroll_to_latest();
    let replace_composer = session.take_composer_replaced();
    Ok(ChatView {
        ack,
        ..ChatView::build(
            session.state(),
            thread_html,
            session.composer_height(),
            replace_composer,
            scroll_to_latest,
        )
    })
}

async fn send_frame<O>(outgoing: &mut O, frame: &ServerMessage) -> Result<()>
where
    O: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(frame).context("Failed to serialize server message")?;
    outgoing
        .send(Message::Text(json))
        .await
        .map_err(|_| anyhow!("WebSocket client disconnected or send error"))
}

async fn push_state<O>(
    session: &mut ChatSession,
    templates: &Templates,
    ack: u64,
    outgoing: &mut O,
) -> Result<()>
where
    O: Sink<Message> + Unpin,
{
    let frame = match render_view(session, templates, ack) {
        Ok(view) => ServerMessage::state(&view).context("Failed to serialize chat view")?,
        Err(e) => {
            error!("Failed to render thread: {}", e);
            ServerMessage::error("Failed to render the conversation")
        }
    };
    send_frame(outgoing, &frame).await
}

/// Runs one session over a socket until the client goes away. Client frames
/// and reply completions are handled one at a time; a fresh view is pushed
/// after each, acknowledging the last client sequence number seen.
pub async fn drive_session<I, O>(
    mut session: ChatSession,
    templates: &Templates,
    mut incoming: I,
    mut outgoing: O,
) where
    I: Stream<Item = Result<Message, axum::Error>> + Unpin,
    O: Sink<Message> + Unpin,
{
    if let Err(e) = send_frame(&mut outgoing, &ServerMessage::info("Connected to Constitution GPT")).await {
        warn!("Failed to send welcome message: {}", e);
        return;
    }
    let mut ack = 0;
    if let Err(e) = push_state(&mut session, templates, ack, &mut outgoing).await {
        warn!("Failed to send initial state: {}", e);
        return;
    }

    loop {
        tokio::select! {
            Some(reply) = session.next_reply() => {
                debug!(id = %reply.id, error = reply.is_error, "Reply appended");
                if let Err(e) = push_state(&mut session, templates, ack, &mut outgoing).await {
                    warn!("{}. Closing connection.", e);
                    break;
                }
            }
            frame = incoming.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let result = match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(frame) => {
                                debug!(seq = ?frame.seq, event = ?frame.event, "Client event");
                                ack = frame.seq.unwrap_or(ack);
                                apply_client_event(&mut session, frame.event);
                                push_state(&mut session, templates, ack, &mut outgoing).await
                            }
                            Err(e) => {
                                warn!("Ignoring malformed client frame: {}", e);
                                // a rejected frame still counts as seen
                                if let Some(seq) = serde_json::from_str::<FrameSeq>(&text).ok().and_then(|f| f.seq) {
                                    ack = seq;
                                }
                                send_frame(&mut outgoing, &ServerMessage::error(&format!("Malformed event: {}", e))).await
                            }
                        };
                        if let Err(e) = result {
                            warn!("{}. Closing connection.", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("Received unexpected binary message from client");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Axum answers pings itself
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested WebSocket close");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                    None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                }
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    let static_files_service = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/chat", get(chat_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(api_chat_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(config: ChatConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let responder = Arc::new(SimulatedResponder::new(config.reply_delay));
    let app = router(AppState::new(config, responder));

    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
