pub mod app_state;
pub mod chat;
pub mod config;
pub mod constants;
pub mod events;
pub mod responder;
pub mod session;
pub mod view;
pub mod web_server;

pub use app_state::{ChatState, IdGenerator, Message, Role, Transition};
pub use config::ChatConfig;
pub use responder::{AnswerError, Responder, SimulatedResponder};
pub use session::ChatSession;
