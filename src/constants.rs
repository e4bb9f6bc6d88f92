// Constants for the chat interface, with directory locations overridable from the environment.

use std::env;
use std::time::Duration;

/// Example prompts shown on the empty thread, in display order.
pub const SUGGESTED_QUESTIONS: [&str; 6] = [
    "How is the Prime Minister elected in Nepal?",
    "What are the fundamental rights of citizens?",
    "What are the duties of citizens?",
    "How is the President elected?",
    "What is the structure of the Federal Parliament?",
    "What are the provisions for freedom of speech?",
];

pub const APP_NAME: &str = "Constitution GPT";
/// Service name reported by the JSON API.
pub const API_SERVICE_NAME: &str = "Constitution GPT API";
pub const APP_TAGLINE: &str = "AI-Powered Constitutional Intelligence";
pub const WELCOME_TITLE: &str = "Welcome to Constitution GPT";
pub const WELCOME_TEXT: &str = "Ask any question about the Constitution of Nepal. Get accurate, citation-backed answers with proper hierarchical structure.";
pub const COMPOSER_PLACEHOLDER: &str = "Ask about the Constitution of Nepal...";
pub const PENDING_LABEL: &str = "Analyzing constitution...";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(30);

// Composer sizing, in layout units (px in the browser).
pub const COMPOSER_MAX_HEIGHT: u32 = 200;
pub const COMPOSER_LINE_HEIGHT: u32 = 24;
pub const COMPOSER_VERTICAL_PADDING: u32 = 32;
pub const DEFAULT_COMPOSER_COLUMNS: usize = 80;

lazy_static::lazy_static! {
    pub static ref TEMPLATES_DIR: String = env::var("CGPT_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("CGPT_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}
