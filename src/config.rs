use std::time::Duration;

use crate::constants;

/// Runtime settings shared by the web server and the terminal chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub host: String,
    pub port: u16,
    /// Fixed wait before the simulated reply is posted.
    pub reply_delay: Duration,
    /// Upper bound on a single answer; exceeding it is reported inline.
    pub answer_timeout: Duration,
    /// Composer width used to measure wrapped rows.
    pub composer_columns: usize,
    pub templates_dir: String,
    pub static_dir: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: constants::DEFAULT_PORT,
            reply_delay: constants::DEFAULT_REPLY_DELAY,
            answer_timeout: constants::DEFAULT_ANSWER_TIMEOUT,
            composer_columns: constants::DEFAULT_COMPOSER_COLUMNS,
            templates_dir: constants::TEMPLATES_DIR.clone(),
            static_dir: constants::STATIC_DIR.clone(),
        }
    }
}

/// Session options accepted by both subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    #[arg(
        long,
        env = "CGPT_REPLY_DELAY_MS",
        default_value_t = constants::DEFAULT_REPLY_DELAY.as_millis() as u64,
        help = "Delay before the simulated assistant reply, in milliseconds."
    )]
    pub reply_delay_ms: u64,
    #[arg(
        long,
        env = "CGPT_ANSWER_TIMEOUT_MS",
        default_value_t = constants::DEFAULT_ANSWER_TIMEOUT.as_millis() as u64,
        help = "Give up on an answer after this many milliseconds."
    )]
    pub answer_timeout_ms: u64,
    #[arg(
        long,
        env = "CGPT_COMPOSER_COLUMNS",
        default_value_t = constants::DEFAULT_COMPOSER_COLUMNS,
        help = "Composer width in columns, used for auto-grow."
    )]
    pub composer_columns: usize,
}

impl SessionArgs {
    pub fn apply(&self, config: &mut ChatConfig) {
        config.reply_delay = Duration::from_millis(self.reply_delay_ms);
        config.answer_timeout = Duration::from_millis(self.answer_timeout_ms);
        config.composer_columns = self.composer_columns.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.reply_delay, Duration::from_millis(1500));
        assert_eq!(config.answer_timeout, Duration::from_secs(30));
        assert_eq!(config.composer_columns, 80);
    }

    #[test]
    fn test_session_args_override_defaults() {
        let args = SessionArgs {
            reply_delay_ms: 10,
            answer_timeout_ms: 250,
            composer_columns: 0,
        };
        let mut config = ChatConfig::default();
        args.apply(&mut config);
        assert_eq!(config.reply_delay, Duration::from_millis(10));
        assert_eq!(config.answer_timeout, Duration::from_millis(250));
        assert_eq!(config.composer_columns, 1);
    }
}
