use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

/// Ways the answer service can fail. Each is shown inline in the thread.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("Could not reach the answer service: {0}")]
    Network(String),
    #[error("The answer service did not respond within {} seconds", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("The answer service returned an unreadable response: {0}")]
    MalformedResponse(String),
}

/// Produces the assistant's answer to a question. The answer is expected to
/// already carry its citation formatting.
#[async_trait]
pub trait Responder: Send + Sync + std::fmt::Debug {
    async fn answer(&self, question: &str) -> Result<String, AnswerError>;
}

/// Stand-in for the retrieval backend: waits a fixed delay, then returns a
/// canned reply quoting the question.
#[derive(Debug, Clone)]
pub struct SimulatedResponder {
    delay: Duration,
}

impl SimulatedResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Responder for SimulatedResponder {
    #[instrument(skip(self), fields(delay_ms = self.delay.as_millis() as u64))]
    async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        tokio::time::sleep(self.delay).await;
        debug!("Simulated reply ready");
        Ok(simulated_reply(question))
    }
}

pub fn simulated_reply(question: &str) -> String {
    format!(
        "This is a simulated response to: \"{question}\"\n\n\
        In a production environment, this would connect to your RAG backend at the retrieval_pipeline.py endpoint \
        to fetch constitutional information with proper citations and hierarchical structure.\n\n\
        📘 Part 7 – Federal Executive\n\
        Article 76 – Constitution of Council of Ministers\n\n\
        🔹 Sub-article (1)\n\
        As per Part 7, Article 76, Sub-article (1):\n\
        • The President shall appoint the leader of a parliamentary party that commands a majority \
        in the House of Representatives as the Prime Minister..."
    )
}

/// Asks `responder`, giving up with [`AnswerError::Timeout`] after `limit`.
pub async fn answer_within(
    responder: &dyn Responder,
    question: &str,
    limit: Duration,
) -> Result<String, AnswerError> {
    match tokio::time::timeout(limit, responder.answer(question)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AnswerError::Timeout(limit)),
    }
}

/// Text of the inline message that replaces a failed answer.
pub fn error_reply(error: &AnswerError) -> String {
    format!("⚠️ {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_reply_quotes_question() {
        let reply = simulated_reply("How is the President elected?");
        assert!(reply.starts_with("This is a simulated response to: \"How is the President elected?\"\n\n"));
        assert!(reply.contains("📘 Part 7 – Federal Executive\nArticle 76 – Constitution of Council of Ministers"));
        assert!(reply.contains("🔹 Sub-article (1)\nAs per Part 7, Article 76, Sub-article (1):\n• The President"));
        assert!(reply.ends_with("as the Prime Minister..."));
    }

    #[test]
    fn test_simulated_reply_keeps_one_paragraph_per_line() {
        let reply = simulated_reply("q");
        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines[2], "In a production environment, this would connect to your RAG backend at the retrieval_pipeline.py endpoint to fetch constitutional information with proper citations and hierarchical structure.");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_error_reply_text() {
        let timeout = AnswerError::Timeout(Duration::from_secs(30));
        assert_eq!(
            error_reply(&timeout),
            "⚠️ The answer service did not respond within 30 seconds"
        );
        let network = AnswerError::Network("connection refused".into());
        assert!(error_reply(&network).contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_within_times_out() {
        let responder = SimulatedResponder::new(Duration::from_secs(60));
        let outcome = answer_within(&responder, "q", Duration::from_secs(30)).await;
        assert_eq!(outcome, Err(AnswerError::Timeout(Duration::from_secs(30))));

        let quick = SimulatedResponder::new(Duration::from_millis(10));
        assert!(answer_within(&quick, "q", Duration::from_secs(30)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_responder_waits_the_delay() {
        let responder = SimulatedResponder::new(Duration::from_millis(1500));
        let started = tokio::time::Instant::now();
        let reply = responder.answer("Who appoints the Prime Minister?").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(reply.contains("Who appoints the Prime Minister?"));
    }
}
