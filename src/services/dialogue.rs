use std::time::Duration;

use crate::models::{Session, Turn};
use crate::services::ai::prompts::{format_correction, instruction_prompt};
use crate::services::ai::{LlmProvider, Message};

pub const COMPLETION_MARKER: &str = "all details received:";

#[derive(Debug, thiserror::Error)]
pub enum CompletionServiceError {
    #[error("completion service call failed: {0:#}")]
    Failed(anyhow::Error),

    #[error("completion service timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion service returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub relay_text: String,
    pub done: bool,
}

pub fn is_terminal(reply: &str) -> bool {
    reply.to_lowercase().contains(COMPLETION_MARKER)
}

pub struct DialogueDriver<'a> {
    llm: &'a dyn LlmProvider,
    timeout: Duration,
}

impl<'a> DialogueDriver<'a> {
    pub fn new(llm: &'a dyn LlmProvider, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Runs one user turn. The session is only modified once the completion
    /// service has answered; a failed call leaves it exactly as it was.
    pub async fn advance(
        &self,
        session: &mut Session,
        user_text: &str,
    ) -> Result<Advance, CompletionServiceError> {
        let user_turn = Turn::user(user_text);
        let mut messages = session.messages();
        messages.push(user_turn.to_message());

        let reply = self
            .complete(instruction_prompt(session.intent), &messages)
            .await?;

        session.history.push(user_turn);

        if is_terminal(&reply) {
            // The terminal reply is consumed here and never replayed to the model.
            tracing::debug!(session = %session.key, "completion marker detected");
            return Ok(Advance {
                relay_text: reply,
                done: true,
            });
        }

        session.history.push(Turn::assistant(reply.clone()));
        Ok(Advance {
            relay_text: reply,
            done: false,
        })
    }

    /// Asks the model to re-emit a rejected summary block. Neither the
    /// rejected reply nor the correction is kept in the session history.
    pub async fn repair(
        &self,
        session: &Session,
        rejected: &str,
        problem: &str,
    ) -> Result<String, CompletionServiceError> {
        let mut messages = session.messages();
        messages.push(Message {
            role: "assistant".to_string(),
            content: rejected.to_string(),
        });
        messages.push(Message {
            role: "user".to_string(),
            content: format_correction(problem),
        });

        self.complete(instruction_prompt(session.intent), &messages)
            .await
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, CompletionServiceError> {
        let reply = tokio::time::timeout(self.timeout, self.llm.chat(system_prompt, messages))
            .await
            .map_err(|_| CompletionServiceError::Timeout(self.timeout))?
            .map_err(CompletionServiceError::Failed)?;

        if reply.trim().is_empty() {
            return Err(CompletionServiceError::EmptyReply);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::models::{Intent, Role};

    struct Scripted {
        replies: Mutex<Vec<anyhow::Result<String>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Scripted {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                seen: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("Anything else?".to_string()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl LlmProvider for Stalled {
        async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    fn session() -> Session {
        Session::new("s-1", Intent::Book, ChronoDuration::minutes(30))
    }

    #[test]
    fn test_marker_detection_is_case_insensitive_containment() {
        assert!(is_terminal("ALL DETAILS RECEIVED:\n- Name: Jo"));
        assert!(is_terminal("Thanks! all details received: see below"));
        assert!(!is_terminal("Could I have your email, please?"));
        assert!(!is_terminal("All details received"));
    }

    #[tokio::test]
    async fn test_non_terminal_reply_recorded() {
        let llm = Scripted::new(vec![Ok("What's your email?".to_string())]);
        let driver = DialogueDriver::new(&llm, Duration::from_secs(5));
        let mut s = session();

        let advance = driver.advance(&mut s, "Hi, I'm Jo").await.unwrap();
        assert!(!advance.done);
        assert_eq!(advance.relay_text, "What's your email?");
        assert_eq!(s.history.len(), 2);
        assert_eq!(s.history[0].role, Role::User);
        assert_eq!(s.history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_terminal_reply_not_recorded() {
        let llm = Scripted::new(vec![
            Ok("What's your email?".to_string()),
            Ok("All details received:\n- Name: Jo".to_string()),
            Ok("Hello again".to_string()),
        ]);
        let driver = DialogueDriver::new(&llm, Duration::from_secs(5));
        let mut s = session();

        driver.advance(&mut s, "Hi, I'm Jo").await.unwrap();
        let advance = driver.advance(&mut s, "jo@example.com").await.unwrap();
        assert!(advance.done);
        assert_eq!(s.history.len(), 3);
        assert!(s.history.iter().all(|t| !is_terminal(&t.content)));

        driver.advance(&mut s, "hello?").await.unwrap();
        let seen = llm.seen.lock().unwrap();
        assert!(seen[2].iter().all(|m| !is_terminal(&m.content)));
    }

    #[tokio::test]
    async fn test_failed_call_leaves_session_untouched() {
        let llm = Scripted::new(vec![Err(anyhow::anyhow!("connection refused"))]);
        let driver = DialogueDriver::new(&llm, Duration::from_secs(5));
        let mut s = session();
        let before = s.clone();

        let err = driver.advance(&mut s, "Hi").await.unwrap_err();
        assert!(matches!(err, CompletionServiceError::Failed(_)));
        assert_eq!(s, before);
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let llm = Scripted::new(vec![Ok("   ".to_string())]);
        let driver = DialogueDriver::new(&llm, Duration::from_secs(5));
        let mut s = session();

        let err = driver.advance(&mut s, "Hi").await.unwrap_err();
        assert!(matches!(err, CompletionServiceError::EmptyReply));
        assert!(s.history.is_empty());
    }

    #[tokio::test]
    async fn test_timeout() {
        let driver = DialogueDriver::new(&Stalled, Duration::from_millis(50));
        let mut s = session();

        let err = driver.advance(&mut s, "Hi").await.unwrap_err();
        assert!(matches!(err, CompletionServiceError::Timeout(_)));
        assert!(s.history.is_empty());
    }

    #[tokio::test]
    async fn test_repair_does_not_touch_history() {
        let llm = Scripted::new(vec![Ok("All details received:\n- Name: Jo".to_string())]);
        let driver = DialogueDriver::new(&llm, Duration::from_secs(5));
        let mut s = session();
        s.history.push(Turn::user("Hi"));
        let before = s.clone();

        let reply = driver
            .repair(&s, "All details: Jo", "missing field")
            .await
            .unwrap();
        assert!(is_terminal(&reply));
        assert_eq!(s, before);

        let seen = llm.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].role, "assistant");
        assert!(sent[2].content.contains("missing field"));
    }
}
