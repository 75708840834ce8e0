use serde::Serialize;

use crate::models::{FieldSet, Intent, Outcome, Session};
use crate::services::dialogue::DialogueDriver;
use crate::services::extractor::extract;
use crate::services::reconcile::reconcile;
use crate::state::AppState;

const SERVICE_UNAVAILABLE_REPLY: &str =
    "Sorry, I'm having trouble right now. Please try again in a moment.";
const PROCESSING_FAILED_REPLY: &str =
    "Sorry, I couldn't process those details. Please start again.";
const CLOSED_REPLY: &str = "Okay, I've closed this conversation. Come back any time.";

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "stop"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    InProgress,
    Completed,
    UnsupportedAction,
    ServiceUnavailable,
    ProcessingFailed,
    Closed,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reply {
    pub text: String,
    pub status: ReplyStatus,
    pub session_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl Reply {
    fn new(text: impl Into<String>, status: ReplyStatus, session_closed: bool) -> Self {
        Self {
            text: text.into(),
            status,
            session_closed,
            outcome: None,
        }
    }

    fn completed(outcome: Outcome) -> Self {
        Self {
            text: outcome.message(),
            status: ReplyStatus::Completed,
            session_closed: true,
            outcome: Some(outcome),
        }
    }
}

pub async fn begin_or_continue(
    state: &AppState,
    session_key: &str,
    intent_hint: &str,
    user_text: &str,
) -> Reply {
    let Some(intent) = Intent::parse(intent_hint) else {
        tracing::info!(session = %session_key, intent = %intent_hint, "unsupported action");
        return Reply::new(
            format!(
                "Sorry, \"{}\" isn't something I can help with. I can book, cancel or reschedule an appointment.",
                intent_hint.trim()
            ),
            ReplyStatus::UnsupportedAction,
            false,
        );
    };

    let _turn = state.session_locks.acquire(session_key).await;
    let text = user_text.trim();

    if is_exit(text) {
        end_session(state, session_key);
        tracing::info!(session = %session_key, "session abandoned by user");
        return Reply::new(CLOSED_REPLY, ReplyStatus::Closed, true);
    }

    let mut session = match state.sessions.load(session_key) {
        Ok(Some(s)) if s.intent == intent => s,
        Ok(Some(s)) => {
            tracing::info!(
                session = %session_key,
                from = s.intent.as_str(),
                to = intent.as_str(),
                "intent changed, starting a new dialogue"
            );
            Session::new(session_key, intent, state.config.session_ttl())
        }
        Ok(None) => Session::new(session_key, intent, state.config.session_ttl()),
        Err(e) => {
            tracing::error!(error = %e, session = %session_key, "failed to load session");
            return Reply::new(SERVICE_UNAVAILABLE_REPLY, ReplyStatus::ServiceUnavailable, false);
        }
    };

    let driver = DialogueDriver::new(state.llm.as_ref(), state.config.completion_timeout());
    let advance = match driver.advance(&mut session, text).await {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(error = %e, session = %session_key, "completion service failed");
            return Reply::new(SERVICE_UNAVAILABLE_REPLY, ReplyStatus::ServiceUnavailable, false);
        }
    };

    if !advance.done {
        session.touch(state.config.session_ttl());
        if let Err(e) = state.sessions.save(&session) {
            tracing::error!(error = %e, session = %session_key, "failed to save session");
            return Reply::new(SERVICE_UNAVAILABLE_REPLY, ReplyStatus::ServiceUnavailable, false);
        }
        return Reply::new(advance.relay_text, ReplyStatus::InProgress, false);
    }

    // One terminal attempt per session: whatever happens next, the session ends.
    let reply = match collect_fields(state, &driver, &session, advance.relay_text).await {
        Some(fields) => match reconcile(state.store.as_ref(), &fields) {
            Ok(outcome) => Reply::completed(outcome),
            Err(e) => {
                tracing::error!(error = %e, session = %session_key, "reconciliation failed");
                Reply::new(PROCESSING_FAILED_REPLY, ReplyStatus::ProcessingFailed, true)
            }
        },
        None => Reply::new(PROCESSING_FAILED_REPLY, ReplyStatus::ProcessingFailed, true),
    };

    end_session(state, session_key);
    reply
}

pub async fn abandon(state: &AppState, session_key: &str) {
    let _turn = state.session_locks.acquire(session_key).await;
    end_session(state, session_key);
}

async fn collect_fields(
    state: &AppState,
    driver: &DialogueDriver<'_>,
    session: &Session,
    terminal_text: String,
) -> Option<FieldSet> {
    let mut terminal = terminal_text;
    let mut retries_left = state.config.format_retries;

    loop {
        let err = match extract(session.intent, &terminal) {
            Ok(fields) => return Some(fields),
            Err(e) => e,
        };

        if retries_left == 0 {
            tracing::warn!(error = %err, session = %session.key, "could not extract details");
            return None;
        }
        retries_left -= 1;

        tracing::info!(error = %err, session = %session.key, "summary rejected, asking model to resend");
        terminal = match driver.repair(session, &terminal, &err.to_string()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, session = %session.key, "completion service failed during repair");
                return None;
            }
        };
    }
}

fn end_session(state: &AppState, session_key: &str) {
    if let Err(e) = state.sessions.remove(session_key) {
        tracing::error!(error = %e, session = %session_key, "failed to remove session");
    }
}

fn is_exit(text: &str) -> bool {
    let word = text.trim_end_matches(['.', '!']).to_lowercase();
    EXIT_WORDS.contains(&word.as_str())
}
