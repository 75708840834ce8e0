use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Intent;
use crate::services::ai::Message;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub key: String,
    pub intent: Intent,
    pub history: Vec<Turn>,
    pub created_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    pub fn new(key: &str, intent: Intent, ttl: Duration) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            key: key.to_string(),
            intent,
            history: vec![],
            created_at: now,
            last_activity: now,
            expires_at: now + ttl,
        }
    }

    pub fn touch(&mut self, ttl: Duration) {
        let now = Utc::now().naive_utc();
        self.last_activity = now;
        self.expires_at = now + ttl;
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }

    pub fn messages(&self) -> Vec<Message> {
        self.history.iter().map(Turn::to_message).collect()
    }
}
