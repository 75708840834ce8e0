pub mod groq;
pub mod ollama;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

fn chat_payload(system_prompt: &str, messages: &[Message]) -> Vec<serde_json::Value> {
    let mut payload = vec![serde_json::json!({
        "role": "system",
        "content": system_prompt,
    })];

    for msg in messages {
        payload.push(serde_json::json!({
            "role": msg.role,
            "content": msg.content,
        }));
    }
    payload
}
