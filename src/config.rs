use std::env;
use std::str::FromStr;

const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub llm_provider: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub completion_timeout_secs: u64,
    pub session_backend: SessionBackend,
    pub session_ttl_minutes: i64,
    pub session_capacity: usize,
    pub session_purge_interval_secs: u64,
    pub format_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "dentdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            completion_timeout_secs: parsed("COMPLETION_TIMEOUT_SECS", 60),
            session_backend: match env::var("SESSION_BACKEND").as_deref() {
                Ok("sqlite") => SessionBackend::Sqlite,
                _ => SessionBackend::Memory,
            },
            session_ttl_minutes: parsed("SESSION_TTL_MINUTES", 30),
            session_capacity: parsed("SESSION_CAPACITY", 1000),
            session_purge_interval_secs: parsed("SESSION_PURGE_INTERVAL_SECS", 60),
            format_retries: parsed("FORMAT_RETRIES", 1),
        }
    }

    pub fn completion_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES))
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
