use crate::config::AppConfig;
use crate::db::store::AppointmentStore;
use crate::services::ai::LlmProvider;
use crate::services::sessions::{SessionLocks, SessionStore};

pub struct AppState {
    pub config: AppConfig,
    pub store: Box<dyn AppointmentStore>,
    pub sessions: Box<dyn SessionStore>,
    pub session_locks: SessionLocks,
    pub llm: Box<dyn LlmProvider>,
}
