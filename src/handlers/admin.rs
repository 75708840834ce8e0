use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::normalizer::{format_date, format_time, normalize_date};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    id: i64,
    name: String,
    email: String,
    reason: Option<String>,
    date: String,
    time: String,
    created_at: String,
}

pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = match query.date.as_deref() {
        Some(raw) => Some(
            normalize_date(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unrecognized date: {raw}")))?,
        ),
        None => None,
    };

    let appointments = state.store.list(date)?;

    let response = appointments
        .into_iter()
        .map(|a| AppointmentResponse {
            id: a.id,
            name: a.name,
            email: a.email,
            reason: a.reason,
            date: format_date(&a.date),
            time: format_time(&a.time),
            created_at: a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}
