use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::services::normalizer::{format_date, format_time, normalize_date};
use crate::services::slots;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SlotsResponse {
    date: String,
    available: Vec<String>,
}

// GET /api/slots/:date
pub async fn get_available(
    State(state): State<Arc<AppState>>,
    Path(raw_date): Path<String>,
) -> Result<Json<SlotsResponse>, AppError> {
    let date = normalize_date(&raw_date)
        .ok_or_else(|| AppError::BadRequest(format!("unrecognized date: {raw_date}")))?;

    let available = slots::available(state.store.as_ref(), date)?;

    Ok(Json(SlotsResponse {
        date: format_date(&date),
        available: available.iter().map(format_time).collect(),
    }))
}
