//! Lançamentos financeiros

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sisdental_db::models::{NewFinancialEntry, PaymentStatus};
use sisdental_db::repository::{FinanceRepo, PatientRepo};
use sisdental_db::Value;
use tracing::info;
use validator::Validate;

use super::success;
use crate::auth::StaffUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct EntryInput {
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    #[validate(length(min = 1, message = "Descrição é obrigatória"))]
    pub description: String,
    /// Aceita número ou texto decimal
    pub amount: Decimal,
    #[serde(default)]
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Lançamento {} não encontrado", id))
}

/// GET /api/financeiro/lancamentos
pub async fn list(State(state): State<AppState>, _user: StaffUser) -> AppResult<Json<Value>> {
    let records = FinanceRepo::list_with_patient(&state.pool).await?;
    Ok(Json(state.rows(records)))
}

/// POST /api/financeiro/lancamentos
pub async fn create(
    State(state): State<AppState>,
    _user: StaffUser,
    Json(input): Json<EntryInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    input.validate()?;
    if input.amount.is_sign_negative() {
        return Err(AppError::Validation("Valor não pode ser negativo".into()));
    }
    if !PatientRepo::exists(&state.pool, input.patient_id).await? {
        return Err(AppError::NotFound(format!(
            "Paciente {} não encontrado",
            input.patient_id
        )));
    }

    let entry = NewFinancialEntry {
        patient_id: input.patient_id,
        treatment_id: None,
        appointment_id: input.appointment_id,
        description: input.description.trim().to_string(),
        amount: input.amount,
        status: input.status,
        due_date: input.due_date,
        paid_date: input.paid_date,
    };
    let id = FinanceRepo::create(&state.pool, &entry).await?;
    info!(entry_id = id, patient_id = entry.patient_id, "Lançamento criado");

    let record = FinanceRepo::find_with_patient(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok((StatusCode::CREATED, Json(state.row(record))))
}

/// DELETE /api/financeiro/lancamentos/:id
pub async fn delete(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    if !FinanceRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    info!(entry_id = id, "Lançamento excluído");
    Ok(success())
}

/// PUT /api/financeiro/lancamentos/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<serde_json::Value>> {
    if !FinanceRepo::update_status(&state.pool, id, input.status, input.paid_date).await? {
        return Err(not_found(id));
    }
    info!(entry_id = id, status = %input.status, "Status do lançamento alterado");
    Ok(success())
}
