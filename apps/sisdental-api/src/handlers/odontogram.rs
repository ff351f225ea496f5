//! Odontograma: tratamentos por dente

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sisdental_db::models::NewTreatment;
use sisdental_db::repository::{AppointmentRepo, FinanceRepo, PatientRepo, TreatmentRepo};
use sisdental_db::{Record, Value};
use tracing::info;
use validator::Validate;

use super::{non_empty, success, today};
use crate::auth::StaffUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Itens recentes exibidos ao lado do odontograma
const OVERVIEW_LIMIT: i64 = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct TreatmentInput {
    pub patient_id: i64,
    /// Numeração FDI (11-48 permanentes, 51-85 decíduos)
    #[validate(range(min = 11, max = 85, message = "Número de dente inválido"))]
    pub tooth_number: i32,
    #[validate(length(min = 1, message = "Tipo de tratamento é obrigatório"))]
    pub treatment_type: String,
    pub treatment_date: NaiveDate,
    pub notes: Option<String>,
    pub next_session_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub completed: bool,
}

fn treatment_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Tratamento {} não encontrado", id))
}

/// GET /api/odontograma/:paciente_id
pub async fn overview(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(patient_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let name = PatientRepo::find_name(&state.pool, patient_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Paciente {} não encontrado", patient_id)))?;

    let treatments = TreatmentRepo::list_for_patient(&state.pool, patient_id).await?;
    let finances =
        FinanceRepo::list_for_patient(&state.pool, patient_id, Some(OVERVIEW_LIMIT)).await?;
    let appointments = AppointmentRepo::upcoming_for_patient(
        &state.pool,
        patient_id,
        today(),
        Some(OVERVIEW_LIMIT),
    )
    .await?;

    let mut patient = Record::new();
    patient.insert("id".into(), Value::Int(patient_id));
    patient.insert("name".into(), Value::Text(name));

    Ok(Json(state.compose([
        ("patient", Value::from(patient)),
        ("treatments", Value::from(treatments)),
        ("finances", Value::from(finances)),
        ("appointments", Value::from(appointments)),
    ])))
}

/// GET /api/odontograma/:paciente_id/tratamentos
pub async fn list(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(patient_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let records = TreatmentRepo::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(state.rows(records)))
}

/// POST /api/odontograma/tratamentos
///
/// Com valor positivo, cria junto o lançamento pendente do tratamento.
pub async fn create(
    State(state): State<AppState>,
    _user: StaffUser,
    Json(input): Json<TreatmentInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    input.validate()?;
    if input.amount.map_or(false, |a| a.is_sign_negative()) {
        return Err(AppError::Validation("Valor não pode ser negativo".into()));
    }
    if !PatientRepo::exists(&state.pool, input.patient_id).await? {
        return Err(AppError::NotFound(format!(
            "Paciente {} não encontrado",
            input.patient_id
        )));
    }

    let treatment = NewTreatment {
        patient_id: input.patient_id,
        tooth_number: input.tooth_number,
        treatment_type: input.treatment_type.trim().to_string(),
        treatment_date: input.treatment_date,
        notes: non_empty(input.notes),
        next_session_date: input.next_session_date,
        amount: input.amount,
        completed: input.completed,
    };
    let id = TreatmentRepo::create(&state.pool, &treatment).await?;
    info!(treatment_id = id, patient_id = treatment.patient_id, "Tratamento registrado");

    let record = TreatmentRepo::find(&state.pool, id)
        .await?
        .ok_or_else(|| treatment_not_found(id))?;
    Ok((StatusCode::CREATED, Json(state.row(record))))
}

/// DELETE /api/odontograma/tratamentos/:id
pub async fn delete(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !TreatmentRepo::delete(&state.pool, id).await? {
        return Err(treatment_not_found(id));
    }
    info!(treatment_id = id, "Tratamento excluído");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/odontograma/tratamentos/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<serde_json::Value>> {
    if !TreatmentRepo::set_completed(&state.pool, id, input.completed).await? {
        return Err(treatment_not_found(id));
    }
    Ok(success())
}
