//! Cadastro de pacientes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use sisdental_db::models::{cpf_digits, NewPatient};
use sisdental_db::repository::{
    AppointmentRepo, DocumentRepo, FinanceRepo, PatientRepo, TreatmentRepo,
};
use sisdental_db::Value;
use tracing::{info, warn};
use validator::Validate;

use super::{non_empty, success};
use crate::auth::StaffUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Parte do nome
    pub busca: Option<String>,
    pub pagina: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatientInput {
    #[validate(length(min = 1, message = "Nome é obrigatório"))]
    pub name: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl PatientInput {
    fn into_new_patient(self) -> AppResult<NewPatient> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Nome é obrigatório".into()));
        }
        Ok(NewPatient {
            name,
            cpf: non_empty(self.cpf).map(|c| cpf_digits(&c)).filter(|c| !c.is_empty()),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            birth_date: self.birth_date,
        })
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Paciente {} não encontrado", id))
}

/// GET /api/pacientes?busca=&pagina=
pub async fn list(
    State(state): State<AppState>,
    _user: StaffUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let search = non_empty(query.busca);
    let page = query.pagina.unwrap_or(1).max(1);
    let records = PatientRepo::list(&state.pool, search.as_deref(), page).await?;
    Ok(Json(state.rows(records)))
}

/// GET /api/pacientes/listar
pub async fn list_names(State(state): State<AppState>, _user: StaffUser) -> AppResult<Json<Value>> {
    let records = PatientRepo::list_names(&state.pool).await?;
    Ok(Json(state.rows(records)))
}

/// POST /api/pacientes
pub async fn create(
    State(state): State<AppState>,
    _user: StaffUser,
    Json(input): Json<PatientInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    input.validate()?;
    let patient = input.into_new_patient()?;

    let id = PatientRepo::create(&state.pool, &patient).await?;
    info!(patient_id = id, "Paciente cadastrado");

    let record = PatientRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;
    Ok((StatusCode::CREATED, Json(state.row(record))))
}

/// GET /api/pacientes/:id
///
/// Ficha completa: dados cadastrais, agenda, financeiro, tratamentos e
/// documentos.
pub async fn details(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let patient = PatientRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;

    let appointments = AppointmentRepo::list_for_patient(&state.pool, id).await?;
    let finances = FinanceRepo::list_for_patient(&state.pool, id, None).await?;
    let treatments = TreatmentRepo::history_for_patient(&state.pool, id).await?;
    let documents = DocumentRepo::list_for_patient(&state.pool, id).await?;

    Ok(Json(state.compose([
        ("patient", Value::from(patient)),
        ("appointments", Value::from(appointments)),
        ("finances", Value::from(finances)),
        ("treatments", Value::from(treatments)),
        ("documents", Value::from(documents)),
    ])))
}

/// PUT /api/pacientes/:id
pub async fn update(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
    Json(input): Json<PatientInput>,
) -> AppResult<Json<Value>> {
    input.validate()?;
    let patient = input.into_new_patient()?;

    if !PatientRepo::update(&state.pool, id, &patient).await? {
        return Err(not_found(id));
    }
    info!(patient_id = id, "Paciente atualizado");

    let record = PatientRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(state.row(record)))
}

/// DELETE /api/pacientes/:id
pub async fn delete(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    // As linhas de `documents` somem em cascata; os arquivos cifrados não
    let storage_paths = DocumentRepo::storage_paths_for_patient(&state.pool, id).await?;
    if !PatientRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    for path in &storage_paths {
        if let Err(e) = state.store.delete(path).await {
            warn!(patient_id = id, error = %e, "Falha ao remover documento do paciente excluído");
        }
    }
    info!(patient_id = id, documents = storage_paths.len(), "Paciente excluído");
    Ok(success())
}
