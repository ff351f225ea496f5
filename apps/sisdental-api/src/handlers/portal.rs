//! Portal do paciente: primeiro acesso, login e área própria

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sisdental_db::models::cpf_digits;
use sisdental_db::repository::{AppointmentRepo, DocumentRepo, FinanceRepo, PatientRepo, TreatmentRepo};
use sisdental_db::Value;
use tracing::{info, warn};

use super::documents::{file_response, find_file};
use super::{success, today};
use crate::auth::jwt::{generate_token, ROLE_PATIENT};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::PatientUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FirstAccessRequest {
    pub cpf: String,
    pub birth_date: NaiveDate,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub cpf: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PatientInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub patient: PatientInfo,
}

/// POST /portal/primeiro-acesso
///
/// Define a senha do portal uma única vez, conferindo CPF e nascimento.
pub async fn first_access(
    State(state): State<AppState>,
    Json(input): Json<FirstAccessRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let cpf = cpf_digits(&input.cpf);
    if cpf.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation("Todos os campos são obrigatórios".into()));
    }
    if input.password != input.password_confirmation {
        return Err(AppError::Validation("As senhas não coincidem".into()));
    }
    validate_password_strength(&input.password).map_err(AppError::Validation)?;

    let patient = PatientRepo::find_for_first_access(&state.pool, &cpf, input.birth_date)
        .await?
        .ok_or_else(|| AppError::Unauthorized("CPF ou data de nascimento inválidos".into()))?;
    if patient.password_hash.is_some() {
        return Err(AppError::Conflict(
            "Sua conta já foi configurada. Use o login".into(),
        ));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::Internal(format!("Falha ao gerar hash: {e}")))?;
    // Outra requisição pode ter gravado a senha entre a leitura e o UPDATE
    if !PatientRepo::set_password_hash(&state.pool, patient.id, &password_hash).await? {
        warn!(patient_id = patient.id, "Primeiro acesso concorrente recusado");
        return Err(AppError::Conflict(
            "Sua conta já foi configurada. Use o login".into(),
        ));
    }

    info!(patient_id = patient.id, "Senha do portal configurada");
    Ok(success())
}

/// POST /portal/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let cpf = cpf_digits(&input.cpf);
    if cpf.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation("CPF e senha são obrigatórios".into()));
    }

    let credentials = PatientRepo::find_credentials(&state.pool, &cpf).await?;
    let (patient, stored_hash) = match credentials {
        Some(c) => match c.password_hash.clone() {
            Some(hash) => (c, hash),
            None => {
                return Err(AppError::Unauthorized(
                    "Primeiro acesso pendente: configure sua senha".into(),
                ))
            }
        },
        None => return Err(AppError::Unauthorized("CPF ou senha inválidos".into())),
    };

    let valid = verify_password(&input.password, &stored_hash)
        .map_err(|e| AppError::Internal(format!("Falha ao verificar senha: {e}")))?;
    if !valid {
        warn!(patient_id = patient.id, "Senha incorreta no portal");
        return Err(AppError::Unauthorized("CPF ou senha inválidos".into()));
    }

    let config = &state.config.jwt;
    let access_token = generate_token(patient.id, ROLE_PATIENT, &patient.name, config)
        .map_err(|e| AppError::Internal(format!("Falha ao gerar token: {e}")))?;

    info!(patient_id = patient.id, "Login no portal");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: config.expiry_hours * 3600,
        patient: PatientInfo {
            id: patient.id,
            name: patient.name,
        },
    }))
}

/// GET /portal/home
pub async fn home(State(state): State<AppState>, user: PatientUser) -> AppResult<Json<Value>> {
    let id = user.patient_id;

    let treatments = TreatmentRepo::history_for_patient(&state.pool, id).await?;
    let finances = FinanceRepo::list_for_patient(&state.pool, id, None).await?;
    let appointments = AppointmentRepo::upcoming_for_patient(&state.pool, id, today(), None).await?;
    let documents = DocumentRepo::list_for_patient(&state.pool, id).await?;

    Ok(Json(state.compose([
        ("name", Value::from(user.name)),
        ("treatments", Value::from(treatments)),
        ("finances", Value::from(finances)),
        ("appointments", Value::from(appointments)),
        ("documents", Value::from(documents)),
    ])))
}

/// GET /portal/documentos/:id/download
///
/// Só entrega documentos do próprio paciente.
pub async fn download(
    State(state): State<AppState>,
    user: PatientUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let file = find_file(&state, id).await?;
    if file.patient_id != user.patient_id {
        warn!(document_id = id, patient_id = user.patient_id, "Download de documento alheio negado");
        return Err(AppError::Forbidden("Documento de outro paciente".into()));
    }
    file_response(&state, file).await
}
