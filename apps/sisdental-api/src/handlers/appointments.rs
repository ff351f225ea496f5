//! Agenda de consultas

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use sisdental_db::models::{parse_time_input, AppointmentStatus, NewAppointment};
use sisdental_db::repository::{AppointmentFilter, AppointmentRepo, PatientRepo};
use sisdental_db::{Record, Value};
use tracing::info;
use validator::Validate;

use super::{non_empty, success, today};
use crate::auth::StaffUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Parte do nome do paciente
    pub paciente: Option<String>,
    /// `YYYY-MM-DD`
    pub data: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppointmentInput {
    pub patient_id: i64,
    #[validate(length(min = 1, message = "Serviço é obrigatório"))]
    pub service: String,
    pub date: NaiveDate,
    /// `HH:MM` ou `HH:MM:SS`
    pub time: String,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

fn parse_status(raw: &str) -> AppResult<AppointmentStatus> {
    raw.parse().map_err(AppError::BadRequest)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Agendamento {} não encontrado", id))
}

impl AppointmentInput {
    fn into_new_appointment(self, default_status: Option<AppointmentStatus>) -> AppResult<NewAppointment> {
        let time = parse_time_input(&self.time)
            .ok_or_else(|| AppError::Validation(format!("Horário inválido: {}", self.time)))?;
        let status = match non_empty(self.status) {
            Some(raw) => parse_status(&raw)?,
            None => default_status
                .ok_or_else(|| AppError::Validation("Status é obrigatório".into()))?,
        };

        Ok(NewAppointment {
            patient_id: self.patient_id,
            service: self.service.trim().to_string(),
            date: self.date,
            time,
            status,
            notes: non_empty(self.notes),
        })
    }
}

/// Marca `is_today` / `is_tomorrow` conforme a data do agendamento
fn flag_relative_day(record: &mut Record, today: NaiveDate) {
    let date = match record.get("date") {
        Some(Value::Date(date)) => Some(*date),
        Some(Value::Text(text)) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
        _ => None,
    };
    let tomorrow = today + Duration::days(1);
    record.insert("is_today".into(), Value::Bool(date == Some(today)));
    record.insert("is_tomorrow".into(), Value::Bool(date == Some(tomorrow)));
}

/// GET /api/agendamentos?paciente=&data=&status=
pub async fn list(
    State(state): State<AppState>,
    _user: StaffUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let date = match non_empty(query.data) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Data inválida: {}", raw)))?,
        ),
        None => None,
    };
    let status = match non_empty(query.status) {
        Some(raw) => Some(parse_status(&raw)?),
        None => None,
    };
    let filter = AppointmentFilter {
        patient_name: non_empty(query.paciente),
        date,
        status,
    };

    let mut records = AppointmentRepo::list(&state.pool, &filter).await?;
    let today = today();
    for record in &mut records {
        flag_relative_day(record, today);
    }
    Ok(Json(state.rows(records)))
}

/// POST /api/agendamentos
pub async fn create(
    State(state): State<AppState>,
    _user: StaffUser,
    Json(input): Json<AppointmentInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    input.validate()?;
    let appointment = input.into_new_appointment(Some(AppointmentStatus::default()))?;
    if !PatientRepo::exists(&state.pool, appointment.patient_id).await? {
        return Err(AppError::NotFound(format!(
            "Paciente {} não encontrado",
            appointment.patient_id
        )));
    }

    let id = AppointmentRepo::create(&state.pool, &appointment).await?;
    info!(appointment_id = id, patient_id = appointment.patient_id, "Agendamento criado");

    let record = AppointmentRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;
    Ok((StatusCode::CREATED, Json(state.row(record))))
}

/// GET /api/agendamentos/:id
///
/// Devolve também os status aceitos, para o formulário de edição.
pub async fn show(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let record = AppointmentRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;
    let statuses: Vec<Value> = AppointmentStatus::ALL
        .iter()
        .map(|s| Value::from(s.as_str()))
        .collect();

    Ok(Json(state.compose([
        ("appointment", Value::from(record)),
        ("statuses", Value::from(statuses)),
    ])))
}

/// PUT /api/agendamentos/:id
pub async fn update(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
    Json(input): Json<AppointmentInput>,
) -> AppResult<Json<Value>> {
    input.validate()?;
    let appointment = input.into_new_appointment(None)?;
    if !PatientRepo::exists(&state.pool, appointment.patient_id).await? {
        return Err(AppError::NotFound(format!(
            "Paciente {} não encontrado",
            appointment.patient_id
        )));
    }

    if !AppointmentRepo::update(&state.pool, id, &appointment).await? {
        return Err(not_found(id));
    }
    info!(appointment_id = id, "Agendamento atualizado");

    let record = AppointmentRepo::find(&state.pool, id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(state.row(record)))
}

/// PUT /api/agendamentos/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<serde_json::Value>> {
    let status = parse_status(input.status.trim())?;
    if !AppointmentRepo::update_status(&state.pool, id, status).await? {
        return Err(not_found(id));
    }
    info!(appointment_id = id, %status, "Status do agendamento alterado");
    Ok(success())
}
