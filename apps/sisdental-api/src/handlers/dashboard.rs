use axum::extract::State;
use axum::Json;
use sisdental_db::repository::{AppointmentRepo, PatientRepo};
use sisdental_db::Value;

use super::today;
use crate::auth::StaffUser;
use crate::error::AppResult;
use crate::state::AppState;

/// Agendamentos do dia exibidos no painel
const TODAY_LIST_LIMIT: i64 = 5;

/// GET /api/dashboard
pub async fn summary(State(state): State<AppState>, _user: StaffUser) -> AppResult<Json<Value>> {
    let today = today();

    let total_patients = PatientRepo::count(&state.pool).await?;
    let appointments_today = AppointmentRepo::count_on(&state.pool, today).await?;
    let total_appointments = AppointmentRepo::count(&state.pool).await?;
    let today_list =
        AppointmentRepo::on_date_with_patient(&state.pool, today, TODAY_LIST_LIMIT).await?;

    Ok(Json(state.compose([
        ("total_patients", Value::from(total_patients)),
        ("appointments_today", Value::from(appointments_today)),
        ("total_appointments", Value::from(total_appointments)),
        ("today", Value::from(today_list)),
    ])))
}
