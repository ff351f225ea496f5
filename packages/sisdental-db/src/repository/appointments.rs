//! Repositório da tabela `appointments`

use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::{contains_pattern, fetch_record, fetch_records, limit_or_all};
use crate::error::DbError;
use crate::models::{AppointmentStatus, NewAppointment};
use crate::row::nest_prefixed;
use crate::value::Record;

const APPOINTMENT_COLUMNS: &str =
    "a.id, a.patient_id, a.service, a.date, a.time, a.status, a.notes";

/// Filtros da listagem de agendamentos
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    /// Parte do nome do paciente
    pub patient_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

pub struct AppointmentRepo;

impl AppointmentRepo {
    /// Lista agendamentos com o nome do paciente, por data e hora
    pub async fn list(
        pool: &SqlitePool,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS}, p.name AS patient_name \
             FROM appointments a JOIN patients p ON p.id = a.patient_id \
             WHERE (? IS NULL OR p.name LIKE ? ESCAPE '\\') \
               AND (? IS NULL OR a.date = ?) \
               AND (? IS NULL OR a.status = ?) \
             ORDER BY a.date, a.time"
        );
        let name = contains_pattern(filter.patient_name.as_deref());
        let status = filter.status.map(|s| s.as_str());

        fetch_records(
            pool,
            sqlx::query(&query)
                .bind(name.as_deref())
                .bind(name.as_deref())
                .bind(filter.date)
                .bind(filter.date)
                .bind(status)
                .bind(status),
        )
        .await
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Record>, DbError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?");
        fetch_record(pool, sqlx::query(&query).bind(id)).await
    }

    /// Todos os agendamentos de um paciente, mais recentes primeiro
    pub async fn list_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments a \
             WHERE a.patient_id = ? ORDER BY a.date DESC, a.time DESC"
        );
        fetch_records(pool, sqlx::query(&query).bind(patient_id)).await
    }

    /// Próximos agendamentos (data >= `from`) de um paciente
    pub async fn upcoming_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
        from: NaiveDate,
        limit: Option<i64>,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments a \
             WHERE a.patient_id = ? AND a.date >= ? \
             ORDER BY a.date, a.time LIMIT ?"
        );
        fetch_records(
            pool,
            sqlx::query(&query)
                .bind(patient_id)
                .bind(from)
                .bind(limit_or_all(limit)),
        )
        .await
    }

    /// Agendamentos de um dia com o paciente aninhado (painel inicial)
    pub async fn on_date_with_patient(
        pool: &SqlitePool,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Record>, DbError> {
        let mut records = fetch_records(
            pool,
            sqlx::query(
                "SELECT a.time, a.service, p.id AS patient__id, p.name AS patient__name \
                 FROM appointments a LEFT JOIN patients p ON p.id = a.patient_id \
                 WHERE a.date = ? ORDER BY a.time LIMIT ?",
            )
            .bind(date)
            .bind(limit),
        )
        .await?;

        for record in &mut records {
            nest_prefixed(record, "patient", "patient");
        }
        Ok(records)
    }

    pub async fn create(pool: &SqlitePool, appointment: &NewAppointment) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO appointments (patient_id, service, date, time, status, notes) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(appointment.patient_id)
        .bind(&appointment.service)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        appointment: &NewAppointment,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE appointments SET patient_id = ?, service = ?, date = ?, time = ?, \
             status = ?, notes = ? WHERE id = ?",
        )
        .bind(appointment.patient_id)
        .bind(&appointment.service)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE appointments SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, DbError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
            .fetch_one(pool)
            .await?)
    }

    pub async fn count_on(pool: &SqlitePool, date: NaiveDate) -> Result<i64, DbError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE date = ?")
            .bind(date)
            .fetch_one(pool)
            .await?)
    }
}
