//! Repositório da tabela `financial_entries`

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use super::{fetch_record, fetch_records, limit_or_all};
use crate::error::DbError;
use crate::models::{NewFinancialEntry, PaymentStatus};
use crate::row::nest_prefixed;
use crate::value::Record;

const ENTRY_COLUMNS: &str = "f.id, f.patient_id, f.treatment_id, f.appointment_id, \
     f.description, f.amount, f.status, f.due_date, f.paid_date";

/// Lançamentos com o paciente embutido em `patient { id, name }`
const ENTRY_WITH_PATIENT: &str = "SELECT f.id, f.patient_id, f.treatment_id, f.appointment_id, \
     f.description, f.amount, f.status, f.due_date, f.paid_date, \
     p.id AS patient__id, p.name AS patient__name \
     FROM financial_entries f LEFT JOIN patients p ON p.id = f.patient_id";

pub struct FinanceRepo;

impl FinanceRepo {
    /// Todos os lançamentos, vencimento mais recente primeiro
    pub async fn list_with_patient(pool: &SqlitePool) -> Result<Vec<Record>, DbError> {
        let query = format!("{ENTRY_WITH_PATIENT} ORDER BY f.due_date DESC, f.id DESC");
        let mut records = fetch_records(pool, sqlx::query(&query)).await?;
        for record in &mut records {
            nest_prefixed(record, "patient", "patient");
        }
        Ok(records)
    }

    pub async fn find_with_patient(pool: &SqlitePool, id: i64) -> Result<Option<Record>, DbError> {
        let query = format!("{ENTRY_WITH_PATIENT} WHERE f.id = ?");
        let mut record = fetch_record(pool, sqlx::query(&query).bind(id)).await?;
        if let Some(record) = record.as_mut() {
            nest_prefixed(record, "patient", "patient");
        }
        Ok(record)
    }

    /// Lançamentos de um paciente, vencimento mais recente primeiro
    pub async fn list_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM financial_entries f \
             WHERE f.patient_id = ? ORDER BY f.due_date DESC, f.id DESC LIMIT ?"
        );
        fetch_records(
            pool,
            sqlx::query(&query).bind(patient_id).bind(limit_or_all(limit)),
        )
        .await
    }

    /// Insere um lançamento; aceita pool ou transação
    pub async fn create<'e, E>(executor: E, entry: &NewFinancialEntry) -> Result<i64, DbError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO financial_entries \
                (patient_id, treatment_id, appointment_id, description, amount, status, \
                 due_date, paid_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.patient_id)
        .bind(entry.treatment_id)
        .bind(entry.appointment_id)
        .bind(&entry.description)
        // Texto decimal; a afinidade NUMERIC da coluna faz a conversão
        .bind(entry.amount.to_string())
        .bind(entry.status.as_str())
        .bind(entry.due_date)
        .bind(entry.paid_date)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: i64,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> Result<bool, DbError> {
        let result =
            sqlx::query("UPDATE financial_entries SET status = ?, paid_date = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(paid_date)
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM financial_entries WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove o lançamento gerado por um tratamento
    pub async fn delete_by_treatment<'e, E>(executor: E, treatment_id: i64) -> Result<u64, DbError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM financial_entries WHERE treatment_id = ?")
            .bind(treatment_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
