//! Repositório da tabela `treatments` (odontograma)

use sqlx::SqlitePool;
use tracing::info;

use super::{fetch_record, fetch_records, FinanceRepo};
use crate::error::DbError;
use crate::models::{NewFinancialEntry, NewTreatment, PaymentStatus};
use crate::value::Record;

const TREATMENT_COLUMNS: &str = "id, patient_id, tooth_number, treatment_type, treatment_date, \
     notes, next_session_date, amount, completed, created_at";

pub struct TreatmentRepo;

impl TreatmentRepo {
    /// Tratamentos do paciente na ordem de cadastro (odontograma)
    pub async fn list_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {TREATMENT_COLUMNS} FROM treatments \
             WHERE patient_id = ? ORDER BY created_at, id"
        );
        fetch_records(pool, sqlx::query(&query).bind(patient_id)).await
    }

    /// Histórico do paciente, tratamento mais recente primeiro
    pub async fn history_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {TREATMENT_COLUMNS} FROM treatments \
             WHERE patient_id = ? ORDER BY treatment_date DESC, id DESC"
        );
        fetch_records(pool, sqlx::query(&query).bind(patient_id)).await
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Record>, DbError> {
        let query = format!("SELECT {TREATMENT_COLUMNS} FROM treatments WHERE id = ?");
        fetch_record(pool, sqlx::query(&query).bind(id)).await
    }

    /// Cadastra o tratamento e, havendo valor positivo, o lançamento pendente
    /// correspondente, na mesma transação
    pub async fn create(pool: &SqlitePool, treatment: &NewTreatment) -> Result<i64, DbError> {
        let mut transaction = pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO treatments \
                (patient_id, tooth_number, treatment_type, treatment_date, notes, \
                 next_session_date, amount, completed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(treatment.patient_id)
        .bind(treatment.tooth_number)
        .bind(&treatment.treatment_type)
        .bind(treatment.treatment_date)
        .bind(&treatment.notes)
        .bind(treatment.next_session_date)
        .bind(treatment.amount.map(|a| a.to_string()))
        .bind(treatment.completed)
        .execute(&mut *transaction)
        .await?;
        let treatment_id = result.last_insert_rowid();

        if let Some(amount) = treatment.billable_amount() {
            let entry = NewFinancialEntry {
                patient_id: treatment.patient_id,
                treatment_id: Some(treatment_id),
                appointment_id: None,
                description: treatment.billing_description(),
                amount,
                status: PaymentStatus::Pendente,
                due_date: treatment.treatment_date,
                paid_date: None,
            };
            FinanceRepo::create(&mut *transaction, &entry).await?;
            info!(treatment_id, %amount, "Lançamento criado para o tratamento");
        }

        transaction.commit().await?;
        Ok(treatment_id)
    }

    pub async fn set_completed(pool: &SqlitePool, id: i64, completed: bool) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE treatments SET completed = ? WHERE id = ?")
            .bind(completed)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove o tratamento e o lançamento financeiro associado
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DbError> {
        let mut transaction = pool.begin().await?;

        let removed_entries = FinanceRepo::delete_by_treatment(&mut *transaction, id).await?;
        let result = sqlx::query("DELETE FROM treatments WHERE id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        if removed_entries > 0 {
            info!(treatment_id = id, removed_entries, "Lançamentos do tratamento removidos");
        }
        Ok(result.rows_affected() > 0)
    }
}
