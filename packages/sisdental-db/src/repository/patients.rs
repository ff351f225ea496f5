//! Repositório da tabela `patients`

use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::{contains_pattern, fetch_record, fetch_records};
use crate::error::DbError;
use crate::models::{NewPatient, PatientCredentials};
use crate::value::Record;

/// Colunas públicas; `password_hash` nunca sai em listagens
const PATIENT_COLUMNS: &str = "id, name, cpf, phone, email, birth_date, created_at";

pub struct PatientRepo;

impl PatientRepo {
    /// Pacientes por página na listagem
    pub const PAGE_SIZE: i64 = 10;

    /// Lista pacientes em ordem alfabética, filtrando por parte do nome
    pub async fn list(
        pool: &SqlitePool,
        search: Option<&str>,
        page: i64,
    ) -> Result<Vec<Record>, DbError> {
        let offset = (page.max(1) - 1) * Self::PAGE_SIZE;
        let pattern = contains_pattern(search);
        let query = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients \
             WHERE (? IS NULL OR name LIKE ? ESCAPE '\\') \
             ORDER BY name LIMIT ? OFFSET ?"
        );
        fetch_records(
            pool,
            sqlx::query(&query)
                .bind(pattern.as_deref())
                .bind(pattern.as_deref())
                .bind(Self::PAGE_SIZE)
                .bind(offset),
        )
        .await
    }

    /// Apenas id e nome, para seletores
    pub async fn list_names(pool: &SqlitePool) -> Result<Vec<Record>, DbError> {
        fetch_records(pool, sqlx::query("SELECT id, name FROM patients ORDER BY name")).await
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Record>, DbError> {
        let query = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?");
        fetch_record(pool, sqlx::query(&query).bind(id)).await
    }

    pub async fn find_name(pool: &SqlitePool, id: i64) -> Result<Option<String>, DbError> {
        Ok(sqlx::query_scalar("SELECT name FROM patients WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, DbError> {
        Ok(Self::find_name(pool, id).await?.is_some())
    }

    pub async fn create(pool: &SqlitePool, patient: &NewPatient) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO patients (name, cpf, phone, email, birth_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&patient.name)
        .bind(&patient.cpf)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(patient.birth_date)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Atualiza os dados cadastrais; retorna `false` se o paciente não existe
    pub async fn update(pool: &SqlitePool, id: i64, patient: &NewPatient) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE patients SET name = ?, cpf = ?, phone = ?, email = ?, birth_date = ? \
             WHERE id = ?",
        )
        .bind(&patient.name)
        .bind(&patient.cpf)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(patient.birth_date)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, DbError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(pool)
            .await?)
    }

    /// Credenciais do portal pelo CPF (apenas dígitos)
    pub async fn find_credentials(
        pool: &SqlitePool,
        cpf: &str,
    ) -> Result<Option<PatientCredentials>, DbError> {
        Ok(sqlx::query_as::<_, PatientCredentials>(
            "SELECT id, name, password_hash FROM patients WHERE cpf = ? LIMIT 1",
        )
        .bind(cpf)
        .fetch_optional(pool)
        .await?)
    }

    /// Confere CPF + data de nascimento no primeiro acesso ao portal
    pub async fn find_for_first_access(
        pool: &SqlitePool,
        cpf: &str,
        birth_date: NaiveDate,
    ) -> Result<Option<PatientCredentials>, DbError> {
        Ok(sqlx::query_as::<_, PatientCredentials>(
            "SELECT id, name, password_hash FROM patients \
             WHERE cpf = ? AND birth_date = ? LIMIT 1",
        )
        .bind(cpf)
        .bind(birth_date)
        .fetch_optional(pool)
        .await?)
    }

    /// Grava a senha do portal só se ainda não houver uma; `false` se já havia
    pub async fn set_password_hash(
        pool: &SqlitePool,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE patients SET password_hash = ? WHERE id = ? AND password_hash IS NULL",
        )
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, patient};
    use crate::value::Value;

    #[tokio::test]
    async fn test_list_search_and_pages() -> anyhow::Result<()> {
        let pool = crate::init_memory_pool().await?;
        for i in 0..12 {
            patient(&pool, &format!("Paciente {:02}", i)).await?;
        }
        patient(&pool, "Maria Souza").await?;

        let first = PatientRepo::list(&pool, None, 1).await?;
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].get("name"), Some(&Value::from("Maria Souza")));
        assert!(!first[0].contains_key("password_hash"));

        let second = PatientRepo::list(&pool, None, 2).await?;
        assert_eq!(second.len(), 3);

        let found = PatientRepo::list(&pool, Some("maria"), 1).await?;
        assert_eq!(found.len(), 1);

        assert!(PatientRepo::list(&pool, Some("_"), 1).await?.is_empty());
        assert!(PatientRepo::list(&pool, Some("%"), 1).await?.is_empty());

        assert_eq!(PatientRepo::count(&pool).await?, 13);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_delete() -> anyhow::Result<()> {
        let pool = crate::init_memory_pool().await?;
        let id = patient(&pool, "Ana").await?;

        let changed = NewPatient {
            name: "Ana Lima".into(),
            email: Some("ana@exemplo.com".into()),
            ..NewPatient::default()
        };
        assert!(PatientRepo::update(&pool, id, &changed).await?);
        assert!(!PatientRepo::update(&pool, id + 100, &changed).await?);

        let record = PatientRepo::find(&pool, id).await?.expect("paciente");
        assert_eq!(record.get("name"), Some(&Value::from("Ana Lima")));
        assert_eq!(record.get("birth_date"), Some(&Value::Null));

        assert!(PatientRepo::delete(&pool, id).await?);
        assert!(!PatientRepo::exists(&pool, id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_portal_credentials() -> anyhow::Result<()> {
        let pool = crate::init_memory_pool().await?;
        let id = patient(&pool, "Carlos").await?;

        let found = PatientRepo::find_for_first_access(&pool, "12345678901", date(1990, 1, 15))
            .await?
            .expect("credenciais");
        assert_eq!(found.id, id);
        assert!(found.password_hash.is_none());

        assert!(
            PatientRepo::find_for_first_access(&pool, "12345678901", date(1991, 1, 15))
                .await?
                .is_none()
        );

        assert!(PatientRepo::set_password_hash(&pool, id, "hash").await?);
        assert!(!PatientRepo::set_password_hash(&pool, id, "outro").await?);
        let creds = PatientRepo::find_credentials(&pool, "12345678901")
            .await?
            .expect("credenciais");
        assert_eq!(creds.password_hash.as_deref(), Some("hash"));
        Ok(())
    }
}
