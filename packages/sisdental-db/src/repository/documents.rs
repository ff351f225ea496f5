//! Repositório da tabela `documents`

use sqlx::SqlitePool;

use super::{fetch_record, fetch_records};
use crate::error::DbError;
use crate::models::{DocumentFile, NewDocument};
use crate::value::Record;

const DOCUMENT_COLUMNS: &str =
    "id, patient_id, document_type, generation_time, file_name, description";

pub struct DocumentRepo;

impl DocumentRepo {
    pub async fn create(pool: &SqlitePool, document: &NewDocument) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO documents \
                (patient_id, document_type, generation_time, file_name, storage_path, description) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(document.patient_id)
        .bind(document.document_type.as_str())
        .bind(document.generation_time)
        .bind(&document.file_name)
        .bind(&document.storage_path)
        .bind(&document.description)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Documentos do paciente, mais recentes primeiro
    pub async fn list_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
    ) -> Result<Vec<Record>, DbError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE patient_id = ? ORDER BY generation_time DESC, id DESC"
        );
        fetch_records(pool, sqlx::query(&query).bind(patient_id)).await
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Record>, DbError> {
        let query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?");
        fetch_record(pool, sqlx::query(&query).bind(id)).await
    }

    /// Caminhos no armazenamento de todos os documentos do paciente
    pub async fn storage_paths_for_patient(
        pool: &SqlitePool,
        patient_id: i64,
    ) -> Result<Vec<String>, DbError> {
        Ok(
            sqlx::query_scalar("SELECT storage_path FROM documents WHERE patient_id = ? ORDER BY id")
                .bind(patient_id)
                .fetch_all(pool)
                .await?,
        )
    }

    /// Caminho no armazenamento; não sai nas listagens
    pub async fn find_file(pool: &SqlitePool, id: i64) -> Result<Option<DocumentFile>, DbError> {
        Ok(sqlx::query_as::<_, DocumentFile>(
            "SELECT id, patient_id, file_name, storage_path FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use crate::normalize::Normalizer;
    use crate::repository::test_support::{date, patient};
    use crate::value::Value;

    fn document(patient_id: i64, day: u32) -> NewDocument {
        NewDocument {
            patient_id,
            document_type: DocumentType::Prescription,
            generation_time: date(2024, 3, day).and_hms_opt(14, 30, 0).expect("hora"),
            file_name: format!("receita_{day}.txt"),
            storage_path: format!("{patient_id}/receita_{day}.txt"),
            description: Some("Amoxicilina 500mg".into()),
        }
    }

    #[tokio::test]
    async fn test_create_list_and_file() -> anyhow::Result<()> {
        let pool = crate::init_memory_pool().await?;
        let ana = patient(&pool, "Ana").await?;
        DocumentRepo::create(&pool, &document(ana, 1)).await?;
        let latest = DocumentRepo::create(&pool, &document(ana, 4)).await?;

        let list = DocumentRepo::list_for_patient(&pool, ana).await?;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].get("id"), Some(&Value::Int(latest)));
        assert!(!list[0].contains_key("storage_path"));

        let json = serde_json::to_value(Normalizer::default().normalize_records(list))?;
        assert_eq!(json[0]["generation_time"], serde_json::json!("2024-03-04T14:30:00"));
        assert_eq!(json[0]["document_type"], serde_json::json!("prescription"));

        let file = DocumentRepo::find_file(&pool, latest).await?.expect("documento");
        assert_eq!(file.patient_id, ana);
        assert_eq!(file.storage_path, format!("{ana}/receita_4.txt"));
        assert!(DocumentRepo::find_file(&pool, latest + 1).await?.is_none());

        let paths = DocumentRepo::storage_paths_for_patient(&pool, ana).await?;
        assert_eq!(paths, vec![format!("{ana}/receita_1.txt"), format!("{ana}/receita_4.txt")]);
        Ok(())
    }
}
