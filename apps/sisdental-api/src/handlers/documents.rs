//! Atestados e receitas
//!
//! O conteúdo é gerado em texto, gravado cifrado no [`DocumentStore`] e só
//! os metadados vão para o banco.
//!
//! [`DocumentStore`]: sisdental_db::DocumentStore

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;
use sisdental_db::models::{DocumentFile, DocumentType, NewDocument};
use sisdental_db::repository::{DocumentRepo, PatientRepo};
use sisdental_db::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::non_empty;
use crate::auth::StaffUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateInput {
    /// Texto do documento; sem ele usa o texto padrão do tipo
    pub body: Option<String>,
}

fn default_body(document_type: DocumentType, patient_name: &str) -> String {
    match document_type {
        DocumentType::Certificate => format!(
            "Atesto, para os devidos fins, que {} esteve sob tratamento \
             odontológico nesta data.",
            patient_name
        ),
        DocumentType::Prescription => {
            "Uso conforme orientação do cirurgião-dentista.".to_string()
        }
    }
}

/// Texto impresso do documento
pub(crate) fn render_document(
    document_type: DocumentType,
    patient_name: &str,
    issued_at: NaiveDateTime,
    body: Option<&str>,
) -> String {
    let body = body
        .map(str::to_string)
        .unwrap_or_else(|| default_body(document_type, patient_name));

    format!(
        "{title}\n\nPaciente: {patient}\nData: {date}\n\n{body}\n",
        title = document_type.title(),
        patient = patient_name,
        date = issued_at.format("%d/%m/%Y %H:%M"),
        body = body,
    )
}

fn describe(document_type: DocumentType, issued_at: NaiveDateTime) -> String {
    let date = issued_at.format("%d/%m/%Y");
    match document_type {
        DocumentType::Certificate => format!("Atestado gerado em {}", date),
        DocumentType::Prescription => format!("Receita gerada em {}", date),
    }
}

/// POST /api/documentos/paciente/:paciente_id/:tipo
pub async fn generate(
    State(state): State<AppState>,
    _user: StaffUser,
    Path((patient_id, kind)): Path<(i64, String)>,
    input: Option<Json<GenerateInput>>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let document_type: DocumentType = kind.parse().map_err(AppError::BadRequest)?;
    let patient_name = PatientRepo::find_name(&state.pool, patient_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Paciente {} não encontrado", patient_id)))?;

    let input = input.map(|Json(input)| input).unwrap_or_default();
    let issued_at = chrono::Local::now().naive_local();
    let content = render_document(
        document_type,
        &patient_name,
        issued_at,
        non_empty(input.body).as_deref(),
    );

    let file_name = format!(
        "{}_{}_{}.txt",
        document_type.file_prefix(),
        patient_id,
        issued_at.format("%Y%m%d%H%M%S")
    );
    let storage_path = format!("pacientes/{}/{}.bin", patient_id, Uuid::new_v4().simple());
    state.store.put(&storage_path, content.as_bytes()).await?;

    let document = NewDocument {
        patient_id,
        document_type,
        generation_time: issued_at,
        file_name,
        storage_path,
        description: Some(describe(document_type, issued_at)),
    };
    let id = match DocumentRepo::create(&state.pool, &document).await {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = state.store.delete(&document.storage_path).await {
                warn!(error = %cleanup, "Falha ao remover arquivo órfão");
            }
            return Err(e.into());
        }
    };
    info!(document_id = id, patient_id, kind = document_type.as_str(), "Documento gerado");

    let record = DocumentRepo::find(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Documento {} não encontrado", id)))?;
    Ok((StatusCode::CREATED, Json(state.row(record))))
}

/// GET /api/documentos/paciente/:paciente_id
pub async fn list(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(patient_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let records = DocumentRepo::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(state.rows(records)))
}

/// GET /api/documentos/:id/download
pub async fn download(
    State(state): State<AppState>,
    _user: StaffUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let file = find_file(&state, id).await?;
    file_response(&state, file).await
}

pub(crate) async fn find_file(state: &AppState, id: i64) -> AppResult<DocumentFile> {
    DocumentRepo::find_file(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Documento {} não encontrado", id)))
}

/// Decifra o arquivo e o devolve como anexo
pub(crate) async fn file_response(state: &AppState, file: DocumentFile) -> AppResult<Response> {
    let content = state.store.get(&file.storage_path).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}
