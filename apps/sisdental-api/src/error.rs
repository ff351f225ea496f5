//! Erros da camada HTTP
//!
//! Todo erro de handler vira uma resposta JSON `{"erro": ..., "code": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sisdental_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Não autorizado: {0}")]
    Unauthorized(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Erro interno: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        AppError::Validation(format!("Campos inválidos: {}", fields.join(", ")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Db(err) => classify_db_error(err),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Erro interno");
                internal()
            }
        };

        (status, Json(json!({ "erro": message, "code": code }))).into_response()
    }
}

fn classify_db_error(err: DbError) -> (StatusCode, &'static str, String) {
    match err {
        DbError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        DbError::ConstraintViolation(msg) => {
            tracing::warn!(error = %msg, "Violação de restrição no banco");
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                "Registro conflita com dados existentes".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Erro no banco de dados");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Ocorreu um erro interno".to_string(),
    )
}
