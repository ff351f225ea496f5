//! Handlers HTTP, um módulo por recurso
//!
//! Toda resposta que carrega linhas do banco passa pelo normalizador do
//! [`AppState`](crate::state::AppState) antes de virar JSON.

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod finances;
pub mod health;
pub mod odontogram;
pub mod patients;
pub mod portal;

use axum::Json;
use chrono::NaiveDate;
use serde_json::json;

/// Corpo das operações que não devolvem registro
pub(crate) fn success() -> Json<serde_json::Value> {
    Json(json!({ "sucesso": true }))
}

/// Texto aparado; vazio vira `None`
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Data local do servidor
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
