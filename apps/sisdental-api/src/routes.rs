//! Tabela de rotas

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{
    appointments, auth, dashboard, documents, finances, health, odontogram, patients, portal,
};
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// ```text
/// POST /auth/register
/// POST /auth/login
/// ```
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Rotas da equipe, todas sob `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(dashboard::summary))
        // Pacientes
        .route("/api/pacientes", get(patients::list).post(patients::create))
        .route("/api/pacientes/listar", get(patients::list_names))
        .route(
            "/api/pacientes/:id",
            get(patients::details)
                .put(patients::update)
                .delete(patients::delete),
        )
        // Agenda
        .route(
            "/api/agendamentos",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/api/agendamentos/:id",
            get(appointments::show).put(appointments::update),
        )
        .route(
            "/api/agendamentos/:id/status",
            put(appointments::update_status),
        )
        // Financeiro
        .route(
            "/api/financeiro/lancamentos",
            get(finances::list).post(finances::create),
        )
        .route("/api/financeiro/lancamentos/:id", delete(finances::delete))
        .route(
            "/api/financeiro/lancamentos/:id/status",
            put(finances::update_status),
        )
        // Odontograma
        .route("/api/odontograma/tratamentos", post(odontogram::create))
        .route("/api/odontograma/tratamentos/:id", delete(odontogram::delete))
        .route(
            "/api/odontograma/tratamentos/:id/status",
            put(odontogram::update_status),
        )
        .route("/api/odontograma/:paciente_id", get(odontogram::overview))
        .route(
            "/api/odontograma/:paciente_id/tratamentos",
            get(odontogram::list),
        )
        // Documentos
        .route(
            "/api/documentos/paciente/:paciente_id",
            get(documents::list),
        )
        .route(
            "/api/documentos/paciente/:paciente_id/:tipo",
            post(documents::generate),
        )
        .route("/api/documentos/:id/download", get(documents::download))
}

/// Rotas do portal do paciente
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/portal/primeiro-acesso", post(portal::first_access))
        .route("/portal/login", post(portal::login))
        .route("/portal/home", get(portal::home))
        .route("/portal/documentos/:id/download", get(portal::download))
}
