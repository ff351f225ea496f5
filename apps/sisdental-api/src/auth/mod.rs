//! Autenticação por token Bearer
//!
//! [`StaffUser`] protege as rotas da equipe (`/api/...`) e [`PatientUser`] as
//! do portal (`/portal/...`). Cada extrator exige um token válido com o papel
//! correspondente.

pub mod jwt;
pub mod password;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;
use jwt::{validate_token, Claims, ROLE_PATIENT, ROLE_STAFF};

/// Usuário da equipe autenticado
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub profile_id: i64,
    pub name: String,
}

/// Paciente autenticado no portal
#[derive(Debug, Clone)]
pub struct PatientUser {
    pub patient_id: i64,
    pub name: String,
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Cabeçalho Authorization ausente".into()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Formato esperado: Bearer <token>".into())
    })?;

    validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Unauthorized("Token inválido ou expirado".into()))
}

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_STAFF {
            return Err(AppError::Forbidden("Acesso restrito à equipe".into()));
        }
        Ok(StaffUser {
            profile_id: claims.sub,
            name: claims.name,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PatientUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_PATIENT {
            return Err(AppError::Forbidden("Acesso restrito ao portal do paciente".into()));
        }
        Ok(PatientUser {
            patient_id: claims.sub,
            name: claims.name,
        })
    }
}
