//! Cadastro e login da equipe

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sisdental_db::models::Profile;
use sisdental_db::repository::ProfileRepo;
use tracing::{info, warn};
use validator::Validate;

use super::non_empty;
use crate::auth::jwt::{generate_token, ROLE_STAFF};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Validade em segundos
    pub expires_in: i64,
    pub user: Profile,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password).map_err(AppError::Validation)?;

    let email = input.email.trim().to_lowercase();
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::Internal(format!("Falha ao gerar hash: {e}")))?;
    let full_name = non_empty(input.full_name);

    if ProfileRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("E-mail já cadastrado".into()));
    }
    let id = ProfileRepo::create(
        &state.pool,
        &email,
        full_name.as_deref(),
        ROLE_STAFF,
        &password_hash,
    )
    .await?;

    info!(profile_id = id, "Usuário da equipe cadastrado");
    Ok((StatusCode::CREATED, Json(RegisterResponse { id, email })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = input.email.trim().to_lowercase();
    let invalid = || AppError::Unauthorized("E-mail ou senha inválidos".into());

    let profile = ProfileRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let valid = verify_password(&input.password, &profile.password_hash)
        .map_err(|e| AppError::Internal(format!("Falha ao verificar senha: {e}")))?;
    if !valid {
        warn!(profile_id = profile.id, "Senha incorreta no login da equipe");
        return Err(invalid());
    }

    let display_name = profile.full_name.clone().unwrap_or_else(|| profile.email.clone());
    let config = &state.config.jwt;
    let access_token = generate_token(profile.id, ROLE_STAFF, &display_name, config)
        .map_err(|e| AppError::Internal(format!("Falha ao gerar token: {e}")))?;

    info!(profile_id = profile.id, "Login da equipe");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: config.expiry_hours * 3600,
        user: profile,
    }))
}
