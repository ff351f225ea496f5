//! Tokens de acesso JWT (HS256)
//!
//! O mesmo formato serve à equipe (`role = "staff"`) e ao portal do paciente
//! (`role = "patient"`); `sub` é o id do perfil ou do paciente.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ROLE_STAFF: &str = "staff";
pub const ROLE_PATIENT: &str = "patient";

/// Claims gravadas em todo token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    /// Nome exibido (usuário da equipe ou paciente)
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Validade do token em horas
    pub expiry_hours: i64,
}

pub fn generate_token(
    subject: i64,
    role: &str,
    name: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: subject,
        role: role.to_string(),
        name: name.to_string(),
        exp: now + config.expiry_hours * 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Valida assinatura e expiração
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
