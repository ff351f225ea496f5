//! Configuração do servidor a partir de variáveis de ambiente

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use sisdental_db::{DbConfig, StoreConfig};

use crate::auth::jwt::JwtConfig;

/// Formato dos logs no stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("LOG_FORMAT inválido: {}", other),
        }
    }
}

/// Configuração completa do servidor
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    /// Origens liberadas no CORS
    pub cors_origins: Vec<String>,
    /// Limite de requisições simultâneas atendidas
    pub max_concurrent_requests: usize,
    /// Campos convertidos para booleano na normalização
    pub boolean_fields: Vec<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Carrega a configuração das variáveis de ambiente
    ///
    /// | Variável                   | Padrão                  |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `5000`                  |
    /// | `DATABASE_PATH`            | `data/sisdental.db`     |
    /// | `DATABASE_MAX_CONNECTIONS` | `5`                     |
    /// | `DOCUMENTS_DIR`            | `data/documentos`       |
    /// | `DOCUMENTS_KEY_PHRASE`     | obrigatória             |
    /// | `DOCUMENTS_KEY_SALT`       | `sisdental-documentos`  |
    /// | `JWT_SECRET`               | obrigatória             |
    /// | `JWT_EXPIRY_HOURS`         | `24`                    |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `MAX_CONCURRENT_REQUESTS`  | `64`                    |
    /// | `BOOLEAN_FIELDS`           | `completed`             |
    /// | `LOG_FORMAT`               | `pretty`                |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Mesma leitura de [`AppConfig::from_env`] sobre uma fonte qualquer
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db_defaults = DbConfig::default();
        let store_defaults = StoreConfig::default();

        let db = DbConfig {
            db_path: var("DATABASE_PATH", &db_defaults.db_path),
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", db_defaults.max_connections)?,
        };

        let store = StoreConfig {
            root: var("DOCUMENTS_DIR", &store_defaults.root),
            key_phrase: required(&lookup, "DOCUMENTS_KEY_PHRASE")?,
            key_salt: var("DOCUMENTS_KEY_SALT", &store_defaults.key_salt),
        };
        if store.key_salt.len() < 8 {
            bail!("DOCUMENTS_KEY_SALT deve ter pelo menos 8 bytes");
        }

        let jwt = JwtConfig {
            secret: required(&lookup, "JWT_SECRET")?,
            expiry_hours: parse_var(&lookup, "JWT_EXPIRY_HOURS", 24)?,
        };

        let max_concurrent_requests = parse_var(&lookup, "MAX_CONCURRENT_REQUESTS", 64usize)?;
        if max_concurrent_requests == 0 {
            bail!("MAX_CONCURRENT_REQUESTS deve ser maior que zero");
        }

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 5000)?,
            db,
            store,
            jwt,
            cors_origins: split_list(&var("CORS_ORIGINS", "http://localhost:5173")),
            max_concurrent_requests,
            boolean_fields: split_list(&var("BOOLEAN_FIELDS", "completed")),
            log_format: var("LOG_FORMAT", "pretty").parse()?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} deve ser definida no ambiente", key),
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Valor inválido para {}: {}", key, raw)),
        None => Ok(default),
    }
}

/// Lista separada por vírgulas, sem itens vazios
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
