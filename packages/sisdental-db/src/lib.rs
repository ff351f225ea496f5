//! SisDental DB - Biblioteca compartilhada de acesso a dados do consultório
//!
//! Esta biblioteca fornece:
//! - Normalização de valores do banco para JSON ([`normalize`])
//! - Adaptação de linhas posicionais em registros nomeados ([`row`])
//! - Repositórios por tabela e migrações automáticas do SQLite
//! - Armazenamento cifrado dos documentos gerados para os pacientes

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod crypto;
pub mod error;
pub mod migrations;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod row;
pub mod storage;
pub mod value;

pub use error::DbError;
pub use normalize::Normalizer;
pub use row::{adapt, RawRow};
pub use storage::{DocumentStore, StoreConfig};
pub use value::{Record, Value};

/// Configuração da conexão com o banco de dados
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: "data/sisdental.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Inicializa o pool de conexões com o banco SQLite e aplica as migrações
pub async fn init_db_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.db_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    let connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    migrations::run_migrations(&pool)
        .await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", config.db_path);
    Ok(pool)
}

/// Pool em memória com as migrações aplicadas (testes)
///
/// Uma única conexão que nunca expira, já que cada conexão `:memory:` teria
/// seu próprio banco.
#[cfg(any(test, feature = "test-utils"))]
pub async fn init_memory_pool() -> Result<SqlitePool> {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Falha ao abrir banco em memória")?;

    migrations::run_migrations(&pool).await?;
    Ok(pool)
}
