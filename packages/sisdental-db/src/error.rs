//! Definições de erro para a biblioteca sisdental-db
//!
//! Este módulo define os tipos de erro usados pela camada de dados

use thiserror::Error;

/// Erros específicos para operações de banco de dados
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Erro de conexão com banco de dados: {0}")]
    ConnectionError(String),

    #[error("Erro de migração: {0}")]
    MigrationError(String),

    #[error("Erro de consulta: {0}")]
    QueryError(String),

    #[error("Entidade não encontrada: {0}")]
    NotFound(String),

    #[error("Violação de restrição: {0}")]
    ConstraintViolation(String),

    #[error("Erro de criptografia: {0}")]
    CryptoError(String),

    #[error("Erro de armazenamento de documento: {0}")]
    StorageError(String),

    #[error("Linha inconsistente: {columns} colunas para {values} valores")]
    RowShape { columns: usize, values: usize },

    #[error("Coluna repetida na linha: {0}")]
    DuplicateColumn(String),

    #[error("Erro interno: {0}")]
    InternalError(String),
}

/// Conversão de erros do SQLx para nossos tipos de erro
impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DbError::NotFound("Registro não encontrado".to_string()),
            sqlx::Error::Database(dbe) => {
                // SQLite: 2067 = UNIQUE, 1555 = PRIMARY KEY, 787 = FOREIGN KEY, 275 = CHECK
                if let Some(code) = dbe.code() {
                    if matches!(code.as_ref(), "2067" | "1555" | "787" | "275") {
                        return DbError::ConstraintViolation(dbe.message().to_string());
                    }
                }
                DbError::QueryError(dbe.message().to_string())
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::QueryError(format!("Coluna não encontrada: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::QueryError(format!("Erro ao decodificar coluna {}: {}", index, source))
            }
            sqlx::Error::Io(io_err) => DbError::ConnectionError(io_err.to_string()),
            sqlx::Error::Configuration(conf_err) => DbError::ConnectionError(conf_err.to_string()),
            sqlx::Error::PoolClosed => {
                DbError::ConnectionError("Pool de conexões fechado".to_string())
            }
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionError("Timeout no pool de conexões".to_string())
            }
            sqlx::Error::WorkerCrashed => {
                DbError::InternalError("Worker do banco de dados falhou".to_string())
            }
            _ => DbError::InternalError(format!("Erro inesperado: {:?}", error)),
        }
    }
}

impl From<crate::crypto::CryptoError> for DbError {
    fn from(error: crate::crypto::CryptoError) -> Self {
        DbError::CryptoError(error.to_string())
    }
}
