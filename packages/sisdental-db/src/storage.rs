//! Armazenamento cifrado de documentos
//!
//! O banco guarda apenas os metadados (`documents`); o conteúdo binário fica
//! em arquivos sob um diretório raiz, cifrado com a chave do consultório.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::crypto::{self, EncryptedData, EncryptionKey};
use crate::error::DbError;

/// Configuração do armazenamento de documentos
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Diretório raiz dos arquivos cifrados
    pub root: String,
    /// Frase usada para derivar a chave via Argon2id
    pub key_phrase: String,
    /// Salt da derivação (mínimo de 8 bytes)
    pub key_salt: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: "data/documentos".to_string(),
            key_phrase: "".to_string(), // Vazio por segurança, deve ser definido explicitamente
            key_salt: "sisdental-documentos".to_string(),
        }
    }
}

/// Repositório de arquivos cifrados
pub struct DocumentStore {
    root: PathBuf,
    key: EncryptionKey,
}

impl DocumentStore {
    /// Abre (criando se preciso) o diretório raiz e deriva a chave
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let key = EncryptionKey::derive(&config.key_phrase, config.key_salt.as_bytes())
            .context("Falha ao derivar chave dos documentos")?;
        let store = Self::with_key(&config.root, key);

        tokio::fs::create_dir_all(&store.root)
            .await
            .context("Falha ao criar diretório de documentos")?;

        info!("Armazenamento de documentos pronto em {}", config.root);
        Ok(store)
    }

    pub fn with_key(root: impl Into<PathBuf>, key: EncryptionKey) -> Self {
        Self {
            root: root.into(),
            key,
        }
    }

    /// Cifra e grava o conteúdo em `storage_path` (relativo à raiz)
    pub async fn put(&self, storage_path: &str, content: &[u8]) -> Result<(), DbError> {
        let path = self.resolve(storage_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DbError::StorageError(e.to_string()))?;
        }

        let encrypted = crypto::encrypt(content, &self.key)?;
        tokio::fs::write(&path, encrypted.to_bytes())
            .await
            .map_err(|e| DbError::StorageError(e.to_string()))?;

        debug!(storage_path, bytes = content.len(), "Documento gravado");
        Ok(())
    }

    /// Lê e decifra o conteúdo de `storage_path`
    pub async fn get(&self, storage_path: &str) -> Result<Vec<u8>, DbError> {
        let path = self.resolve(storage_path)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DbError::NotFound(format!("Arquivo {}", storage_path)))
            }
            Err(e) => return Err(DbError::StorageError(e.to_string())),
        };

        let encrypted = EncryptedData::from_bytes(&bytes)?;
        Ok(crypto::decrypt(&encrypted, &self.key)?)
    }

    /// Remove o arquivo; ausência não é erro
    pub async fn delete(&self, storage_path: &str) -> Result<(), DbError> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DbError::StorageError(e.to_string())),
        }
    }

    /// Aceita apenas caminhos relativos sem `..`
    fn resolve(&self, storage_path: &str) -> Result<PathBuf, DbError> {
        let relative = Path::new(storage_path);
        let valid = !storage_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(DbError::StorageError(format!(
                "Caminho de documento inválido: {}",
                storage_path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_get_delete() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = DocumentStore::with_key(temp_dir.path(), EncryptionKey::generate());

        let path = "pacientes/7/atestado_7_20240305143000.txt";
        store.put(path, b"ATESTADO").await?;

        let on_disk = std::fs::read(temp_dir.path().join(path))?;
        assert!(!on_disk.windows(8).any(|w| w == b"ATESTADO"));

        assert_eq!(store.get(path).await?, b"ATESTADO".to_vec());

        store.delete(path).await?;
        assert!(matches!(store.get(path).await, Err(DbError::NotFound(_))));
        store.delete(path).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = DocumentStore::with_key(temp_dir.path(), EncryptionKey::generate());

        for path in ["../fora.txt", "/etc/passwd", "pacientes/../../x", ""] {
            assert!(matches!(
                store.put(path, b"x").await,
                Err(DbError::StorageError(_))
            ));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_open_derives_key_from_config() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let config = StoreConfig {
            root: temp_dir.path().join("docs").to_string_lossy().into_owned(),
            key_phrase: "frase-de-teste".to_string(),
            ..StoreConfig::default()
        };

        let first = DocumentStore::open(&config).await?;
        first.put("a/b.txt", b"receita").await?;

        let reopened = DocumentStore::open(&config).await?;
        assert_eq!(reopened.get("a/b.txt").await?, b"receita".to_vec());

        let empty = StoreConfig {
            key_phrase: String::new(),
            ..config
        };
        assert!(DocumentStore::open(&empty).await.is_err());
        Ok(())
    }
}
