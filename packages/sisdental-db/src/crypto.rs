//! Módulo de criptografia para documentos de pacientes
//!
//! Atestados e receitas ficam fora do banco, em disco; o conteúdo é cifrado
//! com AES-256-GCM usando uma chave derivada da frase configurada.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use argon2::Argon2;
use rand::{rngs::OsRng as RandOsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Erros específicos para operações de criptografia
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Falha na criptografia: {0}")]
    EncryptionFailed(String),

    #[error("Falha na descriptografia: {0}")]
    DecryptionFailed(String),

    #[error("Dados inválidos: {0}")]
    InvalidData(String),

    #[error("Configuração de criptografia inválida: {0}")]
    InvalidConfiguration(String),
}

/// Tamanho do nonce em bytes para AES-GCM
const AES_GCM_NONCE_SIZE: usize = 12;

/// Tamanho mínimo do salt aceito pelo Argon2
const MIN_SALT_SIZE: usize = 8;

/// Chave AES-256 (zerada ao sair de escopo)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Cria uma nova chave aleatória
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        RandOsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Cria uma chave a partir de bytes existentes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidData(format!(
                "A chave deve ter 32 bytes, recebeu {}",
                bytes.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Deriva a chave de uma frase secreta usando Argon2id
    pub fn derive(key_phrase: &str, salt: &[u8]) -> Result<Self, CryptoError> {
        if key_phrase.is_empty() {
            return Err(CryptoError::InvalidConfiguration(
                "Frase da chave não pode ser vazia".to_string(),
            ));
        }
        if salt.len() < MIN_SALT_SIZE {
            return Err(CryptoError::InvalidConfiguration(format!(
                "Salt deve ter ao menos {} bytes",
                MIN_SALT_SIZE
            )));
        }

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(key_phrase.as_bytes(), salt, &mut key)
            .map_err(|e| CryptoError::InvalidConfiguration(e.to_string()))?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Dados cifrados e o nonce usado
#[derive(Debug, Clone)]
pub struct EncryptedData {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl EncryptedData {
    /// Serializa como `nonce || ciphertext` para gravação em arquivo
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nonce.len() + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() <= AES_GCM_NONCE_SIZE {
            return Err(CryptoError::InvalidData(format!(
                "Conteúdo cifrado curto demais: {} bytes",
                bytes.len()
            )));
        }
        let (nonce, ciphertext) = bytes.split_at(AES_GCM_NONCE_SIZE);
        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            nonce: nonce.to_vec(),
        })
    }
}

/// Criptografa dados usando AES-256-GCM
pub fn encrypt(data: &[u8], key: &EncryptionKey) -> Result<EncryptedData, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedData {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Descriptografa dados usando AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &EncryptionKey) -> Result<Vec<u8>, CryptoError> {
    if encrypted.nonce.len() != AES_GCM_NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            AES_GCM_NONCE_SIZE,
            encrypted.nonce.len()
        )));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(&encrypted.nonce), encrypted.ciphertext.as_ref())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
