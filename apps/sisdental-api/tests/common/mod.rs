//! Infraestrutura compartilhada dos testes de integração
//!
//! Monta o mesmo [`Router`] do binário sobre um banco em memória e um
//! diretório temporário de documentos.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use serde_json::Value;
use sisdental_api::auth::jwt::{generate_token, ROLE_PATIENT, ROLE_STAFF};
use sisdental_api::config::AppConfig;
use sisdental_api::router::build_app_router;
use sisdental_api::state::AppState;
use sisdental_db::crypto::EncryptionKey;
use sisdental_db::{init_memory_pool, DocumentStore};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub config: AppConfig,
    /// Mantido vivo enquanto o teste roda
    _documents_dir: TempDir,
}

pub fn test_config() -> AppConfig {
    let lookup = |key: &str| match key {
        "JWT_SECRET" => Some("segredo-dos-testes".to_string()),
        "DOCUMENTS_KEY_PHRASE" => Some("frase dos testes".to_string()),
        "DATABASE_PATH" => Some(":memory:".to_string()),
        "MAX_CONCURRENT_REQUESTS" => Some("8".to_string()),
        _ => None,
    };
    AppConfig::from_lookup(lookup).expect("config de teste válida")
}

pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let pool = init_memory_pool().await.expect("banco em memória");
    let documents_dir = tempfile::tempdir().expect("diretório temporário");
    let store = DocumentStore::with_key(documents_dir.path(), EncryptionKey::generate());

    let state = AppState::new(pool.clone(), config.clone(), store);
    let router = build_app_router(state).expect("router de teste");

    TestApp {
        router,
        pool,
        config,
        _documents_dir: documents_dir,
    }
}

impl TestApp {
    /// Quantidade de arquivos gravados no armazenamento de documentos
    pub fn stored_files(&self) -> usize {
        count_files(self._documents_dir.path())
    }

    pub fn staff_token(&self) -> String {
        generate_token(1, ROLE_STAFF, "Equipe", &self.config.jwt).expect("token da equipe")
    }

    pub fn patient_token(&self, patient_id: i64, name: &str) -> String {
        generate_token(patient_id, ROLE_PATIENT, name, &self.config.jwt).expect("token do paciente")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<axum::body::BoxBody> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("requisição válida");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("o router não falha")
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<axum::body::BoxBody> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<axum::body::BoxBody> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, token: &str, body: Value) -> Response<axum::body::BoxBody> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<axum::body::BoxBody> {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Cadastra um paciente pela API e devolve o id
    pub async fn create_patient(&self, token: &str, body: Value) -> i64 {
        let response = self.post_json("/api/pacientes", Some(token), body).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        body_json(response).await["id"].as_i64().expect("id do paciente")
    }
}

fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

pub async fn body_bytes(response: Response<axum::body::BoxBody>) -> Vec<u8> {
    hyper::body::to_bytes(response.into_body())
        .await
        .expect("corpo legível")
        .to_vec()
}

pub async fn body_json(response: Response<axum::body::BoxBody>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("corpo JSON")
}
