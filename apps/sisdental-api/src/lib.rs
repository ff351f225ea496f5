//! SisDental API - servidor HTTP do consultório
//!
//! Expõe os blocos do servidor (configuração, estado, erros, rotas) para o
//! binário e para os testes de integração.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod telemetry;

/// Metadados gerados pelo `build.rs`
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
