//! Montagem do [`Router`] com as camadas de middleware
//!
//! Usado tanto pelo binário quanto pelos testes de integração, para que os
//! dois exercitem a mesma pilha.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::routes;
use crate::state::AppState;

/// Camadas aplicadas de baixo para cima: limite de concorrência, trace, CORS
pub fn build_app_router(state: AppState) -> Result<Router> {
    let cors = build_cors_layer(&state.config)?;
    let max_concurrent = state.config.max_concurrent_requests;

    Ok(Router::new()
        .merge(routes::health_routes())
        .merge(routes::auth_routes())
        .merge(routes::api_routes())
        .merge(routes::portal_routes())
        // Um único semáforo para todas as rotas
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state))
}

/// CORS a partir de `CORS_ORIGINS`; origem malformada impede a subida
pub fn build_cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Origem CORS inválida: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
