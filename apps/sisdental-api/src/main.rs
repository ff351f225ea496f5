use std::net::SocketAddr;

use anyhow::{Context, Result};
use sisdental_db::{init_db_pool, DocumentStore};
use tracing::{error, info};

use sisdental_api::config::AppConfig;
use sisdental_api::router::build_app_router;
use sisdental_api::state::AppState;
use sisdental_api::{build_info, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Configuração inválida")?;
    telemetry::init_tracing(config.log_format);
    info!(version = build_info::PKG_VERSION, "Iniciando SisDental API");

    let pool = init_db_pool(&config.db).await?;
    let store = DocumentStore::open(&config.store).await?;

    let addr = SocketAddr::new(
        config.host.parse().context("HOST inválido")?,
        config.port,
    );
    let state = AppState::new(pool.clone(), config, store);
    let app = build_app_router(state)?;

    info!(%addr, "Servidor escutando");
    axum::Server::try_bind(&addr)
        .with_context(|| format!("Falha ao abrir {}", addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor HTTP")?;

    pool.close().await;
    info!("Servidor encerrado");
    Ok(())
}

/// Aguarda Ctrl-C ou SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Falha ao instalar handler de Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Falha ao instalar handler de SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Sinal de desligamento recebido");
}
