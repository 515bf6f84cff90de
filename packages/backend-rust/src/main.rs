use std::net::SocketAddr;
use std::sync::Arc;

use wordmaster_backend_rust::cache::RedisCache;
use wordmaster_backend_rust::config::Config;
use wordmaster_backend_rust::db::{self, migrate};
use wordmaster_backend_rust::logging;
use wordmaster_backend_rust::routes;
use wordmaster_backend_rust::seed;
use wordmaster_backend_rust::state::AppState;
use wordmaster_backend_rust::workers::WorkerManager;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => {
            if let Err(err) = migrate::run_migrations(proxy.pool()).await {
                tracing::error!(error = %err, "database migration failed");
                std::process::exit(1);
            }
            seed::seed_sample_words(proxy.as_ref()).await;
            Some(proxy)
        }
        Err(err) => {
            tracing::warn!(error = %err, "database proxy not initialized");
            None
        }
    };

    let cache = match db_proxy.as_ref().and_then(|proxy| proxy.redis_url()) {
        Some(redis_url) => match RedisCache::connect(redis_url).await {
            Ok(cache) => {
                tracing::info!("redis cache connected");
                Some(Arc::new(cache))
            }
            Err(err) => {
                tracing::warn!(error = %err, "redis cache unavailable, continuing without it");
                None
            }
        },
        None => None,
    };

    let worker_manager = if let Some(ref proxy) = db_proxy {
        match WorkerManager::new(Arc::clone(proxy)).await {
            Ok(manager) => {
                if let Err(e) = manager.start().await {
                    tracing::error!(error = %e, "failed to start workers");
                }
                Some(Arc::new(manager))
            }
            Err(e) => {
                tracing::warn!(error = %e, "worker manager not initialized");
                None
            }
        }
    } else {
        None
    };

    let state = AppState::new(config.clone(), db_proxy, cache);
    let app = routes::router(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "wordmaster backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
