use anyhow::Context;
use clap::Parser;
use prometheus::Registry;
use shortlink_admin::{AdminClientSettings, GrpcAdminChecker};
use shortlink_core::{AdminChecker, Repository, StaticAdminChecker};
use shortlink_gateway::config::StorageBackendArg;
use shortlink_gateway::handlers::RESERVED_ALIASES;
use shortlink_gateway::{App, AppState, Cli, HttpMetrics, JwtValidator};
use shortlink_generator::RandomGenerator;
use shortlink_shortener::UrlService;
use shortlink_storage::{
    InMemoryRepository, InstrumentedRepository, SqliteRepository, SqliteSettings, StorageMetrics,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();

    shortlink_telemetry::init(config.env).context("failed to initialise tracing")?;

    info!(
        env = %config.env,
        http_address = %config.http_address,
        storage_backend = %config.storage,
        public_base_url = %config.public_base_url,
        "starting url shortener"
    );

    let registry = Registry::new();
    let storage_metrics =
        StorageMetrics::new(&registry).context("failed to register storage metrics")?;

    let jwt_pem = config.jwt_public_key_pem()?;
    let jwt = JwtValidator::from_pem(&jwt_pem).context("failed to load JWT public key")?;

    let admin_checker = admin_checker(&config)?;

    match config.storage {
        StorageBackendArg::InMemory => {
            warn!("using in-memory storage, data is lost on restart");
            let repository = InstrumentedRepository::new(InMemoryRepository::new(), storage_metrics);
            run_server(&config, registry, repository, admin_checker, jwt).await
        }
        StorageBackendArg::Sqlite => {
            let path = config.sqlite_path()?;
            let settings = SqliteSettings::builder().path(path).build();
            let sqlite = SqliteRepository::connect(&settings)
                .await
                .with_context(|| format!("failed to open database at {path}"))?;

            if config.run_migrations {
                sqlite
                    .migrate()
                    .await
                    .context("failed to apply migrations")?;
            }

            let repository = InstrumentedRepository::new(sqlite.clone(), storage_metrics);
            let result = run_server(&config, registry, repository, admin_checker, jwt).await;
            sqlite.close().await;
            info!("storage closed");
            result
        }
    }
}

fn admin_checker(config: &Cli) -> anyhow::Result<Arc<dyn AdminChecker>> {
    match &config.sso_address {
        Some(address) => {
            let settings = AdminClientSettings::builder()
                .address(address.clone())
                .timeout(config.sso_timeout)
                .retries(config.sso_retries)
                .insecure(config.sso_insecure)
                .build();
            let checker =
                GrpcAdminChecker::new(settings).context("failed to create admin client")?;
            info!(address = %address, "admin checks use the identity service");
            Ok(Arc::new(checker))
        }
        None => {
            warn!(
                admins = config.admin_user_ids.len(),
                "no identity service configured, using static admin list"
            );
            Ok(Arc::new(StaticAdminChecker::new(
                config.admin_user_ids.iter().copied(),
            )))
        }
    }
}

async fn run_server<R: Repository>(
    config: &Cli,
    registry: Registry,
    repository: R,
    admin_checker: Arc<dyn AdminChecker>,
    jwt: JwtValidator,
) -> anyhow::Result<()> {
    let http_metrics = HttpMetrics::new(&registry).context("failed to register http metrics")?;

    let service = UrlService::new(repository, admin_checker, RandomGenerator::default())
        .with_operation_timeout(config.operation_timeout)
        .with_reserved_aliases(RESERVED_ALIASES.iter().copied());

    let state = AppState::new(
        Arc::new(service),
        jwt,
        http_metrics,
        registry,
        config.public_base_url.clone(),
    );
    let router = App::router(state, config.http_timeout);

    let listener = TcpListener::bind(config.http_address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_address))?;
    info!(address = %config.http_address, "http server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result
                .context("http server task failed")?
                .context("http server stopped unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining connections");
        }
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => info!("http server stopped"),
        Ok(Ok(Err(e))) => error!(error = %e, "http server failed during shutdown"),
        Ok(Err(e)) => error!(error = %e, "http server task failed during shutdown"),
        Err(_) => {
            warn!(timeout = ?config.shutdown_timeout, "graceful shutdown timed out, aborting");
            server.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
}
