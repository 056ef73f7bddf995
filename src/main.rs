use std::{process, sync::Arc};

use quickcart::{
    application::{admin::snapshots::SnapshotServiceError, error::AppError},
    cache::CacheConfig,
    config::{self, SnapshotArgs, SnapshotCommand},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ADMIN_ACTOR, AppState},
        memory::InMemoryRepositories,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Snapshot(args) => run_snapshot(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache = CacheConfig::from(&settings.cache);
    let time_limit = settings.catalog.query_time_limit;

    let state = match settings.database.url.as_deref() {
        Some(url) => {
            let repositories = connect_repositories(url, &settings).await?;
            AppState::from_repositories(repositories, cache, time_limit)
        }
        None => {
            warn!(
                target = "quickcart::serve",
                "database url is not configured; serving from the in-memory store, data will not persist"
            );
            AppState::from_repositories(Arc::new(InMemoryRepositories::new()), cache, time_limit)
        }
    };

    serve_http(&settings, state).await
}

async fn run_snapshot(settings: config::Settings, args: SnapshotArgs) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;
    let repositories = connect_repositories(url, &settings).await?;
    let state = AppState::from_repositories(
        repositories,
        CacheConfig::from(&settings.cache),
        settings.catalog.query_time_limit,
    );
    let snapshots = &state.snapshots;

    let output = match args.command {
        SnapshotCommand::Create { name } => {
            let created = snapshots
                .create_snapshot(ADMIN_ACTOR, name.as_deref())
                .await
                .map_err(snapshot_failed)?;
            serde_json::to_string_pretty(&created)
        }
        SnapshotCommand::List { limit } => {
            let listed = snapshots.list(limit).await.map_err(snapshot_failed)?;
            serde_json::to_string_pretty(&listed)
        }
        SnapshotCommand::Rollback { id } => {
            let report = snapshots
                .rollback(ADMIN_ACTOR, &id)
                .await
                .map_err(snapshot_failed)?;
            serde_json::to_string_pretty(&report)
        }
    }
    .map_err(|err| AppError::unexpected(err.to_string()))?;

    println!("{output}");
    Ok(())
}

fn snapshot_failed(err: SnapshotServiceError) -> AppError {
    AppError::unexpected(format!("snapshot command failed: {err}"))
}

async fn connect_repositories(
    url: &str,
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "quickcart::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });

    tokio::select! {
        joined = &mut server => return finish_server(joined),
        _ = signalled_rx => {}
    }

    info!(
        target = "quickcart::serve",
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "Shutdown requested; draining connections"
    );
    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(joined) => finish_server(joined),
        Err(_) => {
            warn!(
                target = "quickcart::serve",
                "Graceful shutdown timed out; aborting open connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn finish_server(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "quickcart::serve",
            error = %err,
            "Failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
