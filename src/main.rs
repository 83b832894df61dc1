use std::{process::ExitCode, sync::Arc};

use remodel_market::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    providers::{GraderState, HttpGrader, MessagingState, TwilioClient},
    repository::{PostgresRepository, RepositoryState},
    storage::{MediaStore, S3MediaStore, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects the store and the providers,
/// then serves the router until the process is stopped.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet.
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "remodel_market=debug,tower_http=info".into());

    // Pretty for humans locally, JSON for the log pipeline in production.
    match config.env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let messaging = Arc::new(TwilioClient::new(
        &config.twilio_api_base,
        &config.twilio_account_sid,
        &config.twilio_auth_token,
        &config.twilio_from_number,
    )) as MessagingState;

    let grader = Arc::new(HttpGrader::new(&config.grader_url)) as GraderState;

    let media = S3MediaStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    );
    // MinIO in docker starts empty.
    if config.env == Env::Local {
        media.ensure_bucket_exists().await;
    }
    let storage = Arc::new(media) as StorageState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        repo,
        messaging,
        grader,
        storage,
        config,
    });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API documentation available at http://{bind_addr}/swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
