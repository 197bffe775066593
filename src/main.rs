use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::CredentialService;
use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::store::{AccountStore, PgAccountStore};
use authgate::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!(jwt = ?configuration.jwt, "Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    let store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool));
    let service = CredentialService::new(store, &configuration.jwt, &configuration.password)
        .map_err(|e| {
            tracing::error!("Failed to build credential service: {}", e);
            startup_error(std::io::ErrorKind::InvalidInput, "Credential service error")
        })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, service)?.await
}
