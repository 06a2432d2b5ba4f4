use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::TokenKeys;
use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::store::PgIdentityStore;
use authgate::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Key material is decoded once, before anything listens.
    let keys = TokenKeys::from_settings(&configuration.auth).map_err(|e| {
        tracing::error!("Failed to load token keys: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Key configuration error")
    })?;

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let store = Arc::new(PgIdentityStore::new(pool));
    let server = run(listener, store, keys)?;

    server.await
}
