use paypoint::{
    api::{AppState, build_router},
    config,
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Connect and create tables
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 4. Seed organizations and pages, if a seed file exists
    if let Some(seed) = config::seed::load_default_config()? {
        let created = config::seed::seed_database(&db, &seed)
            .await
            .inspect_err(|e| error!("Failed to seed database: {}", e))?;
        info!("Seeded {} payment pages.", created);
    }

    // 5. Serve
    let address = config::server::bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", address, e))?;
    info!("PayPoint listening on {}", address);

    let app = build_router(Arc::new(AppState::new(db)));
    axum::serve(listener, app).await?;

    Ok(())
}
