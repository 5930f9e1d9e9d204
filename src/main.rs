use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastfinger::{
    app::{router, AppState},
    broadcast::Coordinator,
    config::AppConfig,
    roster::Roster,
    state::Session,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fastfinger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting fastfinger...");

    let config = AppConfig::from_env();

    let roster = match Roster::from_file(&config.roster_file) {
        Ok(roster) => Arc::new(roster),
        Err(e) => {
            tracing::error!("Cannot load roster: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!(
        "Loaded {} names in {} groups from {}",
        roster.len(),
        roster.groups().len(),
        config.roster_file.display()
    );

    let session = Session::new(roster.clone()).with_auto_end(config.auto_end);
    let handle = Coordinator::spawn(session);

    let state = Arc::new(AppState::new(handle, roster));
    let app = router(state, &config.static_dir);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
