use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use art_backoffice::config::Config;
use art_backoffice::db::Database;
use art_backoffice::server::{serve, AppState};
use art_backoffice::translator::Translator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("art_backoffice=info".parse()?),
        )
        .init();

    info!("Starting art backoffice service");

    let config = Config::from_env()?;

    let db = Database::new(&config.database_path)?;
    let translator = Arc::new(Translator::new(
        config.translate_api_url.clone(),
        config.translate_api_key.clone(),
    ));

    let state = AppState {
        db,
        translator,
        admin_api_key: config.admin_api_key.clone(),
    };

    serve(state, config.port).await
}
