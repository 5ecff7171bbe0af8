use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use webpanel_backend_lib::{config::Settings, db::Database, router, AppState};

#[derive(Parser)]
#[command(name = "webpanel-backend", about = "Web panel authentication backend")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let db = Arc::new(Database::open(settings.db_path())?);
    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(db, settings));

    let app = router::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
