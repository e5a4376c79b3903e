pub mod ai;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Cli, Command, DbArgs, ServeArgs};

pub fn router(state: Arc<commands::AppState>) -> Router {
    Router::new()
        .route("/", get(commands::index))
        .route("/health", get(commands::health))
        .route("/api/schema", get(commands::get_schema))
        .route("/api/ask", post(commands::ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::InitDb(args) => init_db(args).await,
    }
}

async fn init_db(args: DbArgs) -> anyhow::Result<()> {
    let path = args.path.clone();
    let report = tokio::task::spawn_blocking(move || db::initialize(&path)).await??;
    for (table, count) in &report.row_counts {
        info!(table = %table, rows = count, "table ready");
    }
    println!("Database created with sample data!");
    println!("\nSchema Information:");
    println!("{}", schema::RETAIL_SCHEMA.display_text());
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let ai_config = args.ai_config()?;
    if !args.db.path.exists() {
        warn!(
            path = %args.db.path.display(),
            "database file not found; run `sqlstudio init-db` first"
        );
    }

    info!("======================================");
    info!("  Natural Language to SQL");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Database: {}", args.db.path.display());
    info!("Provider: {} ({})", ai_config.provider.name(), ai_config.model);
    info!("Execution policy: {:?}", args.policy);
    info!("======================================");

    let state = Arc::new(commands::AppState::new(
        ai::PromptBuilder::new(&schema::RETAIL_SCHEMA),
        Arc::new(ai::AIService::new(ai_config)),
        args.db.path.clone(),
        args.policy,
    ));

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Open http://{} in a browser", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
