use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{init_tracing, load_config};
use database::{connect, drop_all, drop_table, list_tables, run_migrations, Database, QueryClient};

/// The main entry point for the backend service and its maintenance commands.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = load_config().context("Failed to load configuration")?;
    // The guard flushes the rolling log file when it is dropped at exit.
    let _log_guard = init_tracing(&settings.log)?;
    tracing::info!(environment = %settings.environment, "Configuration loaded.");

    let db = connect(&settings.database)
        .await
        .context("Failed to connect to the database")?;

    // Execute the appropriate command
    let outcome = match cli.command {
        Commands::Serve => handle_serve(&settings.server, &db).await,
        Commands::Migrate => run_migrations(&db).await.map_err(Into::into),
        Commands::Fresh => handle_fresh(&db).await,
        Commands::Down(args) => handle_down(&db, &args.table).await,
        Commands::DownAll => handle_down_all(&db).await,
        Commands::Tables => handle_tables(&db).await,
    };

    db.close().await;
    outcome
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A JSON API over a relational database, plus schema maintenance commands.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and start the HTTP server.
    Serve,
    /// Apply pending migrations.
    Migrate,
    /// Drop every table, then apply all migrations from scratch.
    Fresh,
    /// Drop a single table.
    Down(DownArgs),
    /// Drop every table, foreign keys notwithstanding.
    DownAll,
    /// List the tables in the database.
    Tables,
}

#[derive(Parser)]
struct DownArgs {
    /// The table to drop (e.g., "savings").
    #[arg(long)]
    table: String,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(server: &configuration::ServerSettings, db: &Database) -> anyhow::Result<()> {
    run_migrations(db).await?;
    let client = QueryClient::from(db.clone());
    web_server::run_server(server, client, shutdown_signal()).await
}

async fn handle_fresh(db: &Database) -> anyhow::Result<()> {
    let dropped = drop_all(db).await?;
    println!("Dropped {} tables.", dropped.len());
    run_migrations(db).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn handle_down(db: &Database, table: &str) -> anyhow::Result<()> {
    if drop_table(db, table).await? {
        println!("Dropped table `{table}`.");
    } else {
        println!("Table `{table}` does not exist.");
    }
    Ok(())
}

async fn handle_down_all(db: &Database) -> anyhow::Result<()> {
    let dropped = drop_all(db).await?;
    println!("Dropped {} tables.", dropped.len());
    Ok(())
}

async fn handle_tables(db: &Database) -> anyhow::Result<()> {
    let tables = list_tables(db).await?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Table"]);
    for (idx, name) in tables.iter().enumerate() {
        table.add_row(vec![(idx + 1).to_string(), name.clone()]);
    }
    println!("{} ({})", db.kind(), tables.len());
    println!("{table}");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where signals are available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C.");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
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
    tracing::info!("Shutdown signal received.");
}
