use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use dosewatch::api::{server, ApiContext};
use dosewatch::catalog;
use dosewatch::config;
use dosewatch::db::sqlite::open_database;
use dosewatch::db::DatabaseError;
use dosewatch::ddi::{DdiModel, PubChemClient};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_configured_database() -> Result<rusqlite::Connection, DatabaseError> {
    let path = config::database_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    }
    open_database(&path)
}

fn run_seed(csv_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_configured_database()?;
    let summary = catalog::import_csv(&conn, csv_path)?;
    println!(
        "Imported {} catalog rows ({} alternatives inserted, {} duplicates skipped)",
        summary.rows, summary.alternatives_inserted, summary.alternatives_skipped
    );
    Ok(())
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_configured_database()?;

    let model = DdiModel::load(&config::model_path());
    let model_loaded = model.is_loaded();

    let ctx = ApiContext::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(model),
        Arc::new(PubChemClient::from_config()),
        model_loaded,
    );

    let addr: SocketAddr = config::bind_addr().parse()?;
    tracing::info!(version = config::APP_VERSION, "{} starting", config::APP_NAME);
    server::serve(ctx, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("seed") => match args.get(2) {
            Some(path) => run_seed(Path::new(path)),
            None => {
                eprintln!("Usage: dosewatch seed <catalog.csv>");
                std::process::exit(2);
            }
        },
        Some(other) => {
            eprintln!("Unknown command: {other}\nUsage: dosewatch [seed <catalog.csv>]");
            std::process::exit(2);
        }
        None => run_server().await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}
