use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dosewatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default PubChem PUG REST base URL.
pub const DEFAULT_PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov";

/// Timeout for external chemical-property lookups, in seconds.
pub const PUBCHEM_TIMEOUT_SECS: u64 = 5;

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Get the application data directory (~/Dosewatch/ on all platforms).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dosewatch")
}

/// Database path: `DOSEWATCH_DB` env var, else ~/Dosewatch/dosewatch.db.
pub fn database_path() -> PathBuf {
    std::env::var("DOSEWATCH_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("dosewatch.db"))
}

/// Interaction-model artifact path: `DOSEWATCH_MODEL` env var,
/// else ~/Dosewatch/models/ddi_model.json.
pub fn model_path() -> PathBuf {
    std::env::var("DOSEWATCH_MODEL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("models").join("ddi_model.json"))
}

/// PubChem base URL override (`DOSEWATCH_PUBCHEM_URL`), for local mirrors.
pub fn pubchem_url() -> String {
    std::env::var("DOSEWATCH_PUBCHEM_URL").unwrap_or_else(|_| DEFAULT_PUBCHEM_URL.to_string())
}

/// HTTP bind address (`DOSEWATCH_BIND`).
pub fn bind_addr() -> String {
    std::env::var("DOSEWATCH_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,dosewatch=debug".to_string()
}
