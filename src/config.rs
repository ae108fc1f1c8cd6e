use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Herbsafe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Herbsafe/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Herbsafe")
}

/// Get the clinic database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}
