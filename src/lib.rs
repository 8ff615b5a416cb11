//! Role-based attendance tracking for an academic institution.
//!
//! Administrators manage departments, subjects, teachers and students; teachers take attendance
//! for their subjects; students see their own attendance. Everything goes through an
//! [`AttendanceManager`], with the signed-in user passed explicitly to each operation.

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod display;
pub mod error;
pub mod manager;
pub mod marking;
pub mod models;
pub mod overview;
pub mod report;
pub mod roster;
pub mod schema;
pub mod settings;

pub use error::{Error, ErrorKind, Result};
pub use manager::{AttendanceManager, NewAccount};
pub use settings::Settings;

/// Connects to the configured database, honouring `database_override` if given.
pub fn create_default_manager(database_override: Option<&str>) -> Result<AttendanceManager> {
    let mut settings = Settings::load()?;
    if let Some(url) = database_override {
        settings.database_url = url.to_string();
    }

    AttendanceManager::from_settings(&settings)
}

/// Installs the `tracing` subscriber used by the binaries. `RUST_LOG` overrides the default
/// `warn` level.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
