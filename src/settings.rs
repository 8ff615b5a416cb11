//! Runtime configuration.
//!
//! Values are layered, lowest priority first: built-in defaults, an optional `attendance.toml`
//! in the working directory, `ATTENDANCE_*` environment variables, and finally `DATABASE_URL`
//! (read from the environment or a `.env` file).

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default database file used when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "attendance.sqlite3";

/// How many recent sessions the overview pages show.
pub const DEFAULT_RECENT_SESSIONS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub recent_sessions: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            recent_sessions: DEFAULT_RECENT_SESSIONS,
        }
    }
}

impl Settings {
    /// Loads settings from `attendance.toml` (if present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from("attendance")
    }

    /// Same as [`Settings::load`] but reads the file at `path` (extension optional).
    pub fn load_from(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("recent_sessions", DEFAULT_RECENT_SESSIONS)?
            .add_source(File::with_name(path).required(false));

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database_url", url)?;
        }

        let settings = builder
            .add_source(Environment::with_prefix("ATTENDANCE").try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;

        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load_from("no-such-attendance-config").unwrap();
        assert_eq!(settings.recent_sessions, DEFAULT_RECENT_SESSIONS);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join("attendance_settings_test.toml");
        fs::write(&path, "recent_sessions = 12\n").unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(settings.recent_sessions, 12);
    }
}
