//! Application configuration.
//!
//! # Responsibility
//! - Read the optional TOML configuration file.
//! - Supply defaults for every key so a missing file still yields a working
//!   offline setup.
//! - Build the calendar provider the configuration asks for.
//!
//! # Invariants
//! - A returned `AppConfig` has passed `validate()`.
//! - The timezone is passed through to the calendar untouched.

use crate::sync::disabled::DisabledCalendar;
use crate::sync::google::GoogleCalendar;
use crate::sync::provider::CalendarProvider;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DATA_FILE: &str = "data.json";
const DEFAULT_TIMEZONE: &str = "Asia/Taipei";
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_TOKEN_FILE: &str = "token.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// `[calendar]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    pub enabled: bool,
    pub calendar_id: String,
    pub token_file: PathBuf,
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CalendarConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub timezone: String,
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub calendar: CalendarConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            timezone: DEFAULT_TIMEZONE.to_string(),
            log_level: None,
            log_dir: None,
            calendar: CalendarConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses TOML text and validates the result.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timezone.trim().is_empty() {
            return Err(ConfigError::Invalid("timezone cannot be blank".to_string()));
        }
        if self.calendar.calendar_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "calendar.calendar_id cannot be blank".to_string(),
            ));
        }
        if self.calendar.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "calendar.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_file cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Builds the configured calendar provider.
    ///
    /// A Google setup whose token cannot be read degrades to offline mode;
    /// calendar sync is advisory, so startup never fails on it.
    pub fn calendar_provider(&self) -> Box<dyn CalendarProvider> {
        if !self.calendar.enabled {
            info!("event=calendar_select module=config status=ok provider=disabled");
            return Box::new(DisabledCalendar);
        }
        match GoogleCalendar::from_token_file(
            &self.calendar.token_file,
            self.calendar.calendar_id.clone(),
            self.calendar.timeout(),
        ) {
            Ok(calendar) => {
                info!("event=calendar_select module=config status=ok provider=google_calendar");
                Box::new(calendar)
            }
            Err(err) => {
                warn!(
                    "event=calendar_select module=config status=error provider=google_calendar error_code={} fallback=disabled",
                    err.code()
                );
                Box::new(DisabledCalendar)
            }
        }
    }
}
