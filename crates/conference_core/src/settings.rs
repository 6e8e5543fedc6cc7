//! Conference toolkit settings.
//!
//! # Responsibility
//! - Deserialize settings from JSON with a default for every field.
//! - Reject values the core cannot work with.
//!
//! # Invariants
//! - A loaded `ConferenceSettings` has passed `validate()`.

use crate::integrations::feed::DEFAULT_FEED_TTL;
use crate::integrations::ranking::DEFAULT_MISSING_VOTE;
use crate::timetable::DEFAULT_SLOT_MINUTES;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings document: {err}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings shared by the timetable and the collaborator boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConferenceSettings {
    /// Timetable slot length in minutes.
    pub slot_minutes: u32,
    /// Mail allow-list; empty disables outbound mail.
    pub send_email_to: Vec<String>,
    pub default_from_email: String,
    /// Vote engine executable.
    pub ranking_engine: PathBuf,
    /// Vote assigned to talks a voter did not rate.
    pub missing_vote: i32,
    /// Badge rendering executable.
    pub badge_program: PathBuf,
    pub feed_cache_ttl_secs: u64,
}

impl Default for ConferenceSettings {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            send_email_to: Vec::new(),
            default_from_email: "webmaster@localhost".to_string(),
            ranking_engine: PathBuf::from("voteengine"),
            missing_vote: DEFAULT_MISSING_VOTE,
            badge_program: PathBuf::from("conference-badge"),
            feed_cache_ttl_secs: DEFAULT_FEED_TTL.as_secs(),
        }
    }
}

impl ConferenceSettings {
    /// Parses and validates a JSON settings document.
    pub fn from_json_str(document: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(document)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&document)?;
        info!(
            "event=settings_load module=settings status=ok path={} slot_minutes={}",
            path.display(),
            settings.slot_minutes
        );
        Ok(settings)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if self.slot_minutes == 0 {
            return Err(SettingsError::Invalid(
                "slot_minutes must be at least 1".to_string(),
            ));
        }
        if self.send_email_to.iter().any(|address| address.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "send_email_to must not contain blank addresses".to_string(),
            ));
        }
        Ok(())
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }
}
