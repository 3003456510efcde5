use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalendarError, Result};
use crate::grid::{CalendarViewState, GridMetrics, ViewMode};

pub const DEFAULT_CONFIG_FILE: &str = "calendar.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub slot_granularity_minutes: u32,
    pub pixels_per_slot: f64,
    pub default_view_mode: ViewMode,
    pub port: u16,
    pub data_dir: PathBuf,
    pub admin_password: Option<String>,
    pub notification_history: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 19,
            slot_granularity_minutes: 5,
            pixels_per_slot: 10.0,
            default_view_mode: ViewMode::Operatory,
            port: 8080,
            data_dir: PathBuf::from("data"),
            admin_password: None,
            notification_history: 50,
        }
    }
}

impl CalendarConfig {
    /// Reads the TOML file (explicit path, `CALENDAR_CONFIG`, or `calendar.toml`) when present,
    /// then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CALENDAR_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            debug!(path = %path.display(), "reading calendar config");
            Self::from_toml(&std::fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `PORT`, `DATA_DIR` and `ADMIN_PASSWORD` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(%port, "ignoring unparsable PORT"),
            }
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(password) = lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()) {
            self.admin_password = Some(password);
        }
    }

    pub fn metrics(&self) -> GridMetrics {
        GridMetrics {
            calendar_start_minutes: self.start_hour * 60,
            pixels_per_slot: self.pixels_per_slot,
            slot_granularity_minutes: self.slot_granularity_minutes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_hour < self.start_hour || self.end_hour > 24 {
            return Err(CalendarError::InvalidRange(format!(
                "business hours {}..{} are not a valid day",
                self.start_hour, self.end_hour
            )));
        }
        self.metrics().validate()
    }

    /// View state for `date` in the configured default view mode
    pub fn view_state(&self, date: NaiveDate) -> CalendarViewState {
        CalendarViewState {
            date,
            view_mode: self.default_view_mode,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            metrics: self.metrics(),
        }
    }
}
