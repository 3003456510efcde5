use thiserror::Error;

/// Result type for calendar operations
pub type Result<T> = std::result::Result<T, CalendarError>;

/// Errors raised by the calendar grid, the drag coordinator and the practice back end
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Malformed slot generation parameters
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Zero, negative or non-finite grid constants
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The appointment's resource matches no visible column.
    /// Not fatal: the appointment is left out of the render.
    #[error("Appointment {appointment_id} has no column for resource {resource_id}")]
    UnassignedResource { appointment_id: u32, resource_id: u32 },

    /// The back end rejected or failed the write
    #[error("Reschedule failed: {0}")]
    RescheduleFailed(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
}
