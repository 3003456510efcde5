//! Scheduling calendar core for a dental practice.
//!
//! Lays a business day out as a time grid with one column per operatory or
//! provider, maps appointments between wall-clock time and pixels, and turns
//! drag-and-drop gestures into reschedule commands for the practice back end.

pub mod config;
pub mod display;
pub mod drag;
pub mod error;
pub mod grid;
pub mod notify;
pub mod parser;
pub mod practice;
pub mod web;

pub use config::CalendarConfig;
pub use error::{CalendarError, Result};
