//! Device position capture.
//!
//! The form never talks to a positioning backend directly; it asks a
//! `Locator` for the current position. Front ends plug in whatever their
//! platform offers. No accuracy, timeout or maximum age options are exposed.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Coordinate;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Geolocation is not supported on this device")]
    Unsupported,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for a position")]
    Timeout,
}

/// Source of the device's current position.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Locator that always reports the same position.
/// Used when the user types the coordinates in, e.g. from the CLI or config.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    coordinate: Coordinate,
}

impl FixedLocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.coordinate)
    }
}

/// Locator for platforms without a positioning capability
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocator;

#[async_trait]
impl Locator for UnsupportedLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}
