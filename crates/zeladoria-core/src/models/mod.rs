//! Data models for zeladoria reports.
//!
//! This module contains the data structures used on both sides of the
//! report form:
//!
//! - `ReportDraft`, `Coordinate`, `Photo`: the in-progress report held in memory
//! - `Category`: the fixed set of problem categories offered by the form
//! - `SubmissionStatus`: the typed state of the capture/submit pipeline
//! - `Report`, `StatusHistory`: reports as returned by the city API

pub mod category;
pub mod draft;
pub mod report;
pub mod status;

pub use category::{Category, CategoryId};
pub use draft::{Coordinate, Photo, ReportDraft};
pub use report::{Report, ReportState, StatusHistory};
pub use status::{NetworkFailure, SubmissionStatus};
