#![forbid(unsafe_code)]

//! Core domain model and business logic for the push-up counter.
//!
//! This crate provides:
//! - Domain types (joints, keypoints, poses, repetition events)
//! - Angle computation
//! - The repetition-detection state machine
//! - Durable repetition history (append/list/clear/CSV export)
//! - The frame loop that drives a counting session

pub mod angle;
pub mod config;
pub mod detector;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod skeleton;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use angle::angle_degrees;
pub use config::Config;
pub use detector::RepDetector;
pub use error::{Error, Result};
pub use history::{format_timestamp, HistoryStore};
pub use session::{CounterDisplay, PoseSource, Session};
pub use store::{FileStore, StringStore};
pub use types::*;
