//! Traffic light detection core
//!
//! Finds the next traffic light ahead of the vehicle on a fixed route and
//! turns noisy per-frame color observations into a debounced stop waypoint.
pub mod common;
pub mod config;
pub mod context;
pub mod detector;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod perception;

pub use crate::config::DetectorConfig;
pub use crate::context::DetectorContext;
pub use crate::detector::{FrameOutcome, TrafficLightDetector};
pub use crate::error::{DetectorError, Result};
pub use crate::perception::LightColor;
