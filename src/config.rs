//! Detector configuration loaded from YAML
//!
//! The static stop-line list is the only required field; everything else has
//! a default matching the classic traffic light detector node.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::types::{position, Position};
use crate::error::{DetectorError, Result};

/// Consecutive identical observations needed before a color is trusted
pub const STATE_COUNT_THRESHOLD: u32 = 3;

/// How forward distance along the route is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTopology {
    /// The route has a start and an end; nothing past the last waypoint is ahead
    #[default]
    Open,
    /// The route loops; distances wrap from the last waypoint to the first
    Closed,
}

/// Where the raw color of the located light comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSourceKind {
    /// Use the color reported on the dynamic light feed
    #[default]
    GroundTruth,
    /// Run the image classifier on the current camera frame
    Classifier,
}

/// Topic names used by the ROS adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    pub pose: String,
    pub route: String,
    pub lights: String,
    pub image: String,
    pub traffic_waypoint: String,
}

impl Default for Topics {
    fn default() -> Self {
        Topics {
            pose: "/current_pose".to_string(),
            route: "/base_waypoints".to_string(),
            lights: "/vehicle/traffic_lights".to_string(),
            image: "/image_color".to_string(),
            traffic_waypoint: "/traffic_waypoint".to_string(),
        }
    }
}

/// Full detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Stop-line positions, one per known light, in dynamic feed order
    pub stop_line_positions: Vec<[f64; 2]>,

    #[serde(default = "default_threshold")]
    pub state_count_threshold: u32,

    #[serde(default)]
    pub route_topology: RouteTopology,

    /// Ignore lights further ahead than this many waypoints
    #[serde(default)]
    pub max_lookahead_waypoints: Option<usize>,

    #[serde(default)]
    pub state_source: StateSourceKind,

    #[serde(default)]
    pub topics: Topics,
}

fn default_threshold() -> u32 {
    STATE_COUNT_THRESHOLD
}

impl DetectorConfig {
    /// Configuration with default settings for the given stop lines
    pub fn with_stop_lines(stop_line_positions: Vec<[f64; 2]>) -> Self {
        DetectorConfig {
            stop_line_positions,
            state_count_threshold: STATE_COUNT_THRESHOLD,
            route_topology: RouteTopology::default(),
            max_lookahead_waypoints: None,
            state_source: StateSourceKind::default(),
            topics: Topics::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DetectorError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a configuration string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: DetectorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive the detector
    pub fn validate(&self) -> Result<()> {
        if self.stop_line_positions.is_empty() {
            return Err(DetectorError::InvalidConfig(
                "stop_line_positions must list at least one stop line".to_string(),
            ));
        }

        if let Some((i, line)) = self
            .stop_line_positions
            .iter()
            .enumerate()
            .find(|(_, line)| !line[0].is_finite() || !line[1].is_finite())
        {
            return Err(DetectorError::InvalidConfig(format!(
                "stop line {} has non-finite position ({}, {})",
                i, line[0], line[1]
            )));
        }

        if self.state_count_threshold == 0 {
            return Err(DetectorError::InvalidConfig(
                "state_count_threshold must be positive".to_string(),
            ));
        }

        if self.max_lookahead_waypoints == Some(0) {
            return Err(DetectorError::InvalidConfig(
                "max_lookahead_waypoints must be positive when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Stop-line positions as map points
    pub fn stop_lines(&self) -> Vec<Position> {
        self.stop_line_positions
            .iter()
            .map(|line| position(line[0], line[1]))
            .collect()
    }
}
