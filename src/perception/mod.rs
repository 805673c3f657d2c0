//! Perception module for the traffic light detector
pub mod classifier;
pub mod filters;
pub mod locator;
pub mod sensors;

use crate::common::types::{Position, WaypointIndex};
use serde::{Deserialize, Serialize};

/// Observed color of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Red,
    Yellow,
    Green,
    #[default]
    Unknown,
}

impl LightColor {
    /// Wire code used by traffic light messages
    pub fn code(self) -> i32 {
        match self {
            LightColor::Red => 0,
            LightColor::Yellow => 1,
            LightColor::Green => 2,
            LightColor::Unknown => 4,
        }
    }

    /// Decode a message color code; unrecognized codes are unknown
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LightColor::Red,
            1 => LightColor::Yellow,
            2 => LightColor::Green,
            _ => LightColor::Unknown,
        }
    }

    /// Whether the vehicle has to stop at the line for this color
    pub fn requires_stop(self) -> bool {
        self == LightColor::Red
    }
}

/// A statically configured traffic light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficLight {
    /// Position in the dynamic light feed
    pub index: usize,
    /// Where the vehicle has to halt for this light
    pub stop_line: Position,
}

/// The light selected as the next one ahead of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedLight {
    /// Route waypoint closest to the light's stop line
    pub stop_waypoint: WaypointIndex,
    /// Index of the light in the static configuration
    pub light_index: usize,
    /// Waypoints between the vehicle and the stop line
    pub distance: usize,
}
