//! Shared detector state fed by independent producers
//!
//! Pose, route and light observations arrive asynchronously and in any order.
//! Each field is guarded on its own so producers never block each other, and
//! the frame pipeline reads a consistent snapshot of whatever has arrived.

use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::common::types::{position, Position};
use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::navigation::RouteIndex;
use crate::perception::{LightColor, TrafficLight};

/// Application context holding everything the frame pipeline reads
pub struct DetectorContext {
    pose: RwLock<Option<Position>>,
    route: RouteIndex,
    stop_lines: Vec<TrafficLight>,
    lights: RwLock<Vec<LightColor>>,
}

impl DetectorContext {
    /// Create a context for the statically configured stop lines
    pub fn new(stop_lines: &[Position]) -> Self {
        let stop_lines = stop_lines
            .iter()
            .enumerate()
            .map(|(index, stop_line)| TrafficLight {
                index,
                stop_line: *stop_line,
            })
            .collect();

        DetectorContext {
            pose: RwLock::new(None),
            route: RouteIndex::new(),
            stop_lines,
            lights: RwLock::new(Vec::new()),
        }
    }

    /// Create a context from a validated configuration
    pub fn from_config(config: &DetectorConfig) -> Self {
        DetectorContext::new(&config.stop_lines())
    }

    /// Record the latest vehicle position
    pub fn update_pose(&self, x: f64, y: f64) {
        let mut pose = self.pose.write().unwrap_or_else(PoisonError::into_inner);
        *pose = Some(position(x, y));
    }

    /// Most recent vehicle position, if any has been received
    pub fn pose(&self) -> Option<Position> {
        *self.pose.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the route if none has been received yet.
    ///
    /// Returns `Ok(true)` if this call set the route and `Ok(false)` if a route
    /// was already present.
    pub fn set_route_once(&self, waypoints: &[Position]) -> Result<bool> {
        self.route.build(waypoints)
    }

    /// The route index
    pub fn route(&self) -> &RouteIndex {
        &self.route
    }

    /// Replace the dynamic light observations.
    ///
    /// The list must line up index for index with the configured stop lines;
    /// a mismatched list is rejected and the previous snapshot kept.
    pub fn update_lights(&self, colors: Vec<LightColor>) -> Result<()> {
        if colors.len() != self.stop_lines.len() {
            warn!(
                "Rejecting light update with {} lights, {} stop lines configured",
                colors.len(),
                self.stop_lines.len()
            );
            return Err(DetectorError::LightCountMismatch {
                configured: self.stop_lines.len(),
                observed: colors.len(),
            });
        }

        debug!("Updated {} light observations", colors.len());
        let mut lights = self.lights.write().unwrap_or_else(PoisonError::into_inner);
        *lights = colors;
        Ok(())
    }

    /// Snapshot of the latest light observations
    pub fn lights(&self) -> Vec<LightColor> {
        self.lights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Statically configured traffic lights
    pub fn stop_lines(&self) -> &[TrafficLight] {
        &self.stop_lines
    }
}
