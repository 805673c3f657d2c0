//! Selection of the next traffic light ahead of the vehicle

use tracing::debug;

use super::{LocatedLight, TrafficLight};
use crate::common::types::{Position, WaypointIndex};
use crate::config::RouteTopology;
use crate::error::Result;
use crate::navigation::RouteIndex;

/// Finds the closest stop line ahead of the vehicle along the route
#[derive(Debug, Clone, Copy, Default)]
pub struct LightLocator {
    topology: RouteTopology,
    max_lookahead: Option<usize>,
}

impl LightLocator {
    /// Create a locator for an open route with unbounded lookahead
    pub fn new() -> Self {
        LightLocator::default()
    }

    /// Set how forward distance is measured at the end of the route
    pub fn with_topology(mut self, topology: RouteTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Ignore lights further ahead than `waypoints`
    pub fn with_max_lookahead(mut self, waypoints: Option<usize>) -> Self {
        self.max_lookahead = waypoints;
        self
    }

    /// Locate the next light ahead of `vehicle`.
    ///
    /// Returns `None` when there is no pose yet, the route has not arrived, or
    /// no stop line lies at or ahead of the vehicle.
    pub fn locate(
        &self,
        vehicle: Option<Position>,
        route: &RouteIndex,
        lights: &[TrafficLight],
    ) -> Option<LocatedLight> {
        let vehicle = match vehicle {
            Some(vehicle) => vehicle,
            None => {
                debug!("No vehicle pose yet, skipping light search");
                return None;
            }
        };

        match self.try_locate(&vehicle, route, lights) {
            Ok(located) => located,
            Err(e) => {
                debug!("Skipping light search: {}", e);
                None
            }
        }
    }

    fn try_locate(
        &self,
        vehicle: &Position,
        route: &RouteIndex,
        lights: &[TrafficLight],
    ) -> Result<Option<LocatedLight>> {
        let car_wp = route.nearest_to(vehicle)?;
        let route_len = route.len();

        let mut closest: Option<LocatedLight> = None;
        for light in lights {
            let line_wp = route.nearest_to(&light.stop_line)?;

            let distance = match self.forward_distance(car_wp, line_wp, route_len) {
                Some(distance) => distance,
                None => continue,
            };

            if self.max_lookahead.is_some_and(|max| distance > max) {
                continue;
            }

            // Strict comparison keeps the earlier light on equal distance
            if closest.map_or(true, |best| distance < best.distance) {
                closest = Some(LocatedLight {
                    stop_waypoint: line_wp,
                    light_index: light.index,
                    distance,
                });
            }
        }

        if let Some(located) = closest {
            debug!(
                "Car at waypoint {}, next light {} stops at waypoint {} ({} ahead)",
                car_wp, located.light_index, located.stop_waypoint, located.distance
            );
        }

        Ok(closest)
    }

    /// Waypoints from `car_wp` forward to `line_wp`, or `None` if behind
    fn forward_distance(
        &self,
        car_wp: WaypointIndex,
        line_wp: WaypointIndex,
        route_len: usize,
    ) -> Option<usize> {
        let distance = match self.topology {
            RouteTopology::Open => line_wp.checked_sub(car_wp)?,
            RouteTopology::Closed => (line_wp + route_len - car_wp) % route_len,
        };

        (distance < route_len).then_some(distance)
    }
}
