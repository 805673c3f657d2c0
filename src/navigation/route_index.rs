//! Static spatial index over the route waypoints
//!
//! The route is delivered once and never changes afterwards, so the index is
//! bulk-loaded into an R-tree a single time and then only queried. Building is
//! latched: the first non-empty route wins and every later build is a no-op.

use std::sync::OnceLock;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::{debug, info};

use crate::common::types::{Position, WaypointIndex};
use crate::error::{DetectorError, Result};

/// A waypoint position stored in the R-tree together with its route index
#[derive(Debug, Clone, Copy)]
struct IndexedWaypoint {
    position: [f64; 2],
    index: WaypointIndex,
}

impl RTreeObject for IndexedWaypoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedWaypoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The built index and the waypoint positions it was built from
struct BuiltRoute {
    tree: RTree<IndexedWaypoint>,
    positions: Vec<Position>,
}

/// Nearest-waypoint lookup over a route that is set at most once
#[derive(Default)]
pub struct RouteIndex {
    route: OnceLock<BuiltRoute>,
}

impl RouteIndex {
    /// Create an empty, unbuilt index
    pub fn new() -> Self {
        RouteIndex {
            route: OnceLock::new(),
        }
    }

    /// Build the index from the ordered route waypoints.
    ///
    /// Returns `Ok(true)` when this call populated the index and `Ok(false)`
    /// when a route was already present. An empty route is rejected and
    /// leaves the index unbuilt so a later delivery can still succeed.
    pub fn build(&self, waypoints: &[Position]) -> Result<bool> {
        if self.route.get().is_some() {
            debug!("Route index already built, ignoring {} waypoints", waypoints.len());
            return Ok(false);
        }

        if waypoints.is_empty() {
            return Err(DetectorError::InvalidRoute(
                "route contains no waypoints".to_string(),
            ));
        }

        if let Some((index, wp)) = waypoints
            .iter()
            .enumerate()
            .find(|(_, wp)| !wp.x.is_finite() || !wp.y.is_finite())
        {
            return Err(DetectorError::InvalidRoute(format!(
                "waypoint {} has non-finite position ({}, {})",
                index, wp.x, wp.y
            )));
        }

        let entries = waypoints
            .iter()
            .enumerate()
            .map(|(index, wp)| IndexedWaypoint {
                position: [wp.x, wp.y],
                index,
            })
            .collect();

        let built = BuiltRoute {
            tree: RTree::bulk_load(entries),
            positions: waypoints.to_vec(),
        };

        // Two producers may race here; whichever sets first owns the route.
        match self.route.set(built) {
            Ok(()) => {
                info!("Built route index with {} waypoints", waypoints.len());
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Index of the waypoint closest to `(x, y)`, lowest index on ties
    pub fn nearest(&self, x: f64, y: f64) -> Result<WaypointIndex> {
        let route = self.route.get().ok_or(DetectorError::IndexNotBuilt)?;

        if !x.is_finite() || !y.is_finite() {
            return Err(DetectorError::NonFinitePosition { x, y });
        }

        let query = [x, y];
        let mut neighbors = route.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_distance) = neighbors.next().ok_or(DetectorError::IndexNotBuilt)?;

        let closest = neighbors
            .take_while(|(_, distance)| *distance <= best_distance)
            .map(|(wp, _)| wp.index)
            .fold(first.index, usize::min);

        Ok(closest)
    }

    /// Nearest waypoint to a position
    pub fn nearest_to(&self, position: &Position) -> Result<WaypointIndex> {
        self.nearest(position.x, position.y)
    }

    /// Whether a route has been received
    pub fn is_built(&self) -> bool {
        self.route.get().is_some()
    }

    /// Number of waypoints in the route, zero before it is built
    pub fn len(&self) -> usize {
        self.route.get().map_or(0, |route| route.positions.len())
    }

    /// True until a route has been built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of a route waypoint
    pub fn position(&self, index: WaypointIndex) -> Option<Position> {
        self.route
            .get()
            .and_then(|route| route.positions.get(index).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::position;

    fn straight_route(n: usize) -> Vec<Position> {
        (0..n).map(|i| position(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_nearest_before_build_fails() {
        let index = RouteIndex::new();
        assert!(matches!(
            index.nearest(0.0, 0.0),
            Err(DetectorError::IndexNotBuilt)
        ));
        assert!(!index.is_built());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_empty_route_is_rejected_and_retryable() {
        let index = RouteIndex::new();
        assert!(matches!(
            index.build(&[]),
            Err(DetectorError::InvalidRoute(_))
        ));
        assert!(!index.is_built());

        assert!(index.build(&straight_route(3)).unwrap());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_non_finite_waypoint_is_rejected() {
        let index = RouteIndex::new();
        let route = vec![position(0.0, 0.0), position(f64::NAN, 1.0)];
        assert!(matches!(
            index.build(&route),
            Err(DetectorError::InvalidRoute(_))
        ));
        assert!(!index.is_built());
    }

    #[test]
    fn test_nearest_on_straight_route() {
        let index = RouteIndex::new();
        index.build(&straight_route(10)).unwrap();

        assert_eq!(index.nearest(3.2, 0.4).unwrap(), 3);
        assert_eq!(index.nearest(-5.0, 0.0).unwrap(), 0);
        assert_eq!(index.nearest(42.0, -1.0).unwrap(), 9);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let index = RouteIndex::new();
        index.build(&straight_route(4)).unwrap();

        // Exactly halfway between waypoints 1 and 2
        assert_eq!(index.nearest(1.5, 0.0).unwrap(), 1);

        let duplicated = RouteIndex::new();
        duplicated
            .build(&[position(5.0, 5.0), position(0.0, 0.0), position(0.0, 0.0)])
            .unwrap();
        assert_eq!(duplicated.nearest(0.1, 0.0).unwrap(), 1);
    }

    #[test]
    fn test_second_build_is_ignored() {
        let index = RouteIndex::new();
        assert!(index.build(&straight_route(5)).unwrap());

        let shifted: Vec<Position> = (0..5).map(|i| position(i as f64 + 100.0, 0.0)).collect();
        assert!(!index.build(&shifted).unwrap());

        assert_eq!(index.len(), 5);
        assert_eq!(index.nearest(101.0, 0.0).unwrap(), 4);
        assert_eq!(index.position(2), Some(position(2.0, 0.0)));
    }

    #[test]
    fn test_non_finite_query_is_rejected() {
        let index = RouteIndex::new();
        index.build(&straight_route(3)).unwrap();
        assert!(matches!(
            index.nearest(f64::INFINITY, 0.0),
            Err(DetectorError::NonFinitePosition { .. })
        ));
    }
}
