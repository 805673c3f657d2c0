//! Common utilities and types for the traffic light detector

/// Common types and utilities used across the codebase
pub mod types {
    use nalgebra::Point2;

    /// A planar position in map coordinates
    pub type Position = Point2<f64>;

    /// Index of a waypoint along the route (0-based, route order)
    pub type WaypointIndex = usize;

    /// Value published on the stop waypoint signal when no stop is required
    pub const NO_STOP_WAYPOINT: i32 = -1;

    /// Build a position from raw coordinates
    pub fn position(x: f64, y: f64) -> Position {
        Point2::new(x, y)
    }
}
