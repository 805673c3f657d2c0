//! Route handling for the traffic light detector
pub mod route_index;

pub use self::route_index::RouteIndex;
