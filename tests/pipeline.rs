//! End-to-end scenarios through the detector pipeline

use tl_detector::common::types::{position, Position, NO_STOP_WAYPOINT};
use tl_detector::config::RouteTopology;
use tl_detector::lifecycle::LifecycleNode;
use tl_detector::perception::classifier::{LightClassifier, StateSource};
use tl_detector::perception::sensors::CameraFrame;
use tl_detector::{DetectorConfig, DetectorContext, LightColor, TrafficLightDetector};

use tl_detector::LightColor::*;

fn straight_route(n: usize) -> Vec<Position> {
    (0..n).map(|i| position(i as f64, 0.0)).collect()
}

fn active(detector: &mut TrafficLightDetector) {
    detector.on_configure().unwrap();
    detector.on_activate().unwrap();
}

fn run(detector: &mut TrafficLightDetector, ctx: &DetectorContext, frames: usize) -> Vec<i32> {
    (0..frames)
        .filter_map(|_| detector.process_frame(ctx, None).and_then(|o| o.publish))
        .collect()
}

#[test]
fn test_selects_light_ahead_not_behind() {
    let config = DetectorConfig::with_stop_lines(vec![[1.0, 0.0], [5.0, 0.0], [8.0, 0.0]]);
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::from_config(config);
    active(&mut detector);

    ctx.set_route_once(&straight_route(10)).unwrap();
    ctx.update_pose(3.0, 0.0);
    ctx.update_lights(vec![Red, Red, Red]).unwrap();

    let outcome = detector.process_frame(&ctx, None).unwrap();
    let located = outcome.located.unwrap();
    assert_eq!(located.stop_waypoint, 5);
    assert_eq!(located.light_index, 1);
}

#[test]
fn test_debounced_sequence_promotes_on_sixth_frame() {
    let config = DetectorConfig::with_stop_lines(vec![[5.0, 0.0]]);
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::from_config(config);
    active(&mut detector);

    ctx.set_route_once(&straight_route(10)).unwrap();
    ctx.update_pose(3.0, 0.0);

    let mut published = Vec::new();
    for color in [Red, Red, Green, Red, Red, Red] {
        ctx.update_lights(vec![color]).unwrap();
        published.push(detector.process_frame(&ctx, None).unwrap().publish);
    }

    assert_eq!(published, vec![None, None, None, None, None, Some(5)]);
    assert_eq!(detector.debounce_state().stable, Red);
}

#[test]
fn test_drive_through_red_then_clear() {
    let config = DetectorConfig::with_stop_lines(vec![[20.0, 2.0], [60.0, -2.0]]);
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::from_config(config);
    active(&mut detector);

    ctx.set_route_once(&straight_route(100)).unwrap();
    ctx.update_lights(vec![Red, Green]).unwrap();

    ctx.update_pose(10.0, 0.0);
    assert_eq!(run(&mut detector, &ctx, 5), vec![20]);

    // Light turns green, the stop is lifted once
    ctx.update_lights(vec![Green, Green]).unwrap();
    assert_eq!(run(&mut detector, &ctx, 5), vec![NO_STOP_WAYPOINT]);

    // Past the first light the next one is red
    ctx.update_lights(vec![Green, Red]).unwrap();
    ctx.update_pose(30.0, 0.0);
    assert_eq!(run(&mut detector, &ctx, 5), vec![60]);

    // Past every light: unknown, stop cleared
    ctx.update_pose(90.0, 0.0);
    assert_eq!(run(&mut detector, &ctx, 5), vec![NO_STOP_WAYPOINT]);
}

#[test]
fn test_startup_gaps_are_tolerated() {
    let config = DetectorConfig::with_stop_lines(vec![[5.0, 0.0]]);
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::from_config(config);
    active(&mut detector);

    // No route, no pose, no lights yet
    assert_eq!(run(&mut detector, &ctx, 3), vec![NO_STOP_WAYPOINT]);

    ctx.update_lights(vec![Red]).unwrap();
    ctx.update_pose(1.0, 0.0);
    assert!(run(&mut detector, &ctx, 3).is_empty());

    ctx.set_route_once(&straight_route(10)).unwrap();
    assert_eq!(run(&mut detector, &ctx, 3), vec![5]);
}

#[test]
fn test_closed_route_sees_light_past_the_end() {
    let mut config = DetectorConfig::with_stop_lines(vec![[2.0, 0.0]]);
    config.route_topology = RouteTopology::Closed;
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::from_config(config);
    active(&mut detector);

    ctx.set_route_once(&straight_route(10)).unwrap();
    ctx.update_pose(9.0, 0.0);
    ctx.update_lights(vec![Red]).unwrap();

    assert_eq!(run(&mut detector, &ctx, 3), vec![2]);
}

#[derive(Debug)]
struct RedDominance;

impl LightClassifier for RedDominance {
    fn classify(&self, frame: &CameraFrame) -> LightColor {
        let red = frame.data.iter().step_by(3).filter(|v| **v > 200).count();
        if red * 2 > frame.data.len() / 3 {
            Red
        } else {
            Green
        }
    }

    fn name(&self) -> &str {
        "RedDominance"
    }
}

#[test]
fn test_classifier_source_uses_camera_frames() {
    let config = DetectorConfig::with_stop_lines(vec![[5.0, 0.0]]);
    let ctx = DetectorContext::from_config(&config);
    let mut detector = TrafficLightDetector::new(config, StateSource::classifier(RedDominance));
    active(&mut detector);

    ctx.set_route_once(&straight_route(10)).unwrap();
    ctx.update_pose(0.0, 0.0);

    let red_frame = CameraFrame::new(2, 1, "rgb8", vec![255, 0, 0, 250, 10, 10]);
    let published: Vec<i32> = (0..3)
        .filter_map(|_| {
            detector
                .process_frame(&ctx, Some(&red_frame))
                .and_then(|o| o.publish)
        })
        .collect();
    assert_eq!(published, vec![5]);
}

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/tl_detector.yaml");
    let config = DetectorConfig::load(path).unwrap();
    assert_eq!(config.stop_line_positions.len(), 8);
    assert_eq!(config.route_topology, RouteTopology::Closed);
}
