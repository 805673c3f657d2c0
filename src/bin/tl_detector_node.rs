use anyhow::{Context as _, Error, Result};
use rclrs::{
    Context, CreateBasicExecutor, Node, RclrsErrorFilter, SpinOptions, QOS_PROFILE_DEFAULT,
};
use std::sync::{Arc, Mutex};
use tl_detector::common::types::{position, Position};
use tl_detector::lifecycle::LifecycleNode;
use tl_detector::perception::sensors::CameraFrame;
use tl_detector::{DetectorConfig, DetectorContext, LightColor, TrafficLightDetector};
use tracing::{debug, error, info, warn};

// Import the message types directly from the crates
use builtin_interfaces::msg::Time;
use geometry_msgs::msg::PoseStamped;
use nav_msgs::msg::Path;
use sensor_msgs::msg::Image;
use std_msgs::msg::{Int32, Int32MultiArray};

const DEFAULT_CONFIG_PATH: &str = "config/tl_detector.yaml";

struct TlDetectorNode {
    detector: Mutex<TrafficLightDetector>,
    ctx: Arc<DetectorContext>,
    node: Arc<Node>,
    traffic_waypoint_publisher: Arc<rclrs::Publisher<Int32>>,
    pose_subscription: Mutex<Option<Arc<rclrs::Subscription<PoseStamped>>>>,
    route_subscription: Mutex<Option<Arc<rclrs::Subscription<Path>>>>,
    lights_subscription: Mutex<Option<Arc<rclrs::Subscription<Int32MultiArray>>>>,
    image_subscription: Mutex<Option<Arc<rclrs::Subscription<Image>>>>,
}

fn stamp_seconds(stamp: &Time) -> f64 {
    stamp.sec as f64 + stamp.nanosec as f64 * 1e-9
}

impl TlDetectorNode {
    pub fn new(executor: &rclrs::Executor, name: &str, config: DetectorConfig) -> Result<Arc<Self>> {
        let node = executor.create_node(name)?;
        let topics = config.topics.clone();

        info!(
            "Topics: pose={}, route={}, lights={}, image={}, traffic_waypoint={}",
            topics.pose, topics.route, topics.lights, topics.image, topics.traffic_waypoint
        );

        let ctx = Arc::new(DetectorContext::from_config(&config));
        let mut detector = TrafficLightDetector::from_config(config);
        detector.on_configure().map_err(Error::msg)?;
        detector.on_activate().map_err(Error::msg)?;

        let traffic_waypoint_publisher =
            node.create_publisher::<Int32>(&topics.traffic_waypoint, QOS_PROFILE_DEFAULT)?;

        let tl_node = Arc::new(TlDetectorNode {
            detector: Mutex::new(detector),
            ctx,
            node,
            traffic_waypoint_publisher,
            pose_subscription: None.into(),
            route_subscription: None.into(),
            lights_subscription: None.into(),
            image_subscription: None.into(),
        });

        let tl_node_clone = Arc::clone(&tl_node);
        let pose_subscription = tl_node.node.create_subscription::<PoseStamped, _>(
            &topics.pose,
            QOS_PROFILE_DEFAULT,
            move |msg: PoseStamped| {
                tl_node_clone.pose_callback(msg);
            },
        )?;
        *lock(&tl_node.pose_subscription) = Some(pose_subscription);

        let tl_node_clone = Arc::clone(&tl_node);
        let route_subscription = tl_node.node.create_subscription::<Path, _>(
            &topics.route,
            QOS_PROFILE_DEFAULT,
            move |msg: Path| {
                tl_node_clone.route_callback(msg);
            },
        )?;
        *lock(&tl_node.route_subscription) = Some(route_subscription);

        let tl_node_clone = Arc::clone(&tl_node);
        let lights_subscription = tl_node.node.create_subscription::<Int32MultiArray, _>(
            &topics.lights,
            QOS_PROFILE_DEFAULT,
            move |msg: Int32MultiArray| {
                tl_node_clone.lights_callback(msg);
            },
        )?;
        *lock(&tl_node.lights_subscription) = Some(lights_subscription);

        let tl_node_clone = Arc::clone(&tl_node);
        let image_subscription = tl_node.node.create_subscription::<Image, _>(
            &topics.image,
            QOS_PROFILE_DEFAULT,
            move |msg: Image| {
                tl_node_clone.image_callback(msg);
            },
        )?;
        *lock(&tl_node.image_subscription) = Some(image_subscription);

        Ok(tl_node)
    }

    fn pose_callback(&self, msg: PoseStamped) {
        let x = msg.pose.position.x;
        let y = msg.pose.position.y;
        self.ctx.update_pose(x, y);
        debug!(
            "Pose at t={:.3}: x={:.2}, y={:.2}",
            stamp_seconds(&msg.header.stamp),
            x,
            y
        );
    }

    fn route_callback(&self, msg: Path) {
        let waypoints: Vec<Position> = msg
            .poses
            .iter()
            .map(|pose| position(pose.pose.position.x, pose.pose.position.y))
            .collect();

        match self.ctx.set_route_once(&waypoints) {
            Ok(true) => info!("Received route with {} waypoints", waypoints.len()),
            Ok(false) => debug!("Route already set, ignoring new route"),
            Err(e) => warn!("Ignoring route: {}", e),
        }
    }

    fn lights_callback(&self, msg: Int32MultiArray) {
        let colors = msg.data.iter().map(|code| LightColor::from_code(*code)).collect();
        if let Err(e) = self.ctx.update_lights(colors) {
            error!("Light feed does not match configuration: {}", e);
        }
    }

    fn image_callback(&self, msg: Image) {
        let frame = CameraFrame::new(msg.width, msg.height, &msg.encoding, msg.data);

        let outcome = lock(&self.detector).process_frame(&self.ctx, Some(&frame));

        if let Some(value) = outcome.and_then(|outcome| outcome.publish) {
            let mut traffic_waypoint = Int32::default();
            traffic_waypoint.data = value;
            if let Err(e) = self.traffic_waypoint_publisher.publish(&traffic_waypoint) {
                error!("Failed to publish traffic waypoint: {}", e);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Drop for TlDetectorNode {
    fn drop(&mut self) {
        let detector = self
            .detector
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = detector.on_deactivate() {
            warn!("{}", e);
        }
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tl_detector=info,tl_detector_node=info".into()),
        )
        .init();

    let config_path =
        std::env::var("TL_DETECTOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = DetectorConfig::load(&config_path)
        .with_context(|| format!("loading traffic light config from {}", config_path))?;
    info!(
        "Loaded {} stop lines from {}",
        config.stop_line_positions.len(),
        config_path
    );

    let mut executor = Context::default_from_env()?.create_basic_executor();

    let _tl_detector_node = TlDetectorNode::new(&executor, "tl_detector", config)?;

    info!("Traffic light detector initialized. Starting to spin...");

    executor
        .spin(SpinOptions::default())
        .first_error()
        .map_err(|err| err.into())
}
