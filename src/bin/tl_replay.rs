use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tl_detector::common::types::{position, Position};
use tl_detector::lifecycle::LifecycleNode;
use tl_detector::{DetectorConfig, DetectorContext, LightColor, TrafficLightDetector};
use tokio::time;
use tracing::{info, warn};

/// Replay a synthetic drive through the traffic light detector
#[derive(Parser, Debug)]
#[command(name = "tl_replay", version)]
struct Args {
    /// Detector configuration; a built-in scenario is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of camera frames to process
    #[arg(short, long, default_value_t = 300)]
    frames: usize,

    /// Waypoints in the synthetic straight route
    #[arg(long, default_value_t = 200)]
    route_len: usize,

    /// Milliseconds between camera frames
    #[arg(long, default_value_t = 5)]
    frame_interval_ms: u64,

    /// Override the debounce threshold
    #[arg(long)]
    threshold: Option<u32>,
}

fn default_config() -> DetectorConfig {
    DetectorConfig::with_stop_lines(vec![[50.0, 1.5], [120.0, -1.5], [180.0, 1.5]])
}

/// Color of light `index` at tick `tick`: red 40, green 30, yellow 10
fn light_color(index: usize, tick: usize) -> LightColor {
    match (tick + index * 25) % 80 {
        0..=39 => LightColor::Red,
        40..=69 => LightColor::Green,
        _ => LightColor::Yellow,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tl_detector=info,tl_replay=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => default_config(),
    };
    if let Some(threshold) = args.threshold {
        config.state_count_threshold = threshold;
    }

    let ctx = Arc::new(DetectorContext::from_config(&config));
    let light_count = ctx.stop_lines().len();
    let route: Vec<Position> = (0..args.route_len)
        .map(|i| position(i as f64, 0.0))
        .collect();

    let mut detector = TrafficLightDetector::from_config(config);
    detector
        .on_configure()
        .map_err(anyhow::Error::msg)
        .context("configuring detector")?;
    detector.on_activate().map_err(anyhow::Error::msg)?;

    let tick = Duration::from_millis(args.frame_interval_ms.max(1));

    // The route shows up late and twice; only the first delivery counts.
    let route_task = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            time::sleep(tick * 5).await;
            for delivery in 0..2 {
                match ctx.set_route_once(&route) {
                    Ok(true) => info!("Route delivered ({} waypoints)", route.len()),
                    Ok(false) => info!("Route delivery {} ignored", delivery),
                    Err(e) => warn!("Route rejected: {}", e),
                }
            }
        })
    };

    let pose_task = {
        let ctx = Arc::clone(&ctx);
        let frames = args.frames;
        let route_len = args.route_len as f64;
        tokio::spawn(async move {
            let mut interval = time::interval(tick);
            for step in 0..frames {
                interval.tick().await;
                let x = (step as f64 * 0.5).min(route_len - 1.0);
                ctx.update_pose(x, 0.2);
            }
        })
    };

    let lights_task = {
        let ctx = Arc::clone(&ctx);
        let frames = args.frames;
        tokio::spawn(async move {
            let mut interval = time::interval(tick);
            for step in 0..frames {
                interval.tick().await;
                let colors = (0..light_count).map(|i| light_color(i, step)).collect();
                if let Err(e) = ctx.update_lights(colors) {
                    warn!("Light update rejected: {}", e);
                }
            }
        })
    };

    let mut published = Vec::new();
    let mut interval = time::interval(tick);
    for frame in 0..args.frames {
        interval.tick().await;
        if let Some(outcome) = detector.process_frame(&ctx, None) {
            if let Some(value) = outcome.publish {
                println!("frame {:4}: /traffic_waypoint <- {}", frame, value);
                published.push((frame, value));
            }
        }
    }

    route_task.await?;
    pose_task.await?;
    lights_task.await?;

    detector.on_deactivate().map_err(anyhow::Error::msg)?;
    detector.on_cleanup().map_err(anyhow::Error::msg)?;

    println!(
        "Processed {} frames, published {} stop waypoint updates",
        args.frames,
        published.len()
    );
    Ok(())
}
