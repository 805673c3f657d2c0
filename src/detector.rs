//! Per-frame traffic light pipeline
//!
//! Each camera frame runs locate, classify, debounce and the publish decision
//! to completion against the latest context snapshot.

use tracing::{debug, info};

use crate::config::{DetectorConfig, StateSourceKind};
use crate::context::DetectorContext;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::perception::classifier::{StateSource, UnknownClassifier};
use crate::perception::filters::{DebounceState, StateDebouncer};
use crate::perception::locator::LightLocator;
use crate::perception::sensors::CameraFrame;
use crate::perception::{LightColor, LocatedLight};

/// Result of processing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The next light ahead, if one was found
    pub located: Option<LocatedLight>,
    /// Raw color fed into the debouncer
    pub observed: LightColor,
    /// Debounce state after this frame
    pub state: DebounceState,
    /// Stop waypoint to publish, present only when the value changed
    pub publish: Option<i32>,
}

/// Red light detector turning frames into stop waypoint updates
#[derive(Debug)]
pub struct TrafficLightDetector {
    base: LifecycleNodeBase,
    config: DetectorConfig,
    locator: LightLocator,
    debouncer: StateDebouncer,
    source: StateSource,
}

impl TrafficLightDetector {
    /// Create a detector with an explicit state source
    pub fn new(config: DetectorConfig, source: StateSource) -> Self {
        TrafficLightDetector {
            base: LifecycleNodeBase::new("tl_detector"),
            locator: locator_for(&config),
            debouncer: StateDebouncer::new(config.state_count_threshold),
            config,
            source,
        }
    }

    /// Create a detector whose state source follows the configuration
    pub fn from_config(config: DetectorConfig) -> Self {
        let source = match config.state_source {
            StateSourceKind::GroundTruth => StateSource::GroundTruth,
            StateSourceKind::Classifier => StateSource::classifier(UnknownClassifier),
        };
        TrafficLightDetector::new(config, source)
    }

    /// Process one camera frame.
    ///
    /// Returns `None` while the detector is not active. When no light is ahead
    /// the debouncer is fed an unknown color, so a stop clears once the light
    /// has been passed.
    pub fn process_frame(
        &mut self,
        ctx: &DetectorContext,
        frame: Option<&CameraFrame>,
    ) -> Option<FrameOutcome> {
        if !self.base.is_active() {
            debug!("Detector inactive, dropping frame");
            return None;
        }

        let located = self
            .locator
            .locate(ctx.pose(), ctx.route(), ctx.stop_lines());

        let observed = match &located {
            Some(light) => self.source.light_state(light, &ctx.lights(), frame),
            None => LightColor::Unknown,
        };

        let publish = self
            .debouncer
            .update(observed, located.map(|light| light.stop_waypoint));
        let state = self.debouncer.state();

        debug!(
            "Frame: light={:?} observed={:?} stable={:?} pending={:?}x{}",
            located.map(|light| light.light_index),
            observed,
            state.stable,
            state.pending,
            state.pending_count
        );

        if let Some(value) = publish {
            info!("Stop waypoint changed to {}", value);
        }

        Some(FrameOutcome {
            located,
            observed,
            state,
            publish,
        })
    }

    /// Current debounce state
    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Lifecycle state
    pub fn lifecycle_state(&self) -> State {
        self.base.get_state()
    }
}

fn locator_for(config: &DetectorConfig) -> LightLocator {
    LightLocator::new()
        .with_topology(config.route_topology)
        .with_max_lookahead(config.max_lookahead_waypoints)
}

impl LifecycleNode for TrafficLightDetector {
    fn on_configure(&mut self) -> Result<(), String> {
        info!(
            "Configuring {} with {} stop lines, threshold {}, state source {}",
            self.base.name,
            self.config.stop_line_positions.len(),
            self.config.state_count_threshold,
            self.source.name()
        );
        self.config.validate().map_err(|e| e.to_string())?;
        self.locator = locator_for(&self.config);
        self.debouncer = StateDebouncer::new(self.config.state_count_threshold);
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<(), String> {
        info!("Activating {}", self.base.name);
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<(), String> {
        info!("Deactivating {}", self.base.name);
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<(), String> {
        info!("Cleaning up {}", self.base.name);
        self.debouncer.reset();
        self.base.transition(State::Unconfigured)
    }
}
