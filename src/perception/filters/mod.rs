//! Filtering of noisy per-frame light observations

use crate::common::types::{WaypointIndex, NO_STOP_WAYPOINT};
use crate::perception::LightColor;

/// A generic filter interface
pub trait Filter<T> {
    /// Feed one input and get the filtered value back
    fn filter(&mut self, input: T) -> T;
}

/// Hysteresis state over observed light colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceState {
    /// Last color seen for at least `threshold` consecutive frames
    pub stable: LightColor,
    /// Color of the current run of identical observations
    pub pending: LightColor,
    /// Length of the current run
    pub pending_count: u32,
    /// Last value emitted on the stop waypoint signal
    pub last_published: Option<i32>,
}

impl DebounceState {
    /// Whether the current run is long enough to be trusted
    pub fn is_confirmed(&self, threshold: u32) -> bool {
        self.pending_count >= threshold
    }
}

/// Apply one observation to the debounce state.
///
/// A run of `threshold` identical observations promotes the run's color to
/// the stable color; any different observation starts a new run.
pub fn transition(state: DebounceState, observation: LightColor, threshold: u32) -> DebounceState {
    let mut next = state;

    if observation == state.pending {
        next.pending_count = state.pending_count.saturating_add(1);
    } else {
        next.pending = observation;
        next.pending_count = 1;
    }

    if next.is_confirmed(threshold) {
        next.stable = next.pending;
    }

    next
}

/// Debounces light colors and decides when the stop waypoint is republished
#[derive(Debug, Clone)]
pub struct StateDebouncer {
    threshold: u32,
    state: DebounceState,
}

impl StateDebouncer {
    /// Create a debouncer requiring `threshold` identical frames
    pub fn new(threshold: u32) -> Self {
        StateDebouncer {
            threshold: threshold.max(1),
            state: DebounceState::default(),
        }
    }

    /// Feed one frame's color and the stop waypoint of the light it belongs to.
    ///
    /// Returns the value to publish when the confirmed decision differs from
    /// what was last published: the stop waypoint for a red light, otherwise
    /// [`NO_STOP_WAYPOINT`].
    pub fn update(
        &mut self,
        observation: LightColor,
        stop_waypoint: Option<WaypointIndex>,
    ) -> Option<i32> {
        self.state = transition(self.state, observation, self.threshold);

        if !self.state.is_confirmed(self.threshold) {
            return None;
        }

        let value = if self.state.stable.requires_stop() {
            stop_waypoint
                .and_then(|wp| i32::try_from(wp).ok())
                .unwrap_or(NO_STOP_WAYPOINT)
        } else {
            NO_STOP_WAYPOINT
        };

        if self.state.last_published == Some(value) {
            return None;
        }

        self.state.last_published = Some(value);
        Some(value)
    }

    /// Current debounce state
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Frames required before a color change is accepted
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Forget everything seen so far
    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }
}

impl Filter<LightColor> for StateDebouncer {
    fn filter(&mut self, input: LightColor) -> LightColor {
        self.state = transition(self.state, input, self.threshold);
        self.state.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::LightColor::*;

    #[test]
    fn test_isolated_observation_does_not_promote() {
        let sequence = [Red, Red, Green, Red, Red, Red];
        let mut state = DebounceState::default();
        let mut stable = Vec::new();

        for color in sequence {
            state = transition(state, color, 3);
            stable.push(state.stable);
        }

        assert_eq!(stable, vec![Unknown, Unknown, Unknown, Unknown, Unknown, Red]);
        assert_eq!(state.pending_count, 3);
    }

    #[test]
    fn test_transition_resets_run_on_change() {
        let state = transition(DebounceState::default(), Green, 3);
        assert_eq!(state.pending, Green);
        assert_eq!(state.pending_count, 1);

        let state = transition(state, Yellow, 3);
        assert_eq!(state.pending, Yellow);
        assert_eq!(state.pending_count, 1);
        assert_eq!(state.stable, Unknown);
    }

    #[test]
    fn test_red_publishes_stop_waypoint_once() {
        let mut debouncer = StateDebouncer::new(3);

        assert_eq!(debouncer.update(Red, Some(292)), None);
        assert_eq!(debouncer.update(Red, Some(292)), None);
        assert_eq!(debouncer.update(Red, Some(292)), Some(292));
        assert_eq!(debouncer.update(Red, Some(292)), None);
        assert_eq!(debouncer.update(Red, Some(292)), None);
        assert_eq!(debouncer.state().last_published, Some(292));
    }

    #[test]
    fn test_green_after_red_clears_stop() {
        let mut debouncer = StateDebouncer::new(2);
        debouncer.update(Red, Some(40));
        assert_eq!(debouncer.update(Red, Some(40)), Some(40));

        assert_eq!(debouncer.update(Green, Some(40)), None);
        assert_eq!(debouncer.update(Green, Some(40)), Some(NO_STOP_WAYPOINT));
        assert_eq!(debouncer.update(Yellow, Some(40)), None);
        assert_eq!(debouncer.update(Yellow, Some(40)), None);
    }

    #[test]
    fn test_first_confirmed_no_stop_is_published() {
        let mut debouncer = StateDebouncer::new(3);
        assert_eq!(debouncer.update(Unknown, None), None);
        assert_eq!(debouncer.update(Unknown, None), None);
        assert_eq!(debouncer.update(Unknown, None), Some(NO_STOP_WAYPOINT));
        assert_eq!(debouncer.update(Unknown, None), None);
    }

    #[test]
    fn test_flicker_never_publishes() {
        let mut debouncer = StateDebouncer::new(3);
        for i in 0..20 {
            let color = if i % 2 == 0 { Red } else { Green };
            assert_eq!(debouncer.update(color, Some(7)), None);
        }
        assert_eq!(debouncer.state().stable, Unknown);
    }

    #[test]
    fn test_filter_and_reset() {
        let mut debouncer = StateDebouncer::new(2);
        assert_eq!(debouncer.filter(Green), Unknown);
        assert_eq!(debouncer.filter(Green), Green);

        debouncer.reset();
        assert_eq!(debouncer.state(), DebounceState::default());
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        assert_eq!(StateDebouncer::new(0).threshold(), 1);
    }
}
