//! Lifecycle management for detector components

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<(), String>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<(), String>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<(), String>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<(), String>;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Move to `to`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, to: State) -> Result<(), String> {
        let allowed = matches!(
            (self.state, to),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (_, State::Finalized)
        );

        if self.state == State::Finalized || !allowed {
            return Err(format!(
                "{}: invalid transition {:?} -> {:?}",
                self.name, self.state, to
            ));
        }

        self.state = to;
        Ok(())
    }

    /// Whether the node is processing input
    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }
}
