use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    core::{SupervisorConfig, supervisor::Supervisor},
    events::Bus,
    subscribers::Subscribe,
};

/// Builder for constructing a [`Supervisor`] with optional features.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            parent: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (unit lifecycle, failures, shutdown)
    /// through dedicated workers with bounded queues. Workers are spawned by
    /// [`Supervisor::start`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Ties the group to an outer token.
    ///
    /// Cancelling `parent` after start stops the group as if
    /// [`Supervisor::stop`] was called. Stopping the group never cancels `parent`.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the [`Supervisor`] in the `Ready` state.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Supervisor::from_parts(self.cfg, bus, token, self.subscribers)
    }
}
