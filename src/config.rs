//! Media configuration

/// Default capacity of the aggregate event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration options for a [`Media`](crate::Media) session
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Capacity of the broadcast channel behind [`Media::subscribe`](crate::Media::subscribe)
    ///
    /// Receivers that fall further behind than this lose the oldest events.
    pub event_capacity: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl MediaConfig {
    /// Set the event channel capacity (at least 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
