//! Loader configuration.

use std::time::Duration;

/// What closes a loader's batch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The window's first caller yields to the executor this many times,
    /// giving concurrently scheduled callers a chance to enqueue keys.
    Yield(usize),
    /// The window's first caller sleeps for this long.
    Delay(Duration),
    /// Only [`Loader::dispatch`](crate::Loader::dispatch) or a full window
    /// closes the batch.
    Manual,
}

/// Batching knobs shared by every loader of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub trigger: Trigger,
    /// Distinct keys at which a window closes immediately.
    pub max_batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            trigger: Trigger::Yield(10),
            max_batch_size: 1000,
        }
    }
}

impl LoaderConfig {
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_yield_count(self, yield_count: usize) -> Self {
        self.with_trigger(Trigger::Yield(yield_count))
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_trigger(Trigger::Delay(delay))
    }

    /// Values below 1 are treated as 1.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = LoaderConfig::default()
            .with_delay(Duration::from_millis(1))
            .with_max_batch_size(0);
        assert_eq!(Trigger::Delay(Duration::from_millis(1)), config.trigger);
        assert_eq!(1, config.max_batch_size);

        let config = config.with_yield_count(3);
        assert_eq!(Trigger::Yield(3), config.trigger);
    }
}
