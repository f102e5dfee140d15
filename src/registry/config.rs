//! Registry tuning knobs

use std::time::Duration;

/// Tunables for queue bounds and metadata waits
///
/// The defaults match the production relay; tests shrink them to keep
/// backpressure and timeout scenarios fast.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each channel's signal mailbox
    pub signal_capacity: usize,

    /// Capacity of each client's outgoing packet queue
    pub client_queue_capacity: usize,

    /// Capacity of each client's signal mailbox
    pub client_signal_capacity: usize,

    /// Polls before a codec/session wait gives up
    pub wait_attempts: u32,

    /// Delay between codec/session wait polls
    pub wait_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            signal_capacity: 100,
            client_queue_capacity: 1000,
            client_signal_capacity: 10,
            wait_attempts: 100,
            wait_interval: Duration::from_millis(50),
        }
    }
}

impl RegistryConfig {
    /// Set the channel signal mailbox capacity
    pub fn signal_capacity(mut self, capacity: usize) -> Self {
        self.signal_capacity = capacity;
        self
    }

    /// Set the per-client outgoing queue capacity
    pub fn client_queue_capacity(mut self, capacity: usize) -> Self {
        self.client_queue_capacity = capacity;
        self
    }

    /// Set the per-client signal mailbox capacity
    pub fn client_signal_capacity(mut self, capacity: usize) -> Self {
        self.client_signal_capacity = capacity;
        self
    }

    /// Set the codec/session wait bound
    pub fn wait_attempts(mut self, attempts: u32) -> Self {
        self.wait_attempts = attempts;
        self
    }

    /// Set the delay between codec/session wait polls
    pub fn wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.signal_capacity, 100);
        assert_eq!(config.client_queue_capacity, 1000);
        assert_eq!(config.client_signal_capacity, 10);
        assert_eq!(config.wait_attempts, 100);
        assert_eq!(config.wait_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .signal_capacity(4)
            .client_queue_capacity(2)
            .client_signal_capacity(1)
            .wait_attempts(3)
            .wait_interval(Duration::from_millis(5));

        assert_eq!(config.signal_capacity, 4);
        assert_eq!(config.client_queue_capacity, 2);
        assert_eq!(config.client_signal_capacity, 1);
        assert_eq!(config.wait_attempts, 3);
        assert_eq!(config.wait_interval, Duration::from_millis(5));
    }
}
