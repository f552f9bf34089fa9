//! Bridge configuration.

use cadlink_engine::ReconcileOptions;
use cadlink_protocol::DEFAULT_MAX_FRAME_LEN;
use std::time::Duration;

/// Configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Timeout for establishing a session connection.
    pub connect_timeout: Duration,
    /// Read timeout on session sockets. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout on session sockets. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
    /// Whether `TCP_NODELAY` is set on session sockets.
    pub nodelay: bool,
    /// Maximum payload length of an incoming frame.
    pub max_frame_len: usize,
    /// How queries are applied to the document.
    pub reconcile: ReconcileOptions,
}

impl BridgeConfig {
    /// Creates a bridge configuration with default values.
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            reconcile: ReconcileOptions::default(),
        }
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets whether `TCP_NODELAY` is enabled.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Sets the maximum incoming frame length.
    pub fn with_max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max;
        self
    }

    /// Sets the reconciliation options.
    pub fn with_reconcile(mut self, options: ReconcileOptions) -> Self {
        self.reconcile = options;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BridgeConfig::default();
        assert!(config.nodelay);
        assert_eq!(config.max_frame_len, DEFAULT_MAX_FRAME_LEN);
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn config_builder() {
        let config = BridgeConfig::new()
            .with_connect_timeout(Duration::from_millis(250))
            .with_read_timeout(Some(Duration::from_secs(5)))
            .with_nodelay(false)
            .with_max_frame_len(1024)
            .with_reconcile(ReconcileOptions::new().with_link_groups(false));

        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
        assert!(!config.nodelay);
        assert_eq!(config.max_frame_len, 1024);
        assert!(!config.reconcile.link_groups);
    }
}
