//! Shared SDK context.

use std::sync::Arc;

use ferry_core::transceiver::DataTransceiver;
use ferry_core::transport::Transport;

use crate::config::CoreConfig;

/// Configuration plus the transceiver operations submit through.
///
/// `Core` is the explicit replacement for process-global SDK state: build
/// one during application startup and hand clones to whoever executes
/// operations. Clones are cheap and share the same transceiver, so all
/// operations of one context go through a single submission path.
#[derive(Debug, Clone)]
pub struct Core {
    inner: Arc<CoreInner>,
}

#[derive(Debug)]
struct CoreInner {
    config: CoreConfig,
    transceiver: DataTransceiver,
}

impl Core {
    /// Builds a context around `transport`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; the transceiver runs
    /// exchanges on the current runtime. Use
    /// [`with_transceiver`](Self::with_transceiver) from non-async setup
    /// code.
    #[must_use]
    pub fn new(config: CoreConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_transceiver(config, DataTransceiver::new(transport))
    }

    /// Builds a context around an existing transceiver.
    #[must_use]
    pub fn with_transceiver(config: CoreConfig, transceiver: DataTransceiver) -> Self {
        Self {
            inner: Arc::new(CoreInner {
                config,
                transceiver,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Base URL operations resolve endpoints against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    #[must_use]
    pub fn transceiver(&self) -> &DataTransceiver {
        &self.inner.transceiver
    }
}
