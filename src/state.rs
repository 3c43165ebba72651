use std::sync::Arc;

use crate::channels::ChannelDirectory;
use crate::registry::Registry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Connection registry: the only mutable shared state in the process
    pub registry: Arc<Registry>,
    /// Channel directory, read-only after startup
    pub channels: Arc<ChannelDirectory>,
}

impl AppState {
    pub fn new(channels: ChannelDirectory) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            channels: Arc::new(channels),
        }
    }
}
