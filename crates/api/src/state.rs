use std::sync::Arc;

use finsight_core::artifacts::ArtifactStore;
use finsight_db::JobStore;
use finsight_queue::QueueTransport;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via
/// `State<AppState>`. Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Single source of truth for job state.
    pub store: Arc<dyn JobStore>,
    /// Dispatch message broker.
    pub transport: Arc<dyn QueueTransport>,
    /// Staged upload / output artifact storage.
    pub artifacts: Arc<ArtifactStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
