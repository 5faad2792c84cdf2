//! Dependencies shared by every screen reducer.

use crate::resource::AppBus;
use larder_client::Gateway;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Environment for list, workflow and screen reducers.
///
/// Cheap to clone: the gateway is shared and the bus is a handle.
#[derive(Clone)]
pub struct AppEnvironment {
    /// The pantry service
    pub gateway: Arc<dyn Gateway>,
    /// Where successful writes are announced
    pub bus: AppBus,
    /// Lifetime of transient notices
    pub notice_ttl: Duration,
}

impl AppEnvironment {
    /// Create an environment.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, bus: AppBus, notice_ttl: Duration) -> Self {
        Self {
            gateway,
            bus,
            notice_ttl,
        }
    }
}

impl fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("bus", &self.bus)
            .field("notice_ttl", &self.notice_ttl)
            .finish_non_exhaustive()
    }
}
