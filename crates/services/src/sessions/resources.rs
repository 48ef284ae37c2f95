use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::SessionError;

/// Exclusive claim on the camera and vision model.
///
/// At most one [`ResourceLease`] exists per slot. The holder must release the
/// camera and close the model before dropping the lease.
#[derive(Clone, Debug, Default)]
pub struct ResourceSlot {
    inner: Arc<Mutex<()>>,
}

/// Proof of exclusive ownership; dropping it frees the slot.
#[derive(Debug)]
pub struct ResourceLease {
    _guard: OwnedMutexGuard<()>,
}

impl ResourceSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot without waiting.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ResourceBusy` while another lease is alive.
    pub fn try_acquire(&self) -> Result<ResourceLease, SessionError> {
        let guard = Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| SessionError::ResourceBusy)?;
        debug!("camera and model slot acquired");
        Ok(ResourceLease { _guard: guard })
    }

    /// Waits until the previous holder has finished its teardown.
    pub async fn acquire(&self) -> ResourceLease {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        debug!("camera and model slot acquired");
        ResourceLease { _guard: guard }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
