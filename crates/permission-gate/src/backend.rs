//! Permission backend trait and subscription handle

use crate::{MediaDeviceKind, PermissionError, PermissionState};

/// Listener invoked on every permission-state notification
pub type PermissionListener = Box<dyn Fn(PermissionState) + Send + Sync>;

/// Source of permission state and change notifications.
///
/// In the browser this wraps `navigator.permissions`; tests supply an
/// in-memory double.
pub trait PermissionBackend {
    /// Query the current permission state for a device
    fn query(&self, device: MediaDeviceKind) -> Result<PermissionState, PermissionError>;

    /// Subscribe to state changes for a device.
    ///
    /// The listener fires on every change notification. The returned watch
    /// unsubscribes on drop.
    fn subscribe(
        &self,
        device: MediaDeviceKind,
        listener: PermissionListener,
    ) -> Result<PermissionWatch, PermissionError>;
}

/// Handle to an active permission subscription.
///
/// Unsubscribes when dropped or when [`unsubscribe`](Self::unsubscribe) is
/// called; both paths are idempotent.
pub struct PermissionWatch {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PermissionWatch {
    /// Create a watch from an unsubscribe closure
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly unsubscribe; safe to call more than once
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for PermissionWatch {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for PermissionWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionWatch")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
