//! Per-device and combined permission gates

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::backend::{PermissionBackend, PermissionWatch};
use crate::{MediaDeviceKind, PermissionState};

fn read_state(state: &Mutex<PermissionState>) -> PermissionState {
    *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_state(state: &Mutex<PermissionState>, next: PermissionState) {
    *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
}

/// Reactive boolean mirror of one device's permission state.
///
/// Queries the backend once at mount and then tracks change notifications
/// until unmounted. A failing backend leaves access `false`; it never takes
/// the host page down.
pub struct PermissionGate {
    device: MediaDeviceKind,
    state: Arc<Mutex<PermissionState>>,
    watch: Option<PermissionWatch>,
}

impl PermissionGate {
    /// Mount a gate for one device
    pub fn mount(backend: &dyn PermissionBackend, device: MediaDeviceKind) -> Self {
        let state = Arc::new(Mutex::new(PermissionState::Unknown));

        match backend.query(device) {
            Ok(current) => {
                debug!("initial {} permission: {:?}", device.as_str(), current);
                write_state(&state, current);
            }
            Err(e) => {
                warn!("{} permission query failed: {}", device.as_str(), e);
            }
        }

        let shared = Arc::clone(&state);
        let watch = match backend.subscribe(
            device,
            Box::new(move |next| write_state(&shared, next)),
        ) {
            Ok(watch) => Some(watch),
            Err(e) => {
                warn!("{} permission subscription failed: {}", device.as_str(), e);
                None
            }
        };

        Self {
            device,
            state,
            watch,
        }
    }

    /// Device this gate mirrors
    pub fn device(&self) -> MediaDeviceKind {
        self.device
    }

    /// Last observed permission state
    pub fn state(&self) -> PermissionState {
        read_state(&self.state)
    }

    /// Whether access is currently granted
    pub fn granted(&self) -> bool {
        self.state().is_granted()
    }

    /// Stop tracking changes; safe to call more than once
    pub fn unmount(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.unsubscribe();
        }
    }
}

impl Drop for PermissionGate {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Combined camera + microphone gate
pub struct MediaPermissions {
    camera: PermissionGate,
    microphone: PermissionGate,
}

impl MediaPermissions {
    /// Mount gates for both media devices
    pub fn mount(backend: &dyn PermissionBackend) -> Self {
        Self {
            camera: PermissionGate::mount(backend, MediaDeviceKind::Camera),
            microphone: PermissionGate::mount(backend, MediaDeviceKind::Microphone),
        }
    }

    /// Whether camera access is granted
    pub fn has_camera_access(&self) -> bool {
        self.camera.granted()
    }

    /// Whether microphone access is granted
    pub fn has_microphone_access(&self) -> bool {
        self.microphone.granted()
    }

    /// Whether both devices are granted
    pub fn all_granted(&self) -> bool {
        self.has_camera_access() && self.has_microphone_access()
    }

    /// Stop tracking both devices
    pub fn unmount(&mut self) {
        self.camera.unmount();
        self.microphone.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PermissionListener;
    use crate::PermissionError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// In-memory permissions backend with manual change notification
    #[derive(Default)]
    struct FakeBackend {
        states: Mutex<HashMap<MediaDeviceKind, PermissionState>>,
        listeners: Arc<Mutex<HashMap<u64, (MediaDeviceKind, PermissionListener)>>>,
        next_id: AtomicU64,
        fail_queries: bool,
    }

    impl FakeBackend {
        fn set(&self, device: MediaDeviceKind, state: PermissionState) {
            self.states
                .lock()
                .unwrap()
                .insert(device, state);
        }

        /// Push a change notification to subscribed listeners
        fn notify(&self, device: MediaDeviceKind, state: PermissionState) {
            self.set(device, state);
            let listeners = self.listeners.lock().unwrap();
            for (_, (dev, listener)) in listeners.iter() {
                if *dev == device {
                    listener(state);
                }
            }
        }

        fn listener_count(&self) -> usize {
            self.listeners.lock().unwrap().len()
        }
    }

    impl PermissionBackend for FakeBackend {
        fn query(
            &self,
            device: MediaDeviceKind,
        ) -> Result<PermissionState, PermissionError> {
            if self.fail_queries {
                return Err(PermissionError::Unsupported("no permissions API".into()));
            }
            Ok(self
                .states
                .lock()
                .unwrap()
                .get(&device)
                .copied()
                .unwrap_or_default())
        }

        fn subscribe(
            &self,
            device: MediaDeviceKind,
            listener: PermissionListener,
        ) -> Result<PermissionWatch, PermissionError> {
            if self.fail_queries {
                return Err(PermissionError::Unsupported("no permissions API".into()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.listeners
                .lock()
                .unwrap()
                .insert(id, (device, listener));
            let registry = Arc::clone(&self.listeners);
            Ok(PermissionWatch::new(move || {
                registry.lock().unwrap().remove(&id);
            }))
        }
    }

    #[test]
    fn test_gate_mirrors_initial_state() {
        let backend = FakeBackend::default();
        backend.set(MediaDeviceKind::Camera, PermissionState::Granted);

        let gate = PermissionGate::mount(&backend, MediaDeviceKind::Camera);
        assert!(gate.granted());

        let mic = PermissionGate::mount(&backend, MediaDeviceKind::Microphone);
        assert!(!mic.granted());
        assert_eq!(mic.state(), PermissionState::Unknown);
    }

    #[test]
    fn test_gate_tracks_changes() {
        let backend = FakeBackend::default();
        backend.set(MediaDeviceKind::Camera, PermissionState::Prompt);

        let gate = PermissionGate::mount(&backend, MediaDeviceKind::Camera);
        assert!(!gate.granted());

        backend.notify(MediaDeviceKind::Camera, PermissionState::Granted);
        assert!(gate.granted());

        backend.notify(MediaDeviceKind::Camera, PermissionState::Denied);
        assert!(!gate.granted());
    }

    #[test]
    fn test_unmount_stops_tracking() {
        let backend = FakeBackend::default();
        backend.set(MediaDeviceKind::Camera, PermissionState::Granted);

        let mut gate = PermissionGate::mount(&backend, MediaDeviceKind::Camera);
        assert_eq!(backend.listener_count(), 1);

        gate.unmount();
        gate.unmount();
        assert_eq!(backend.listener_count(), 0);

        // Stale notifications no longer reach the gate
        backend.notify(MediaDeviceKind::Camera, PermissionState::Denied);
        assert!(gate.granted());
    }

    #[test]
    fn test_failing_backend_leaves_access_false() {
        let backend = FakeBackend {
            fail_queries: true,
            ..Default::default()
        };

        let gate = PermissionGate::mount(&backend, MediaDeviceKind::Camera);
        assert!(!gate.granted());
        assert_eq!(gate.state(), PermissionState::Unknown);
    }

    #[test]
    fn test_combined_gate_requires_both() {
        let backend = FakeBackend::default();
        backend.set(MediaDeviceKind::Camera, PermissionState::Granted);
        backend.set(MediaDeviceKind::Microphone, PermissionState::Prompt);

        let perms = MediaPermissions::mount(&backend);
        assert!(perms.has_camera_access());
        assert!(!perms.has_microphone_access());
        assert!(!perms.all_granted());

        backend.notify(MediaDeviceKind::Microphone, PermissionState::Granted);
        assert!(perms.all_granted());
    }
}
