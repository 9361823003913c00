//! Capture devices and user input configuration

pub mod binder;

pub use binder::{DeviceBinder, DeviceError};

/// Logical camera position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraPosition {
    Front,
    #[default]
    Back,
}

impl CameraPosition {
    /// The opposite position
    pub fn flipped(self) -> Self {
        match self {
            CameraPosition::Front => CameraPosition::Back,
            CameraPosition::Back => CameraPosition::Front,
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
        }
    }
}

/// Kind of capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Camera,
    Microphone,
}

/// A platform capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    /// Platform identifier
    pub id: String,
    /// Human readable name
    pub name: String,
    pub kind: DeviceKind,
    /// Camera position (cameras only)
    pub position: Option<CameraPosition>,
}

impl CaptureDevice {
    pub fn camera(id: impl Into<String>, name: impl Into<String>, position: CameraPosition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: DeviceKind::Camera,
            position: Some(position),
        }
    }

    pub fn microphone(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: DeviceKind::Microphone,
            position: None,
        }
    }
}

/// Resolves platform capture devices
///
/// Absence is reported with `None`, never as a fault.
pub trait DeviceProvider: Send + Sync + 'static {
    fn default_camera(&self, position: CameraPosition) -> Option<CaptureDevice>;

    fn default_microphone(&self) -> Option<CaptureDevice>;
}

/// User-controlled input configuration
///
/// Lives on the session manager, not on a session handle, so it survives
/// stop/start cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleState {
    pub is_front_camera: bool,
    pub is_microphone_enabled: bool,
    pub is_camera_enabled: bool,
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            is_front_camera: false,
            is_microphone_enabled: true,
            is_camera_enabled: true,
        }
    }
}

impl ToggleState {
    pub fn camera_position(&self) -> CameraPosition {
        if self.is_front_camera {
            CameraPosition::Front
        } else {
            CameraPosition::Back
        }
    }

    pub fn set_camera_position(&mut self, position: CameraPosition) {
        self.is_front_camera = position == CameraPosition::Front;
    }
}
