// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings, stored as RON.

use crate::camera::{Camera, CameraLimits};
use crate::tooltip::TooltipTrigger;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings file format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Conventional settings file name
pub const SETTINGS_FILE_NAME: &str = "splatstage.ron";

/// Viewport size used until the host reports a real one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Camera lens, initial pose and orbit limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Position restored by `reset_camera`
    pub initial_position: Vec3,
    /// Look-at point restored by `reset_camera`
    pub initial_look_at: Vec3,
    /// Up vector restored by `reset_camera`
    pub initial_up: Vec3,
    /// Orbit limits enforced every frame, `None` to disable
    pub limits: Option<CameraLimits>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
            initial_position: Vec3::new(0.0, 2.0, 5.0),
            initial_look_at: Vec3::new(0.0, 1.0, 0.0),
            initial_up: Vec3::Y,
            limits: Some(CameraLimits::default()),
        }
    }
}

impl CameraSettings {
    /// Camera at the initial pose
    pub fn build(&self, viewport: Vec2) -> Camera {
        let mut camera = Camera {
            position: self.initial_position,
            up: self.initial_up,
            fov: self.fov,
            near: self.near,
            far: self.far,
            viewport,
            ..Default::default()
        };
        camera.look_at(self.initial_look_at);
        camera
    }
}

/// Gizmo handle geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoSettings {
    /// Handle length
    pub handle_length: f32,
    /// Handle pick radius
    pub handle_radius: f32,
}

impl Default for GizmoSettings {
    fn default() -> Self {
        Self {
            handle_length: 0.8,
            handle_radius: 0.05,
        }
    }
}

/// All editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Format version
    pub version: u32,
    /// Initial viewport size
    pub viewport: ViewportSettings,
    /// Tooltip trigger given to new entities
    pub default_trigger: TooltipTrigger,
    /// Camera settings
    pub camera: CameraSettings,
    /// Gizmo settings
    pub gizmo: GizmoSettings,
    /// Undo depth
    pub history_depth: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            viewport: ViewportSettings::default(),
            default_trigger: TooltipTrigger::OnClick,
            camera: CameraSettings::default(),
            gizmo: GizmoSettings::default(),
            history_depth: crate::history::MAX_HISTORY,
        }
    }
}

impl EditorSettings {
    /// Viewport size as a vector
    pub fn viewport_size(&self) -> Vec2 {
        Vec2::new(self.viewport.width, self.viewport.height)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = ron::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            tracing::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(path, content)
    }
}
