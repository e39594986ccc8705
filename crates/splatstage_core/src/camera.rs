// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera, projection and orbit controls.
//!
//! Projection follows the GL clip convention (NDC in -1..1 on all axes) so
//! that screen anchors match what the splat viewer renders.

use crate::math::Ray;
use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Screen-space position of a tooltip anchor, in pixels from the top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenAnchor {
    /// Horizontal pixel offset
    pub x: f32,
    /// Vertical pixel offset
    pub y: f32,
}

impl ScreenAnchor {
    /// CSS transform placing a tooltip's bottom-centre on the anchor
    pub fn css_transform(&self) -> String {
        format!("translate(-50%, -100%) translate({}px,{}px)", self.x, self.y)
    }

    /// As a vector
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// World orientation; the camera looks down its local -Z
    pub rotation: Quat,
    /// Up vector used by `look_at`
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            rotation: Quat::IDENTITY,
            up: Vec3::Y,
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
            viewport: Vec2::new(1280.0, 720.0),
        };
        camera.look_at(Vec3::new(0.0, 1.0, 0.0));
        camera
    }
}

/// Serializable snapshot of the camera pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// World position
    pub position: Vec3,
    /// Euler rotation (radians, XYZ)
    pub rotation: Vec3,
    /// Up vector
    pub up: Vec3,
    /// Orientation quaternion
    pub quaternion: Quat,
}

impl Camera {
    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y.max(1.0)
    }

    /// Direction the camera looks in
    pub fn view_direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// View-to-clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect(), self.near, self.far)
    }

    /// Project a world point to normalized device coordinates
    pub fn project(&self, world: Vec3) -> Vec3 {
        (self.projection_matrix() * self.view_matrix()).project_point3(world)
    }

    /// Convert a pixel position to NDC (y up)
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x / self.viewport.x.max(1.0)) * 2.0 - 1.0,
            -(screen.y / self.viewport.y.max(1.0)) * 2.0 + 1.0,
        )
    }

    /// Convert NDC to a pixel position
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.viewport.x,
            (-ndc.y * 0.5 + 0.5) * self.viewport.y,
        )
    }

    /// Pick ray through an NDC position
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let through = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.position, through - self.position)
    }

    /// Pick ray through a pixel position
    pub fn ray_from_screen(&self, screen: Vec2) -> Ray {
        self.ray_from_ndc(self.screen_to_ndc(screen))
    }

    /// Screen anchor for a world point, `None` when the point is behind the
    /// camera or outside the NDC square
    pub fn anchor_for(&self, world: Vec3) -> Option<ScreenAnchor> {
        let view_z = self.view_matrix().transform_point3(world).z;
        if view_z >= 0.0 {
            return None;
        }
        let ndc = self.project(world);
        if !ndc.x.is_finite() || !ndc.y.is_finite() || ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return None;
        }
        let screen = self.ndc_to_screen(ndc.truncate());
        Some(ScreenAnchor {
            x: screen.x,
            y: screen.y,
        })
    }

    /// Orientation for a camera at `eye` looking at `target`
    pub fn orientation_looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
        let mut z = eye - target;
        if z.length_squared() < crate::math::EPSILON {
            z = Vec3::Z;
        }
        let z = z.normalize();
        let mut x = up.cross(z);
        if x.length_squared() < crate::math::EPSILON {
            // Up is parallel to the view direction; nudge it
            let nudged = if up.z.abs() > 0.9 { z + Vec3::new(0.0001, 0.0, 0.0) } else { z + Vec3::new(0.0, 0.0, 0.0001) };
            x = up.cross(nudged.normalize());
        }
        let x = x.normalize();
        let y = z.cross(x);
        Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
    }

    /// Rotate to face a world point
    pub fn look_at(&mut self, target: Vec3) {
        self.rotation = Self::orientation_looking_at(self.position, target, self.up);
    }

    /// Current pose
    pub fn state(&self) -> CameraState {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        CameraState {
            position: self.position,
            rotation: Vec3::new(x, y, z),
            up: self.up,
            quaternion: self.rotation,
        }
    }
}

/// Orbit limits around a fixed target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLimits {
    /// Closest allowed distance to the target
    pub min_distance: f32,
    /// Farthest allowed distance to the target
    pub max_distance: f32,
    /// Smallest polar angle from +Y in degrees
    pub min_polar: f32,
    /// Largest polar angle from +Y in degrees
    pub max_polar: f32,
    /// Lowest allowed camera height
    pub min_height: f32,
    /// Orbit target
    pub target: Vec3,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 6.0,
            min_polar: 10.0,
            max_polar: 170.0,
            min_height: 0.0,
            target: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl CameraLimits {
    /// Pull the camera back inside the limits. Returns true if it moved.
    pub fn clamp(&self, camera: &mut Camera) -> bool {
        let before = camera.position;

        if camera.position.y < self.min_height {
            camera.position.y = self.min_height;
        }

        let offset = camera.position - self.target;
        let distance = offset.length();
        if distance > crate::math::EPSILON {
            let clamped = distance.clamp(self.min_distance, self.max_distance);
            if (clamped - distance).abs() > f32::EPSILON {
                camera.position = self.target + offset / distance * clamped;
            }
        }

        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius > crate::math::EPSILON {
            let polar = (offset.y / radius).clamp(-1.0, 1.0).acos().to_degrees();
            let clamped = polar.clamp(self.min_polar, self.max_polar);
            if (clamped - polar).abs() > f32::EPSILON {
                let phi = clamped.to_radians();
                let theta = offset.x.atan2(offset.z);
                let moved = self.target
                    + Vec3::new(radius * phi.sin() * theta.sin(), radius * phi.cos(), radius * phi.sin() * theta.cos());
                if moved.y >= self.min_height {
                    camera.position = moved;
                }
            }
        }

        if camera.position.y < self.min_height {
            camera.position.y = self.min_height;
        }

        let changed = camera.position != before;
        if changed {
            camera.look_at(self.target);
        }
        changed
    }
}

/// Orbit/pan/zoom camera controller.
///
/// The gizmo drag disables it for the duration of a gesture; every input
/// is ignored while `enabled` is false.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Whether pointer input moves the camera
    pub enabled: bool,
    /// Orbit target (look-at point)
    pub target: Vec3,
    /// Orbit distance from target
    pub distance: f32,
    /// Orbit yaw angle in radians
    pub yaw: f32,
    /// Orbit pitch angle in radians
    pub pitch: f32,
    /// Rotation speed (radians per pixel)
    pub rotate_speed: f32,
    /// Zoom speed
    pub zoom_speed: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enabled: true,
            target: Vec3::new(0.0, 1.0, 0.0),
            distance: 4.0,
            yaw: 0.0,
            pitch: std::f32::consts::FRAC_PI_6,
            rotate_speed: 0.01,
            zoom_speed: 1.0,
        }
    }
}

impl OrbitControls {
    /// Controls orbiting `target` from the camera's current position
    pub fn from_camera(camera: &Camera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let distance = offset.length().max(0.1);
        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            ..Default::default()
        }
    }

    /// Orbit around the target. Returns false when disabled.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.yaw -= delta_x * self.rotate_speed;
        self.pitch += delta_y * self.rotate_speed;

        // Clamp pitch to avoid flipping over the poles
        self.pitch = self.pitch.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
        true
    }

    /// Pan the target in the camera plane. Returns false when disabled.
    pub fn pan(&mut self, camera: &Camera, delta_x: f32, delta_y: f32) -> bool {
        if !self.enabled {
            return false;
        }
        let right = camera.rotation * Vec3::X;
        let up = camera.rotation * Vec3::Y;
        let pan_speed = self.distance * 0.001;
        self.target += right * (-delta_x * pan_speed) + up * (delta_y * pan_speed);
        true
    }

    /// Zoom towards the target. Returns false when disabled.
    pub fn zoom(&mut self, delta: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.distance *= 1.0 - delta * self.zoom_speed * 0.1;
        self.distance = self.distance.clamp(0.1, 10000.0);
        true
    }

    /// Camera position implied by the orbit parameters
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Move the camera to the orbit position, looking at the target
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.look_at(self.target);
    }
}

/// Easing curves for camera animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Accelerate (quadratic)
    EaseInQuad,
    /// Decelerate (quadratic)
    EaseOutQuad,
    /// Accelerate then decelerate (quadratic)
    #[default]
    EaseInOutQuad,
    /// Accelerate (cubic)
    EaseInCubic,
    /// Decelerate (cubic)
    EaseOutCubic,
    /// Accelerate then decelerate (cubic)
    EaseInOutCubic,
}

impl Easing {
    /// Map linear progress in 0..1 to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    (t - 1.0) * (2.0 * t - 2.0) * (2.0 * t - 2.0) + 1.0
                }
            }
        }
    }

    /// Parse a camelCase easing name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "linear" => Some(Self::Linear),
            "easeInQuad" => Some(Self::EaseInQuad),
            "easeOutQuad" => Some(Self::EaseOutQuad),
            "easeInOutQuad" => Some(Self::EaseInOutQuad),
            "easeInCubic" => Some(Self::EaseInCubic),
            "easeOutCubic" => Some(Self::EaseOutCubic),
            "easeInOutCubic" => Some(Self::EaseInOutCubic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Motion {
    Fly {
        from_position: Vec3,
        to_position: Vec3,
        from_rotation: Quat,
        to_rotation: Quat,
    },
    Orbit {
        center: Vec3,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
}

/// A camera animation advanced by the per-frame pass
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAnimation {
    motion: Motion,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    /// Remaining path waypoints, each flown to while looking at the origin
    waypoints: VecDeque<Vec3>,
}

impl CameraAnimation {
    /// Fly from the camera's current pose to a new position and look-at
    pub fn fly_to(camera: &Camera, position: Vec3, look_at: Vec3, duration: Duration, easing: Easing) -> Self {
        Self {
            motion: Motion::Fly {
                from_position: camera.position,
                to_position: position,
                from_rotation: camera.rotation,
                to_rotation: Camera::orientation_looking_at(position, look_at, camera.up),
            },
            duration,
            elapsed: Duration::ZERO,
            easing,
            waypoints: VecDeque::new(),
        }
    }

    /// Circle `center` in the horizontal plane between two angles (radians)
    pub fn orbit(center: Vec3, radius: f32, start_angle: f32, end_angle: f32, duration: Duration, easing: Easing) -> Self {
        Self {
            motion: Motion::Orbit {
                center,
                radius,
                start_angle,
                end_angle,
            },
            duration,
            elapsed: Duration::ZERO,
            easing,
            waypoints: VecDeque::new(),
        }
    }

    /// Jump to the first point, then fly through the rest looking at the
    /// origin. `None` with fewer than two points.
    pub fn path(camera: &mut Camera, points: &[Vec3], per_point: Duration, easing: Easing) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (next, remaining) = rest.split_first()?;
        camera.position = *first;
        camera.look_at(Vec3::ZERO);

        let mut animation = Self::fly_to(camera, *next, Vec3::ZERO, per_point, easing);
        animation.waypoints = remaining.iter().copied().collect();
        Some(animation)
    }

    /// Advance by `dt` and pose the camera. Returns true once finished.
    pub fn advance(&mut self, camera: &mut Camera, dt: Duration) -> bool {
        self.elapsed += dt;
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let eased = self.easing.apply(progress);

        match self.motion {
            Motion::Fly {
                from_position,
                to_position,
                from_rotation,
                to_rotation,
            } => {
                camera.position = from_position.lerp(to_position, eased);
                camera.rotation = from_rotation.slerp(to_rotation, eased);
            }
            Motion::Orbit {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let angle = start_angle + (end_angle - start_angle) * eased;
                camera.position = Vec3::new(center.x + radius * angle.cos(), center.y, center.z + radius * angle.sin());
                camera.look_at(center);
            }
        }

        if progress < 1.0 {
            return false;
        }

        // Chain the next path leg from where this one ended
        if let Some(next) = self.waypoints.pop_front() {
            let waypoints = std::mem::take(&mut self.waypoints);
            *self = Self::fly_to(camera, next, Vec3::ZERO, self.duration, self.easing);
            self.waypoints = waypoints;
            return false;
        }
        true
    }
}
