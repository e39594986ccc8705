// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small geometry helpers on top of glam: axes, rays and planes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Length below which a vector is treated as zero
pub const EPSILON: f32 = 1e-6;

/// A world axis used for gizmo handles and group rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis (red handle)
    X,
    /// Y axis (green handle)
    Y,
    /// Z axis (blue handle)
    Z,
}

impl Axis {
    /// All three axes in handle order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Unit vector along this axis
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    /// Component index (0, 1, 2)
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Lowercase name as used in scene files and scripts
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }

    /// Parse a lowercase or uppercase axis name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" | "X" => Some(Self::X),
            "y" | "Y" => Some(Self::Y),
            "z" | "Z" => Some(Self::Z),
            _ => None,
        }
    }

    /// Keep only this axis' component of `v`
    pub fn project(self, v: Vec3) -> Vec3 {
        let mut out = Vec3::ZERO;
        out[self.index()] = v[self.index()];
        out
    }
}

/// A half-line with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray start
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersect with a plane. `None` when parallel (and not lying in it) or
    /// when the plane is behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < EPSILON {
            if plane.distance_to_point(self.origin).abs() < EPSILON {
                return Some(self.origin);
            }
            return None;
        }

        let t = -(self.origin.dot(plane.normal) + plane.constant) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }

    /// Closest approach between the ray and the segment `a..b`.
    ///
    /// Returns `(t, distance)` where `t` is the ray parameter of the closest
    /// point on the ray and `distance` the gap between the two closest points.
    pub fn closest_to_segment(&self, a: Vec3, b: Vec3) -> (f32, f32) {
        let seg = b - a;
        let w0 = self.origin - a;
        let aa = self.direction.dot(self.direction);
        let bb = self.direction.dot(seg);
        let cc = seg.dot(seg);
        let dd = self.direction.dot(w0);
        let ee = seg.dot(w0);
        let denom = aa * cc - bb * bb;

        let (mut t, mut s) = if denom.abs() < EPSILON || cc < EPSILON {
            (0.0, if cc < EPSILON { 0.0 } else { (ee / cc).clamp(0.0, 1.0) })
        } else {
            ((bb * ee - cc * dd) / denom, (aa * ee - bb * dd) / denom)
        };

        // Clamp to the segment, then re-solve the ray parameter
        if !(0.0..=1.0).contains(&s) {
            s = s.clamp(0.0, 1.0);
            t = (a + seg * s - self.origin).dot(self.direction) / aa;
        }
        t = t.max(0.0);

        let on_ray = self.at(t);
        let on_seg = a + seg * s;
        (t, on_ray.distance(on_seg))
    }
}

/// An infinite plane `normal · p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed offset from the origin
    pub constant: f32,
}

impl Plane {
    /// Plane through `point` with the given normal. `None` for a zero normal.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self {
            normal,
            constant: -point.dot(normal),
        })
    }

    /// Signed distance from the plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Approximate float comparison for vectors
pub fn approx_eq(a: Vec3, b: Vec3, tolerance: f32) -> bool {
    (a - b).abs().max_element() <= tolerance
}

/// True when every component is finite
pub fn is_finite(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_project() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::X.project(v), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(Axis::Y.project(v), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(Axis::Z.project(v), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(Axis::parse("Y"), Some(Axis::Y));
        assert_eq!(Axis::parse("w"), None);
    }

    #[test]
    fn test_ray_plane_intersection() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(1.0, 5.0, 0.0), Vec3::NEG_Y);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!(approx_eq(hit, Vec3::new(1.0, 2.0, 0.0), 1e-5));

        // Pointing away from the plane
        let away = Ray::new(Vec3::new(1.0, 5.0, 0.0), Vec3::Y);
        assert!(away.intersect_plane(&plane).is_none());

        // Parallel, off-plane
        let parallel = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(parallel.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_degenerate_plane() {
        assert!(Plane::from_normal_and_point(Vec3::ZERO, Vec3::ONE).is_none());
    }

    #[test]
    fn test_closest_to_segment() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let (t, dist) = ray.closest_to_segment(Vec3::new(0.1, -1.0, 0.0), Vec3::new(0.1, 1.0, 0.0));
        assert!((t - 5.0).abs() < 1e-4);
        assert!((dist - 0.1).abs() < 1e-4);

        // Segment entirely to the side: clamps to the nearest endpoint
        let (_, far) = ray.closest_to_segment(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0));
        assert!((far - 2.0).abs() < 1e-4);
    }
}
