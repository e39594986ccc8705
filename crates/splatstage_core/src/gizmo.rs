// SPDX-License-Identifier: MIT OR Apache-2.0
//! Three-axis translate gizmo and axis-constrained dragging.

use crate::math::{Axis, Plane, Ray};
use crate::scene_graph::{NodeHandle, NodeSpec, NodeTag, PickShape, SceneGraph};
use crate::state::{EntityId, GroupId, Transform};
use glam::{EulerRot, Quat, Vec3};

/// What a drag moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// One entity, moved only along the locked axis
    Entity(EntityId),
    /// Every member of a group, moved by the full delta
    Group(GroupId),
}

/// State of one gizmo drag gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    axis: Axis,
    last_point: Vec3,
    target: DragTarget,
    dragging: bool,
}

impl DragSession {
    /// Start a session at a world point on a handle
    pub fn new(axis: Axis, start: Vec3, target: DragTarget) -> Self {
        Self {
            axis,
            last_point: start,
            target,
            dragging: true,
        }
    }

    /// Locked axis
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// What is being dragged
    pub fn target(&self) -> DragTarget {
        self.target
    }

    /// Last plane intersection
    pub fn last_point(&self) -> Vec3 {
        self.last_point
    }

    /// Whether the gesture is live
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Stop the gesture
    pub fn finish(&mut self) {
        self.dragging = false;
    }

    /// World-space movement since the previous update.
    ///
    /// The drag plane contains the locked axis and faces the camera as well
    /// as it can: its normal is `axis × view_direction`, and it passes
    /// through the previous point. It is rebuilt on every call. Returns
    /// `None` (and keeps the previous point) when the plane is degenerate or
    /// the ray misses it.
    pub fn update(&mut self, ray: &Ray, view_direction: Vec3) -> Option<Vec3> {
        if !self.dragging {
            return None;
        }
        let normal = self.axis.unit().cross(view_direction);
        let plane = Plane::from_normal_and_point(normal, self.last_point)?;
        let point = ray.intersect_plane(&plane)?;
        if !crate::math::is_finite(point) {
            return None;
        }
        let delta = point - self.last_point;
        self.last_point = point;
        Some(delta)
    }

    /// The part of `delta` applied to the target
    pub fn constrain(&self, delta: Vec3) -> Vec3 {
        match self.target {
            DragTarget::Entity(_) => self.axis.project(delta),
            DragTarget::Group(_) => delta,
        }
    }
}

/// The gizmo's scene nodes
#[derive(Debug, Clone)]
pub struct TransformGizmo {
    root: NodeHandle,
    handles: [(Axis, NodeHandle); 3],
    position: Vec3,
    visible: bool,
}

impl TransformGizmo {
    /// Spawn a hidden gizmo with capsule handles of the given length and
    /// radius
    pub fn spawn<S: SceneGraph + ?Sized>(scene: &mut S, length: f32, radius: f32) -> Self {
        let mut root_spec = NodeSpec::new(NodeTag::Untagged, PickShape::None);
        root_spec.visible = false;
        let root = scene.spawn(root_spec);

        let handles = Axis::ALL.map(|axis| {
            let (x, y, z) = Quat::from_rotation_arc(Vec3::Y, axis.unit()).to_euler(EulerRot::XYZ);
            let transform = Transform {
                position: axis.unit() * (length * 0.5),
                rotation: Vec3::new(x, y, z),
                scale: Vec3::ONE,
            };
            let node = scene.spawn(
                NodeSpec::new(
                    NodeTag::GizmoHandle(axis),
                    PickShape::Capsule {
                        half_height: length * 0.5,
                        radius,
                    },
                )
                .with_parent(root)
                .with_transform(transform),
            );
            (axis, node)
        });

        Self {
            root,
            handles,
            position: Vec3::ZERO,
            visible: false,
        }
    }

    /// Root node
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Handle node for an axis
    pub fn handle(&self, axis: Axis) -> NodeHandle {
        self.handles[axis.index()].1
    }

    /// Axis of a handle node
    pub fn axis_of(&self, node: NodeHandle) -> Option<Axis> {
        self.handles.iter().find(|(_, h)| *h == node).map(|(axis, _)| *axis)
    }

    /// Whether the gizmo is shown
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current world position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Show or hide the gizmo
    pub fn set_visible<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, visible: bool) {
        self.visible = visible;
        scene.set_visible(self.root, visible);
    }

    /// Move the gizmo
    pub fn move_to<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, position: Vec3) {
        self.position = position;
        scene.set_transform(self.root, &Transform::from_position(position));
    }

    /// Start a drag if `ray` hits a handle of the visible gizmo
    pub fn begin_drag<S: SceneGraph + ?Sized>(&self, scene: &S, ray: &Ray, target: DragTarget) -> Option<DragSession> {
        if !self.visible {
            return None;
        }
        scene.intersect(ray).into_iter().find_map(|hit| match hit.tag {
            NodeTag::GizmoHandle(axis) => {
                tracing::debug!("Begin {} drag at {:?}", axis.name(), hit.point);
                Some(DragSession::new(axis, hit.point, target))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;
    use crate::scene_graph::MemoryScene;

    fn visible_gizmo(scene: &mut MemoryScene) -> TransformGizmo {
        let mut gizmo = TransformGizmo::spawn(scene, 0.8, 0.05);
        gizmo.set_visible(scene, true);
        gizmo
    }

    #[test]
    fn test_handles_laid_along_axes() {
        let mut scene = MemoryScene::new();
        let mut gizmo = visible_gizmo(&mut scene);
        gizmo.move_to(&mut scene, Vec3::new(1.0, 2.0, 3.0));
        for axis in Axis::ALL {
            let node = gizmo.handle(axis);
            assert_eq!(gizmo.axis_of(node), Some(axis));
            let world = scene.world_position(node).unwrap();
            assert!(approx_eq(world, Vec3::new(1.0, 2.0, 3.0) + axis.unit() * 0.4, 1e-5));
        }
    }

    #[test]
    fn test_begin_drag_hits_x_handle() {
        let mut scene = MemoryScene::new();
        let gizmo = visible_gizmo(&mut scene);
        let target = DragTarget::Entity(EntityId::new());

        let ray = Ray::new(Vec3::new(0.5, 0.0, 5.0), Vec3::NEG_Z);
        let session = gizmo.begin_drag(&scene, &ray, target).unwrap();
        assert_eq!(session.axis(), Axis::X);
        assert!(session.is_dragging());

        let miss = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::NEG_Z);
        assert!(gizmo.begin_drag(&scene, &miss, target).is_none());
    }

    #[test]
    fn test_hidden_gizmo_cannot_drag() {
        let mut scene = MemoryScene::new();
        let mut gizmo = visible_gizmo(&mut scene);
        gizmo.set_visible(&mut scene, false);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 5.0), Vec3::NEG_Z);
        assert!(gizmo.begin_drag(&scene, &ray, DragTarget::Entity(EntityId::new())).is_none());
    }

    #[test]
    fn test_drag_delta_on_camera_facing_plane() {
        let mut session = DragSession::new(Axis::X, Vec3::new(0.5, 0.0, 0.0), DragTarget::Entity(EntityId::new()));
        let eye = Vec3::new(0.0, 3.0, 5.0);
        let view = (Vec3::Y - eye).normalize();

        // Ray towards a point further along X on the same drag plane
        let goal = Vec3::new(1.5, 0.0, 0.0);
        let delta = session.update(&Ray::new(eye, goal - eye), view).unwrap();
        assert!(approx_eq(delta, Vec3::new(1.0, 0.0, 0.0), 1e-4));
        assert!(approx_eq(session.last_point(), goal, 1e-4));
    }

    #[test]
    fn test_entity_drag_keeps_only_axis_component() {
        let session = DragSession::new(Axis::X, Vec3::ZERO, DragTarget::Entity(EntityId::new()));
        assert_eq!(session.constrain(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 0.0, 0.0));

        let group = DragSession::new(Axis::X, Vec3::ZERO, DragTarget::Group(GroupId::new()));
        assert_eq!(group.constrain(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_degenerate_plane_is_no_change() {
        // Looking straight down the locked axis: axis x view = 0
        let mut session = DragSession::new(Axis::Z, Vec3::ZERO, DragTarget::Entity(EntityId::new()));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(session.update(&ray, Vec3::NEG_Z).is_none());
        assert_eq!(session.last_point(), Vec3::ZERO);

        session.finish();
        assert!(session.update(&ray, Vec3::NEG_Y).is_none());
    }
}
