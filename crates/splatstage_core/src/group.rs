// SPDX-License-Identifier: MIT OR Apache-2.0
//! Group pivot math.
//!
//! A group's pivot is the mean of its members' positions, computed fresh on
//! every call. Rotations and scales act about that pivot.

use crate::error::{Result, StageError};
use crate::math::Axis;
use crate::scene_graph::SceneGraph;
use crate::state::{EntityId, GroupId, SceneArena, Transform};
use glam::{Quat, Vec3};

/// A transform applied to every member of a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupOp {
    /// Add a vector to every position
    Translate(Vec3),
    /// Orbit members about the pivot and spin each in place
    Rotate {
        /// Rotation axis
        axis: Axis,
        /// Angle in radians
        angle: f32,
    },
    /// Scale offsets from the pivot and each member's own scale
    Scale(Vec3),
}

impl GroupOp {
    fn is_finite(&self) -> bool {
        match self {
            Self::Translate(v) | Self::Scale(v) => crate::math::is_finite(*v),
            Self::Rotate { angle, .. } => angle.is_finite(),
        }
    }

    /// Apply to one member given the group pivot
    pub fn apply_to(&self, transform: &Transform, pivot: Vec3) -> Transform {
        let mut out = *transform;
        match *self {
            Self::Translate(delta) => out.position += delta,
            Self::Rotate { axis, angle } => {
                let relative = transform.position - pivot;
                out.position = pivot + Quat::from_axis_angle(axis.unit(), angle) * relative;
                out.rotation[axis.index()] += angle;
            }
            Self::Scale(factor) => {
                out.position = pivot + (transform.position - pivot) * factor;
                out.scale *= factor;
            }
        }
        out
    }
}

/// Mean position of the group's members
pub fn centroid(arena: &SceneArena, group: &GroupId) -> Result<Vec3> {
    let record = arena.group(group).ok_or(StageError::GroupNotFound(*group))?;
    let positions: Vec<Vec3> = record
        .members
        .iter()
        .filter_map(|id| arena.get(id))
        .map(|e| e.transform.position)
        .collect();
    if positions.is_empty() {
        return Err(StageError::EmptyGroup(*group));
    }
    Ok(positions.iter().copied().sum::<Vec3>() / positions.len() as f32)
}

/// Apply `op` to every member and refresh their scene nodes.
///
/// Nothing is changed unless every resulting transform is finite.
pub fn apply_group_op<S: SceneGraph + ?Sized>(
    arena: &mut SceneArena,
    scene: &mut S,
    group: &GroupId,
    op: GroupOp,
) -> Result<()> {
    if !op.is_finite() {
        return Err(StageError::InvalidTransform(format!("{:?}", op)));
    }
    let pivot = centroid(arena, group)?;
    let members: Vec<EntityId> = arena
        .group(group)
        .map(|g| g.members.clone())
        .unwrap_or_default();

    let mut updates = Vec::with_capacity(members.len());
    for id in &members {
        let Some(entity) = arena.get(id) else {
            continue;
        };
        let next = op.apply_to(&entity.transform, pivot);
        if !next.is_finite() {
            return Err(StageError::InvalidTransform(format!("{} -> {:?}", entity.name, next)));
        }
        updates.push((*id, next));
    }

    for (id, transform) in updates {
        if let Some(entity) = arena.get_mut(&id) {
            entity.transform = transform;
            scene.set_transform(entity.node, &transform);
        }
    }
    tracing::debug!("Applied {:?} to group {:?} about {:?}", op, group, pivot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;
    use crate::scene_graph::{MemoryScene, NodeSpec, NodeTag, PickShape};
    use crate::state::{Entity, EntityKind, PrimitiveKind};

    fn grouped(positions: &[Vec3]) -> (SceneArena, MemoryScene, GroupId, Vec<EntityId>) {
        let mut arena = SceneArena::new();
        let mut scene = MemoryScene::new();
        let ids: Vec<EntityId> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let transform = Transform::from_position(*p);
                let node = scene.spawn(NodeSpec::new(NodeTag::Untagged, PickShape::None).with_transform(transform));
                let mut entity = Entity::new(format!("Box_{}", i), EntityKind::Primitive(PrimitiveKind::Box), node);
                entity.transform = transform;
                arena.insert_entity(entity)
            })
            .collect();
        let group = arena.create_group("Row", &ids, None).unwrap();
        (arena, scene, group, ids)
    }

    fn position(arena: &SceneArena, id: &EntityId) -> Vec3 {
        arena.get(id).unwrap().transform.position
    }

    #[test]
    fn test_translate_row_scenario() {
        let (mut arena, mut scene, group, ids) =
            grouped(&[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)]);
        apply_group_op(&mut arena, &mut scene, &group, GroupOp::Translate(Vec3::X)).unwrap();

        assert_eq!(position(&arena, &ids[0]), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(position(&arena, &ids[1]), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(position(&arena, &ids[2]), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(centroid(&arena, &group).unwrap(), Vec3::new(3.0, 0.0, 0.0));

        // Scene nodes were refreshed too
        let node = arena.get(&ids[2]).unwrap().node;
        assert_eq!(scene.world_position(node), Some(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_centroid_translation_invariance() {
        let (mut arena, mut scene, group, _) =
            grouped(&[Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.5, 2.0), Vec3::new(0.0, -1.0, 7.0)]);
        let before = centroid(&arena, &group).unwrap();
        let v = Vec3::new(0.25, -3.0, 9.5);
        apply_group_op(&mut arena, &mut scene, &group, GroupOp::Translate(v)).unwrap();
        assert!(approx_eq(centroid(&arena, &group).unwrap(), before + v, 1e-5));
    }

    #[test]
    fn test_rotate_round_trip() {
        let start = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, -1.0), Vec3::new(3.0, 1.0, 2.0)];
        let (mut arena, mut scene, group, ids) = grouped(&start);
        for axis in Axis::ALL {
            apply_group_op(&mut arena, &mut scene, &group, GroupOp::Rotate { axis, angle: 0.7 }).unwrap();
            apply_group_op(&mut arena, &mut scene, &group, GroupOp::Rotate { axis, angle: -0.7 }).unwrap();
        }
        for (id, original) in ids.iter().zip(start) {
            assert!(approx_eq(position(&arena, id), original, 1e-4));
            assert!(approx_eq(arena.get(id).unwrap().transform.rotation, Vec3::ZERO, 1e-5));
        }
    }

    #[test]
    fn test_rotate_spins_members_about_pivot() {
        let (mut arena, mut scene, group, ids) = grouped(&[Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
        let angle = std::f32::consts::FRAC_PI_2;
        apply_group_op(&mut arena, &mut scene, &group, GroupOp::Rotate { axis: Axis::Y, angle }).unwrap();
        assert!(approx_eq(position(&arena, &ids[0]), Vec3::new(0.0, 0.0, 1.0), 1e-5));
        assert!(approx_eq(position(&arena, &ids[1]), Vec3::new(0.0, 0.0, -1.0), 1e-5));
        assert!((arena.get(&ids[0]).unwrap().transform.rotation.y - angle).abs() < 1e-6);
    }

    #[test]
    fn test_scale_about_pivot() {
        let (mut arena, mut scene, group, ids) = grouped(&[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]);
        apply_group_op(&mut arena, &mut scene, &group, GroupOp::Scale(Vec3::splat(2.0))).unwrap();
        assert_eq!(position(&arena, &ids[0]), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(position(&arena, &ids[1]), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(arena.get(&ids[0]).unwrap().transform.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_invalid_op_leaves_state() {
        let (mut arena, mut scene, group, ids) = grouped(&[Vec3::ZERO, Vec3::X]);
        let result = apply_group_op(&mut arena, &mut scene, &group, GroupOp::Translate(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(matches!(result, Err(StageError::InvalidTransform(_))));
        assert_eq!(position(&arena, &ids[1]), Vec3::X);

        let missing = GroupId::new();
        assert!(matches!(centroid(&arena, &missing), Err(StageError::GroupNotFound(_))));
    }
}
