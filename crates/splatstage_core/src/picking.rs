// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolve a pick ray to the entity or group under the pointer.

use crate::math::Ray;
use crate::scene_graph::{Intersection, NodeTag, SceneGraph};
use crate::state::{EntityId, GroupId, SceneArena};
use glam::Vec3;

/// What a click selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// A standalone entity
    Entity(EntityId),
    /// A group, picked through one of its members
    Group(GroupId),
}

/// Nearest entity under a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Entity whose geometry was hit
    pub entity: EntityId,
    /// Group of that entity, if any
    pub group: Option<GroupId>,
    /// World-space hit point
    pub point: Vec3,
    /// Distance along the ray
    pub distance: f32,
}

impl Pick {
    /// Selection target: the group when the entity has one
    pub fn target(&self) -> PickTarget {
        match self.group {
            Some(group) => PickTarget::Group(group),
            None => PickTarget::Entity(self.entity),
        }
    }
}

/// Hits that can never be picked: gizmo handles, the splat cloud and the
/// backdrop
fn is_pickable(hit: &Intersection) -> bool {
    !matches!(hit.tag, NodeTag::GizmoHandle(_) | NodeTag::Splat | NodeTag::Background)
}

/// Cast `ray` and resolve the nearest valid hit to its entity.
///
/// Only the nearest valid hit counts: if it belongs to nothing the editor
/// knows about, the result is `None` even when entities lie behind it.
pub fn pick<S: SceneGraph + ?Sized>(scene: &S, arena: &SceneArena, ray: &Ray) -> Option<Pick> {
    let hit = scene.intersect(ray).into_iter().find(is_pickable)?;

    let NodeTag::Entity { entity, .. } = hit.tag else {
        tracing::debug!("Pick hit untagged node {:?}", hit.node);
        return None;
    };
    let Some(record) = arena.get(&entity) else {
        tracing::debug!("Pick hit stale entity tag {:?}", entity);
        return None;
    };

    Some(Pick {
        entity,
        group: record.group,
        point: hit.point,
        distance: hit.distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Axis;
    use crate::scene_graph::{MemoryScene, NodeSpec, PickShape};
    use crate::state::{Entity, EntityKind, PrimitiveKind, Transform};

    fn spawn_entity(scene: &mut MemoryScene, arena: &mut SceneArena, name: &str, z: f32) -> EntityId {
        let node = scene.spawn(
            NodeSpec::new(NodeTag::Untagged, PickShape::Cuboid { half_extents: Vec3::splat(0.5) })
                .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, z))),
        );
        let entity = Entity::new(name, EntityKind::Primitive(PrimitiveKind::Box), node);
        let id = arena.insert_entity(entity);
        scene.set_tag(node, NodeTag::Entity { entity: id, group: None });
        id
    }

    fn forward() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_nearest_entity_wins() {
        let mut scene = MemoryScene::new();
        let mut arena = SceneArena::new();
        let _far = spawn_entity(&mut scene, &mut arena, "Far", -4.0);
        let near = spawn_entity(&mut scene, &mut arena, "Near", 0.0);

        let pick = pick(&scene, &arena, &forward()).unwrap();
        assert_eq!(pick.entity, near);
        assert_eq!(pick.target(), PickTarget::Entity(near));
        assert!((pick.distance - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_gizmo_splat_and_background_skipped() {
        let mut scene = MemoryScene::new();
        let mut arena = SceneArena::new();
        let target = spawn_entity(&mut scene, &mut arena, "Target", -2.0);
        for (tag, z) in [
            (NodeTag::GizmoHandle(Axis::X), 2.0),
            (NodeTag::Splat, 1.0),
            (NodeTag::Background, 0.0),
        ] {
            scene.spawn(
                NodeSpec::new(tag, PickShape::Sphere { radius: 0.3 })
                    .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, z))),
            );
        }
        assert_eq!(pick(&scene, &arena, &forward()).unwrap().entity, target);
    }

    #[test]
    fn test_group_member_resolves_to_group() {
        let mut scene = MemoryScene::new();
        let mut arena = SceneArena::new();
        let a = spawn_entity(&mut scene, &mut arena, "A", 0.0);
        let group = arena.create_group("Chair.glb", &[a], None).unwrap();
        let pick = pick(&scene, &arena, &forward()).unwrap();
        assert_eq!(pick.entity, a);
        assert_eq!(pick.target(), PickTarget::Group(group));
    }

    #[test]
    fn test_unlinked_nearest_hit_blocks() {
        let mut scene = MemoryScene::new();
        let mut arena = SceneArena::new();
        spawn_entity(&mut scene, &mut arena, "Behind", -3.0);
        scene.spawn(NodeSpec::new(NodeTag::Untagged, PickShape::Sphere { radius: 0.5 }));
        assert!(pick(&scene, &arena, &forward()).is_none());

        // Tag pointing at a removed entity resolves to nothing
        let mut scene = MemoryScene::new();
        let mut arena = SceneArena::new();
        let gone = spawn_entity(&mut scene, &mut arena, "Gone", 0.0);
        arena.remove_entity(&gone);
        assert!(pick(&scene, &arena, &forward()).is_none());
    }
}
