// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state: the entity and group arena.
//!
//! Entities and groups live in insertion-ordered maps addressed by stable
//! ids. Renderable nodes are referenced through opaque [`NodeHandle`]s owned
//! by the scene graph, and every node carries a tag pointing back here.

use crate::scene_graph::NodeHandle;
use crate::tooltip::TooltipTrigger;
use glam::{EulerRot, Mat4, Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for entities in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random group ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// Transform component data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position (x, y, z)
    pub position: Vec3,
    /// Rotation in euler angles (radians, XYZ order)
    pub rotation: Vec3,
    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform at a position with identity rotation and unit scale
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Rotation as a quaternion
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local matrix (scale, then rotate, then translate)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        crate::math::is_finite(self.position)
            && crate::math::is_finite(self.rotation)
            && crate::math::is_finite(self.scale)
    }
}

/// Surface appearance of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Material {
    /// Base color as a 6-digit hex string without `#`
    pub color: String,
    /// Render as wireframe
    pub wireframe: bool,
    /// Alpha blending enabled
    pub transparent: bool,
    /// Opacity when transparent
    pub opacity: f32,
    /// Emissive color as hex
    pub emissive: Option<String>,
    /// PBR metalness
    pub metalness: f32,
    /// PBR roughness
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: "00ff00".to_string(),
            wireframe: true,
            transparent: false,
            opacity: 1.0,
            emissive: None,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

/// Normalize a `#rrggbb` / `rrggbb` color string to lowercase `rrggbb`
pub fn parse_hex_color(s: &str) -> Option<String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_lowercase())
    } else {
        None
    }
}

/// Built-in primitive shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Unit cube
    Box,
    /// Unit-diameter sphere
    Sphere,
    /// Unit cylinder
    Cylinder,
    /// Unit cone
    Cone,
    /// Torus
    Torus,
    /// Flat unit square
    Plane,
}

impl PrimitiveKind {
    /// Display name, also used to name new entities
    pub fn name(&self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Cone => "Cone",
            Self::Torus => "Torus",
            Self::Plane => "Plane",
        }
    }

    /// Geometry type name used by the viewer format
    pub fn geometry_type(&self) -> &'static str {
        match self {
            Self::Box => "BoxGeometry",
            Self::Sphere => "SphereGeometry",
            Self::Cylinder => "CylinderGeometry",
            Self::Cone => "ConeGeometry",
            Self::Torus => "TorusGeometry",
            Self::Plane => "PlaneGeometry",
        }
    }

    /// Parse a viewer geometry type name
    pub fn from_geometry_type(s: &str) -> Option<Self> {
        [Self::Box, Self::Sphere, Self::Cylinder, Self::Cone, Self::Torus, Self::Plane]
            .into_iter()
            .find(|kind| kind.geometry_type() == s)
    }

    /// Half extents of the local bounding box used for picking
    pub fn half_extents(&self) -> Vec3 {
        match self {
            Self::Plane => Vec3::new(0.5, 0.5, 0.01),
            Self::Torus => Vec3::new(0.7, 0.7, 0.2),
            _ => Vec3::splat(0.5),
        }
    }
}

/// Where an entity's geometry comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Editor-created primitive
    Primitive(PrimitiveKind),
    /// One mesh extracted from an imported GLB file
    MeshPart {
        /// Mesh name inside the source file
        mesh_name: String,
    },
}

impl EntityKind {
    /// Geometry type name for export
    pub fn geometry_type(&self) -> &str {
        match self {
            Self::Primitive(kind) => kind.geometry_type(),
            Self::MeshPart { .. } => "BufferGeometry",
        }
    }
}

/// Per-entity tooltip configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipConfig {
    /// Whether a tooltip exists for this entity
    pub enabled: bool,
    /// What makes the tooltip appear
    pub trigger: TooltipTrigger,
    /// Whether the tooltip shows its action button
    pub show_button: bool,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger: TooltipTrigger::default(),
            show_button: true,
        }
    }
}

/// A logical editable object in the scene
#[derive(Debug, Clone)]
pub struct Entity {
    /// Stable id
    pub id: EntityId,
    /// Display name (tooltip title)
    pub name: String,
    /// Tooltip body text
    pub description: String,
    /// Tooltip action button label
    pub button_text: String,
    /// Local transform
    pub transform: Transform,
    /// Appearance
    pub material: Material,
    /// Rendered or hidden
    pub visible: bool,
    /// Geometry provenance
    pub kind: EntityKind,
    /// Half extents of the pick volume in local space
    pub bounds: Vec3,
    /// Back-reference into the scene graph
    pub node: NodeHandle,
    /// Owning group, if any
    pub group: Option<GroupId>,
    /// File this entity was imported from
    pub source_file: Option<String>,
    /// Action script run on click and from the tooltip button
    pub script: Option<String>,
    /// Tooltip settings
    pub tooltip: TooltipConfig,
}

impl Entity {
    /// Create an entity with default content for the given node
    pub fn new(name: impl Into<String>, kind: EntityKind, node: NodeHandle) -> Self {
        let name = name.into();
        let bounds = match &kind {
            EntityKind::Primitive(primitive) => primitive.half_extents(),
            EntityKind::MeshPart { .. } => Vec3::splat(0.5),
        };
        Self {
            id: EntityId::new(),
            description: format!("Description for {}", name),
            name,
            button_text: "Select".to_string(),
            transform: Transform::default(),
            material: Material::default(),
            visible: true,
            kind,
            bounds,
            node,
            group: None,
            source_file: None,
            script: None,
            tooltip: TooltipConfig::default(),
        }
    }

    /// The script, if it contains anything but whitespace
    pub fn active_script(&self) -> Option<&str> {
        self.script.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A named collection of entities sharing a provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Stable id
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Ordered member list
    pub members: Vec<EntityId>,
    /// Visibility applied to every member
    pub visible: bool,
    /// File the members were imported from
    pub source_file: Option<String>,
}

/// Result of removing an entity from the arena
#[derive(Debug)]
pub struct RemovedEntity {
    /// The removed entity
    pub entity: Entity,
    /// Group deleted because this was its last member
    pub deleted_group: Option<GroupId>,
}

/// Arena of all entities and groups in the scene
#[derive(Debug, Default)]
pub struct SceneArena {
    entities: IndexMap<EntityId, Entity>,
    groups: IndexMap<GroupId, Group>,
}

impl SceneArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under its own id, or a fresh one if that id is taken.
    /// Returns the id it was stored under.
    pub fn insert_entity(&mut self, mut entity: Entity) -> EntityId {
        if self.entities.contains_key(&entity.id) {
            let fresh = EntityId::new();
            tracing::debug!("Entity id {} already taken, using {} for {}", entity.id.0, fresh.0, entity.name);
            entity.id = fresh;
        }
        let id = entity.id;
        self.entities.insert(id, entity);
        id
    }

    /// Get an entity by ID
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable reference to an entity by ID
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Whether the entity exists
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterate entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entity ids in insertion order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Position of the entity in insertion order
    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.entities.get_index_of(id)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Find an entity by name: exact match first, then case-insensitive
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| e.name == name)
            .or_else(|| {
                let lower = name.to_lowercase();
                self.entities.values().find(|e| e.name.to_lowercase() == lower)
            })
            .map(|e| e.id)
    }

    /// Remove an entity, detaching it from its group.
    ///
    /// A group left without members is deleted as well.
    pub fn remove_entity(&mut self, id: &EntityId) -> Option<RemovedEntity> {
        let deleted_group = self.detach_from_group(id);
        let entity = self.entities.shift_remove(id)?;
        Some(RemovedEntity { entity, deleted_group })
    }

    /// Detach an entity from its group. Returns the group id if the group
    /// became empty and was deleted.
    pub fn detach_from_group(&mut self, id: &EntityId) -> Option<GroupId> {
        let group_id = self.entities.get_mut(id)?.group.take()?;
        let group = self.groups.get_mut(&group_id)?;
        group.members.retain(|m| m != id);
        if group.members.is_empty() {
            self.groups.shift_remove(&group_id);
            tracing::info!("Deleted empty group {:?}", group_id);
            return Some(group_id);
        }
        None
    }

    /// Create a group from existing entities. Unknown ids are skipped and
    /// members are detached from any previous group first.
    ///
    /// Returns `None` when no member exists.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        members: &[EntityId],
        source_file: Option<String>,
    ) -> Option<GroupId> {
        self.create_group_with_id(GroupId::new(), name, members, source_file)
    }

    /// Create a group under a known id (used when loading documents). A fresh
    /// id is used when `id` already names a group.
    pub fn create_group_with_id(
        &mut self,
        mut id: GroupId,
        name: impl Into<String>,
        members: &[EntityId],
        source_file: Option<String>,
    ) -> Option<GroupId> {
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            if self.contains(member) && !kept.contains(member) {
                self.detach_from_group(member);
                kept.push(*member);
            }
        }
        if kept.is_empty() {
            return None;
        }
        if self.groups.contains_key(&id) {
            let fresh = GroupId::new();
            tracing::debug!("Group id {} already taken, using {}", id.0, fresh.0);
            id = fresh;
        }

        for member in &kept {
            if let Some(entity) = self.entities.get_mut(member) {
                entity.group = Some(id);
            }
        }
        self.groups.insert(
            id,
            Group {
                id,
                name: name.into(),
                members: kept,
                visible: true,
                source_file,
            },
        );
        Some(id)
    }

    /// Get a group by ID
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Get a mutable group by ID
    pub fn group_mut(&mut self, id: &GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    /// Iterate groups in creation order
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.entities.clear();
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(arena: &mut SceneArena, name: &str, node: u64) -> EntityId {
        arena.insert_entity(Entity::new(name, EntityKind::Primitive(PrimitiveKind::Box), NodeHandle(node)))
    }

    #[test]
    fn test_entity_defaults() {
        let e = Entity::new("Crate", EntityKind::Primitive(PrimitiveKind::Box), NodeHandle(1));
        assert_eq!(e.description, "Description for Crate");
        assert_eq!(e.button_text, "Select");
        assert!(e.tooltip.enabled);
        assert_eq!(e.tooltip.trigger, TooltipTrigger::OnClick);
        assert!(e.active_script().is_none());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let mut arena = SceneArena::new();
        let a = entity(&mut arena, "Lamp", 1);
        let b = entity(&mut arena, "lamp", 2);
        assert_eq!(arena.find_by_name("lamp"), Some(b));
        assert_eq!(arena.find_by_name("Lamp"), Some(a));
        assert_eq!(arena.find_by_name("LAMP"), Some(a));
        assert_eq!(arena.find_by_name("Chair"), None);
    }

    #[test]
    fn test_removing_last_member_deletes_group() {
        let mut arena = SceneArena::new();
        let a = entity(&mut arena, "A", 1);
        let group = arena.create_group("Solo", &[a], None).unwrap();
        assert_eq!(arena.group_count(), 1);

        let removed = arena.remove_entity(&a).unwrap();
        assert_eq!(removed.deleted_group, Some(group));
        assert_eq!(arena.group_count(), 0);
        assert!(arena.group(&group).is_none());
    }

    #[test]
    fn test_group_survives_partial_removal() {
        let mut arena = SceneArena::new();
        let a = entity(&mut arena, "A", 1);
        let b = entity(&mut arena, "B", 2);
        let group = arena.create_group("Pair", &[a, b], None).unwrap();

        let removed = arena.remove_entity(&a).unwrap();
        assert!(removed.deleted_group.is_none());
        assert_eq!(arena.group(&group).unwrap().members, vec![b]);
        assert_eq!(arena.get(&b).unwrap().group, Some(group));
    }

    #[test]
    fn test_regrouping_moves_members() {
        let mut arena = SceneArena::new();
        let a = entity(&mut arena, "A", 1);
        let first = arena.create_group("First", &[a], None).unwrap();
        let second = arena.create_group("Second", &[a], None).unwrap();

        assert!(arena.group(&first).is_none());
        assert_eq!(arena.get(&a).unwrap().group, Some(second));
        assert!(arena.create_group("Nobody", &[EntityId::new()], None).is_none());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(parse_hex_color("#FF8800").as_deref(), Some("ff8800"));
        assert_eq!(parse_hex_color("00ff00").as_deref(), Some("00ff00"));
        assert!(parse_hex_color("#f80").is_none());
        assert!(parse_hex_color("zzzzzz").is_none());
    }
}
