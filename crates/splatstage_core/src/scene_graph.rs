// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph seam.
//!
//! The rendering engine owns the real node tree. The editor only needs to
//! spawn and move nodes, read world positions and cast rays, so that
//! surface is captured by the [`SceneGraph`] trait. [`MemoryScene`] is an
//! in-process implementation used headless and in tests.
//!
//! Every node carries a [`NodeTag`] pointing back into the editor arena, so
//! resolving a ray hit to its entity is a direct lookup.

use crate::math::{Axis, Ray};
use crate::state::{EntityId, GroupId, Transform};
use glam::{Mat4, Vec3};
use indexmap::IndexMap;

/// Opaque handle to a node owned by the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Back-reference carried by every renderable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeTag {
    /// Not linked to anything the editor knows about
    #[default]
    Untagged,
    /// Geometry of an entity, optionally inside a group
    Entity {
        /// Owning entity
        entity: EntityId,
        /// Group the entity belongs to
        group: Option<GroupId>,
    },
    /// One of the transform gizmo's axis handles
    GizmoHandle(Axis),
    /// The gaussian splat point cloud
    Splat,
    /// Skybox and other backdrop geometry
    Background,
}

/// Volume tested against pick rays, in node-local space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PickShape {
    /// Not pickable
    #[default]
    None,
    /// Sphere centered at the node origin
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Axis-aligned box centered at the node origin
    Cuboid {
        /// Half size along each local axis
        half_extents: Vec3,
    },
    /// Capsule along the local Y axis
    Capsule {
        /// Half length of the core segment
        half_height: f32,
        /// Capsule radius
        radius: f32,
    },
}

/// Everything needed to create a node
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// Parent node, `None` for a root
    pub parent: Option<NodeHandle>,
    /// Local transform
    pub transform: Transform,
    /// Pick volume
    pub shape: PickShape,
    /// Back-reference; `Untagged` inherits the parent's tag
    pub tag: NodeTag,
    /// Initial visibility
    pub visible: bool,
}

impl NodeSpec {
    /// Visible root node with the given tag and shape
    pub fn new(tag: NodeTag, shape: PickShape) -> Self {
        Self {
            tag,
            shape,
            visible: true,
            ..Default::default()
        }
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A ray hit against a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Node that was hit
    pub node: NodeHandle,
    /// The node's tag at the time of the hit
    pub tag: NodeTag,
    /// Distance along the ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// The rendering engine surface the editor depends on
pub trait SceneGraph {
    /// Create a node
    fn spawn(&mut self, spec: NodeSpec) -> NodeHandle;

    /// Remove a node and its descendants. Unknown handles are ignored.
    fn despawn(&mut self, node: NodeHandle);

    /// Set the local transform and refresh the cached world matrices of the
    /// node and its descendants
    fn set_transform(&mut self, node: NodeHandle, transform: &Transform);

    /// Show or hide a node (hidden nodes are not pickable)
    fn set_visible(&mut self, node: NodeHandle, visible: bool);

    /// Replace a node's tag
    fn set_tag(&mut self, node: NodeHandle, tag: NodeTag);

    /// Read a node's tag
    fn tag(&self, node: NodeHandle) -> Option<NodeTag>;

    /// World-space origin of a node
    fn world_position(&self, node: NodeHandle) -> Option<Vec3>;

    /// All hits along the ray, nearest first
    fn intersect(&self, ray: &Ray) -> Vec<Intersection>;
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    local: Transform,
    world: Mat4,
    visible: bool,
    shape: PickShape,
    tag: NodeTag,
}

/// In-memory scene graph with cached world matrices
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: IndexMap<NodeHandle, Node>,
    next_handle: u64,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node exists
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Cached world matrix of a node
    pub fn world_matrix(&self, node: NodeHandle) -> Option<Mat4> {
        self.nodes.get(&node).map(|n| n.world)
    }

    /// Local transform of a node
    pub fn local_transform(&self, node: NodeHandle) -> Option<Transform> {
        self.nodes.get(&node).map(|n| n.local)
    }

    /// Whether the node and all its ancestors are visible
    pub fn is_visible(&self, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            match self.nodes.get(&handle) {
                Some(n) if n.visible => current = n.parent,
                _ => return false,
            }
        }
        true
    }

    fn refresh_world(&mut self, node: NodeHandle) {
        let parent_world = self
            .nodes
            .get(&node)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(&p))
            .map_or(Mat4::IDENTITY, |p| p.world);

        let children = match self.nodes.get_mut(&node) {
            Some(n) => {
                n.world = parent_world * n.local.matrix();
                n.children.clone()
            }
            None => return,
        };

        for child in children {
            self.refresh_world(child);
        }
    }

    fn hit_distance(shape: &PickShape, local: &Ray) -> Option<f32> {
        match *shape {
            PickShape::None => None,
            PickShape::Sphere { radius } => {
                // Ray-sphere intersection (direction not normalized)
                let a = local.direction.dot(local.direction);
                let b = 2.0 * local.origin.dot(local.direction);
                let c = local.origin.dot(local.origin) - radius * radius;
                let discriminant = b * b - 4.0 * a * c;
                if discriminant < 0.0 {
                    return None;
                }
                let sqrt = discriminant.sqrt();
                let near = (-b - sqrt) / (2.0 * a);
                let far = (-b + sqrt) / (2.0 * a);
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    Some(far)
                } else {
                    None
                }
            }
            PickShape::Cuboid { half_extents } => {
                // Slab test
                let mut t_min = f32::NEG_INFINITY;
                let mut t_max = f32::INFINITY;
                for i in 0..3 {
                    let o = local.origin[i];
                    let d = local.direction[i];
                    if d.abs() < crate::math::EPSILON {
                        if o < -half_extents[i] || o > half_extents[i] {
                            return None;
                        }
                        continue;
                    }
                    let t1 = (-half_extents[i] - o) / d;
                    let t2 = (half_extents[i] - o) / d;
                    t_min = t_min.max(t1.min(t2));
                    t_max = t_max.min(t1.max(t2));
                }
                if t_max < t_min || t_max < 0.0 {
                    return None;
                }
                Some(if t_min >= 0.0 { t_min } else { t_max })
            }
            PickShape::Capsule { half_height, radius } => {
                let a = Vec3::new(0.0, -half_height, 0.0);
                let b = Vec3::new(0.0, half_height, 0.0);
                let (t, dist) = local.closest_to_segment(a, b);
                if dist > radius {
                    return None;
                }
                // Step back from the closest approach to the surface
                let speed = local.direction.length();
                let back = (radius * radius - dist * dist).sqrt() / speed.max(crate::math::EPSILON);
                Some((t - back).max(0.0))
            }
        }
    }
}

impl SceneGraph for MemoryScene {
    fn spawn(&mut self, spec: NodeSpec) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;

        let parent = spec.parent.filter(|p| self.nodes.contains_key(p));
        let inherited = parent.and_then(|p| self.nodes.get(&p)).map(|p| p.tag);
        let tag = match (spec.tag, inherited) {
            (NodeTag::Untagged, Some(parent_tag)) => parent_tag,
            (tag, _) => tag,
        };

        self.nodes.insert(
            handle,
            Node {
                parent,
                children: Vec::new(),
                local: spec.transform,
                world: Mat4::IDENTITY,
                visible: spec.visible,
                shape: spec.shape,
                tag,
            },
        );
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.push(handle);
        }
        self.refresh_world(handle);
        handle
    }

    fn despawn(&mut self, node: NodeHandle) {
        let Some(removed) = self.nodes.shift_remove(&node) else {
            return;
        };
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
        for child in removed.children {
            self.despawn(child);
        }
    }

    fn set_transform(&mut self, node: NodeHandle, transform: &Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.local = *transform;
        } else {
            return;
        }
        self.refresh_world(node);
    }

    fn set_visible(&mut self, node: NodeHandle, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn set_tag(&mut self, node: NodeHandle, tag: NodeTag) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.tag = tag;
        }
    }

    fn tag(&self, node: NodeHandle) -> Option<NodeTag> {
        self.nodes.get(&node).map(|n| n.tag)
    }

    fn world_position(&self, node: NodeHandle) -> Option<Vec3> {
        self.nodes.get(&node).map(|n| n.world.w_axis.truncate())
    }

    fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits = Vec::new();

        for (handle, node) in &self.nodes {
            if matches!(node.shape, PickShape::None) || !self.is_visible(*handle) {
                continue;
            }
            let inverse = node.world.inverse();
            if !inverse.is_finite() {
                continue;
            }
            // Unnormalized local direction keeps the ray parameter identical
            // in local and world space
            let local = Ray {
                origin: inverse.transform_point3(ray.origin),
                direction: inverse.transform_vector3(ray.direction),
            };
            if let Some(t) = Self::hit_distance(&node.shape, &local) {
                hits.push(Intersection {
                    node: *handle,
                    tag: node.tag,
                    distance: t,
                    point: ray.at(t),
                });
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
