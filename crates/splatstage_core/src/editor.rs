// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session.
//!
//! [`Editor`] owns the arena, the scene graph seam and every interaction
//! state machine, and exposes the operations a host UI calls: entity
//! lifecycle, property access, pointer events, the per-frame pass, the
//! tooltip override API, camera control and undo.

use crate::camera::{Camera, CameraAnimation, CameraState, Easing, OrbitControls, ScreenAnchor};
use crate::document::SceneDocument;
use crate::error::{Result, StageError};
use crate::gizmo::{DragSession, DragTarget, TransformGizmo};
use crate::group::{self, GroupOp};
use crate::history::{History, TransformSet};
use crate::math::Axis;
use crate::picking::{self, PickTarget};
use crate::scene_graph::{MemoryScene, NodeHandle, NodeSpec, NodeTag, PickShape, SceneGraph};
use crate::script::{Script, ScriptAction, ScriptHost, TooltipCommand};
use crate::settings::EditorSettings;
use crate::state::{
    parse_hex_color, Entity, EntityId, EntityKind, GroupId, PrimitiveKind, SceneArena, Transform,
};
use crate::tooltip::{TooltipBoard, TooltipTrigger};
use glam::{Vec2, Vec3};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Where the new primitives appear
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// Current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected
    #[default]
    None,
    /// A single entity
    Entity(EntityId),
    /// A whole group
    Group(GroupId),
}

/// Which part of the page a pointer press landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRegion {
    /// The 3D canvas
    Canvas,
    /// A tooltip card
    Tooltip,
    /// The sidebar / property panel
    Sidebar,
    /// Anywhere else on the page
    Outside,
}

/// What a pointer press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing happened
    Ignored,
    /// A gizmo drag started on this axis
    DragStarted(Axis),
    /// An entity or group was selected
    Selected(PickTarget),
    /// Empty canvas: selection cleared and click tooltips closed
    Cleared,
    /// Outside the editor: click tooltips closed
    ClosedTooltips,
}

/// A mesh delivered by the GLB import pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMesh {
    /// Mesh name in the file, if it has one
    pub name: Option<String>,
    /// Transform baked from the file's node hierarchy
    pub transform: Transform,
    /// Half extents of the mesh bounds
    pub half_extents: Vec3,
}

/// Entities and group created by an import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportResult {
    /// One entity per mesh
    pub entities: Vec<EntityId>,
    /// Group holding them
    pub group: Option<GroupId>,
}

/// One row of [`Editor::list_tooltips`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipRow {
    /// Entity name
    pub name: String,
    /// Whether a wrapper exists
    pub has_tooltip: bool,
    /// Logical visibility
    pub visible: bool,
    /// Override active
    pub api_override: bool,
    /// Override forces hidden
    pub api_hidden: bool,
    /// Wrapper trigger, `None` without a wrapper
    pub trigger: Option<TooltipTrigger>,
    /// Tooltips enabled for the entity
    pub enabled: bool,
}

/// A visible tooltip ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipOverlay {
    /// Owning entity
    pub entity: EntityId,
    /// Title (entity name)
    pub title: String,
    /// Body text
    pub description: String,
    /// Button label, when the button is shown
    pub button: Option<String>,
    /// Bottom-centre anchor in viewport pixels
    pub anchor: ScreenAnchor,
}

fn missing_entity(id: EntityId) -> StageError {
    tracing::error!("Entity not found: {:?}", id);
    StageError::EntityNotFound(id)
}

fn missing_group(id: GroupId) -> StageError {
    tracing::error!("Group not found: {:?}", id);
    StageError::GroupNotFound(id)
}

fn entity_anchor<S: SceneGraph + ?Sized>(
    arena: &SceneArena,
    scene: &S,
    camera: &Camera,
    id: EntityId,
) -> Option<ScreenAnchor> {
    let entity = arena.get(&id)?;
    if !entity.visible {
        return None;
    }
    camera.anchor_for(scene.world_position(entity.node)?)
}

fn pick_shape(entity: &Entity) -> PickShape {
    match entity.kind {
        EntityKind::Primitive(PrimitiveKind::Sphere) => PickShape::Sphere {
            radius: entity.bounds.max_element(),
        },
        _ => PickShape::Cuboid {
            half_extents: entity.bounds,
        },
    }
}

/// The editing session
pub struct Editor<S: SceneGraph = MemoryScene> {
    arena: SceneArena,
    scene: S,
    camera: Camera,
    controls: OrbitControls,
    animation: Option<CameraAnimation>,
    tooltips: TooltipBoard,
    gizmo: TransformGizmo,
    drag: Option<DragSession>,
    drag_before: TransformSet,
    selection: Selection,
    skybox: NodeHandle,
    history: History,
    settings: EditorSettings,
    next_primitive: usize,
    splat_path: Option<String>,
    skybox_url: Option<String>,
}

impl Editor<MemoryScene> {
    /// Editor over an in-memory scene
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_scene(MemoryScene::new(), settings)
    }
}

impl<S: SceneGraph> Editor<S> {
    /// Editor over a host-provided scene graph
    pub fn with_scene(mut scene: S, settings: EditorSettings) -> Self {
        let camera = settings.camera.build(settings.viewport_size());
        let gizmo = TransformGizmo::spawn(&mut scene, settings.gizmo.handle_length, settings.gizmo.handle_radius);
        let skybox = scene.spawn(
            NodeSpec::new(NodeTag::Background, PickShape::None)
                .with_transform(Transform::from_position(camera.position)),
        );
        let controls = OrbitControls::from_camera(&camera, settings.camera.initial_look_at);
        let history = History::with_max_depth(settings.history_depth);

        Self {
            arena: SceneArena::new(),
            scene,
            camera,
            controls,
            animation: None,
            tooltips: TooltipBoard::new(),
            gizmo,
            drag: None,
            drag_before: Vec::new(),
            selection: Selection::None,
            skybox,
            history,
            settings,
            next_primitive: 1,
            splat_path: None,
            skybox_url: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors

    /// Entity/group arena
    pub fn arena(&self) -> &SceneArena {
        &self.arena
    }

    /// Look up an entity
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    /// Scene graph
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Active camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Orbit controls
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Tooltip wrappers
    pub fn tooltips(&self) -> &TooltipBoard {
        &self.tooltips
    }

    /// Transform gizmo
    pub fn gizmo(&self) -> &TransformGizmo {
        &self.gizmo
    }

    /// Active drag gesture
    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Current selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Settings in use
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Skybox node
    pub fn skybox(&self) -> NodeHandle {
        self.skybox
    }

    /// Resize the camera viewport
    pub fn set_viewport(&mut self, size: Vec2) {
        if size.x > 0.0 && size.y > 0.0 {
            self.camera.viewport = size;
        }
    }

    /// Splat file and skybox URL written into captured documents
    pub fn set_environment(&mut self, splat_path: Option<String>, skybox_url: Option<String>) {
        self.splat_path = splat_path;
        self.skybox_url = skybox_url;
    }

    fn anchor(&self, id: EntityId) -> Option<ScreenAnchor> {
        entity_anchor(&self.arena, &self.scene, &self.camera, id)
    }

    fn snapshot(&self, ids: &[EntityId]) -> TransformSet {
        ids.iter()
            .filter_map(|id| self.arena.get(id).map(|e| (*id, e.transform)))
            .collect()
    }

    fn record(&mut self, description: &str, before: &[(EntityId, Transform)], after: &[(EntityId, Transform)]) {
        if let Err(e) = self.history.record(description, before, after) {
            tracing::error!("Failed to record {}: {}", description, e);
        }
    }

    fn retag(&mut self, id: &EntityId) {
        if let Some(entity) = self.arena.get(id) {
            self.scene.set_tag(
                entity.node,
                NodeTag::Entity {
                    entity: entity.id,
                    group: entity.group,
                },
            );
        }
    }

    // ------------------------------------------------------------------
    // Entity lifecycle

    fn insert(&mut self, mut entity: Entity) -> EntityId {
        let node = self.scene.spawn(
            NodeSpec::new(NodeTag::Untagged, pick_shape(&entity)).with_transform(entity.transform),
        );
        self.scene.set_visible(node, entity.visible);
        entity.node = node;
        let id = self.arena.insert_entity(entity);
        self.retag(&id);
        self.attach_tooltip(id);
        id
    }

    fn attach_tooltip(&mut self, id: EntityId) {
        let Some(entity) = self.arena.get(&id) else {
            return;
        };
        if entity.tooltip.enabled {
            let trigger = entity.tooltip.trigger;
            let anchor = self.anchor(id);
            self.tooltips.attach(id, trigger, anchor);
        }
    }

    /// Add a primitive named `<Kind>_<n>` at the spawn position
    pub fn add_primitive(&mut self, kind: PrimitiveKind) -> EntityId {
        let name = format!("{}_{}", kind.name(), self.next_primitive);
        self.next_primitive += 1;

        let mut entity = Entity::new(name, EntityKind::Primitive(kind), NodeHandle(0));
        entity.transform = Transform::from_position(SPAWN_POSITION);
        entity.tooltip.trigger = self.settings.default_trigger;
        let id = self.insert(entity);
        tracing::info!("Added {:?} {:?}", kind, id);
        id
    }

    /// Add the meshes of an imported file, one entity each, grouped under
    /// the file stem and selected. An import with no meshes does nothing.
    pub fn import_meshes(&mut self, source_file: &str, meshes: Vec<ImportedMesh>) -> ImportResult {
        if meshes.is_empty() {
            tracing::warn!("No meshes found in {}", source_file);
            return ImportResult::default();
        }
        let stem = Path::new(source_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(source_file)
            .to_string();

        let mut entities = Vec::with_capacity(meshes.len());
        for (index, mesh) in meshes.into_iter().enumerate() {
            let name = mesh
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("{}_part_{}", stem, index + 1));
            let mut entity = Entity::new(name.clone(), EntityKind::MeshPart { mesh_name: name }, NodeHandle(0));
            entity.transform = mesh.transform;
            entity.bounds = mesh.half_extents;
            entity.source_file = Some(source_file.to_string());
            entity.tooltip.trigger = self.settings.default_trigger;
            entities.push(self.insert(entity));
        }

        let group = self.create_group(&stem, &entities, Some(source_file.to_string()));
        if let Some(group) = group {
            self.select(Selection::Group(group));
        }
        tracing::info!("Imported {} meshes from {}", entities.len(), source_file);
        ImportResult { entities, group }
    }

    /// Group existing entities. Members leave their previous groups.
    pub fn create_group(&mut self, name: &str, members: &[EntityId], source_file: Option<String>) -> Option<GroupId> {
        let previous: Vec<GroupId> = members
            .iter()
            .filter_map(|m| self.arena.get(m).and_then(|e| e.group))
            .collect();
        let group = self.arena.create_group(name, members, source_file)?;
        for member in members {
            self.retag(member);
        }
        if let Selection::Group(selected) = self.selection {
            if previous.contains(&selected) && self.arena.group(&selected).is_none() {
                self.clear_selection();
            }
        }
        Some(group)
    }

    /// Remove an entity with its tooltip, node and group membership
    pub fn remove_entity(&mut self, id: EntityId) -> Result<()> {
        if !self.arena.contains(&id) {
            return Err(missing_entity(id));
        }

        let dragging_it = match self.drag.as_ref().map(DragSession::target) {
            Some(DragTarget::Entity(target)) => target == id,
            Some(DragTarget::Group(group)) => self.arena.get(&id).and_then(|e| e.group) == Some(group),
            None => false,
        };
        if dragging_it {
            self.end_drag();
        }

        self.tooltips.detach(&id);
        let Some(removed) = self.arena.remove_entity(&id) else {
            return Err(missing_entity(id));
        };
        self.scene.despawn(removed.entity.node);
        self.history.forget(&id);

        match self.selection {
            Selection::Entity(selected) if selected == id => self.clear_selection(),
            Selection::Group(group) if removed.deleted_group == Some(group) => self.clear_selection(),
            _ => {}
        }
        tracing::info!("Removed {} ({:?})", removed.entity.name, id);
        Ok(())
    }

    /// Remove every entity and group
    pub fn clear(&mut self) {
        self.end_drag();
        self.clear_selection();
        for entity in self.arena.entities() {
            self.scene.despawn(entity.node);
        }
        self.arena.clear();
        self.tooltips.clear();
        self.history.clear();
        self.next_primitive = 1;
    }

    // ------------------------------------------------------------------
    // Property panel access

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.arena.get_mut(&id).ok_or_else(|| missing_entity(id))
    }

    /// Rename an entity
    pub fn set_name(&mut self, id: EntityId, name: &str) -> Result<()> {
        self.entity_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Set the tooltip body
    pub fn set_description(&mut self, id: EntityId, description: &str) -> Result<()> {
        self.entity_mut(id)?.description = description.to_string();
        Ok(())
    }

    /// Set the tooltip button label
    pub fn set_button_text(&mut self, id: EntityId, text: &str) -> Result<()> {
        self.entity_mut(id)?.button_text = text.to_string();
        Ok(())
    }

    /// Attach or clear the action script. A script that does not parse is
    /// stored anyway and reported when it runs.
    pub fn set_script(&mut self, id: EntityId, script: Option<String>) -> Result<()> {
        if let Some(Err(e)) = script.as_deref().map(Script::parse) {
            tracing::warn!("Script for {:?} does not parse: {}", id, e);
        }
        self.entity_mut(id)?.script = script;
        Ok(())
    }

    fn write_transform(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        let entity = self.entity_mut(id)?;
        entity.transform = transform;
        let node = entity.node;
        self.scene.set_transform(node, &transform);
        Ok(())
    }

    fn edit_transform(&mut self, id: EntityId, description: &str, edit: impl FnOnce(&mut Transform)) -> Result<()> {
        let before = self.arena.get(&id).ok_or_else(|| missing_entity(id))?.transform;
        let mut after = before;
        edit(&mut after);
        if !after.is_finite() {
            tracing::error!("Rejected {} for {:?}: {:?}", description, id, after);
            return Err(StageError::InvalidTransform(format!("{:?}", after)));
        }
        self.write_transform(id, after)?;
        self.record(description, &[(id, before)], &[(id, after)]);
        Ok(())
    }

    /// Set position
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<()> {
        self.edit_transform(id, "Set position", |t| t.position = position)
    }

    /// Set euler rotation (radians)
    pub fn set_rotation(&mut self, id: EntityId, rotation: Vec3) -> Result<()> {
        self.edit_transform(id, "Set rotation", |t| t.rotation = rotation)
    }

    /// Set scale
    pub fn set_scale(&mut self, id: EntityId, scale: Vec3) -> Result<()> {
        self.edit_transform(id, "Set scale", |t| t.scale = scale)
    }

    /// Set the base color from `#rrggbb`
    pub fn set_color(&mut self, id: EntityId, color: &str) -> Result<()> {
        let hex = parse_hex_color(color).ok_or_else(|| StageError::InvalidColor(color.to_string()))?;
        self.entity_mut(id)?.material.color = hex;
        Ok(())
    }

    /// Show or hide an entity
    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> Result<()> {
        let entity = self.entity_mut(id)?;
        entity.visible = visible;
        let node = entity.node;
        self.scene.set_visible(node, visible);
        Ok(())
    }

    /// Enable or disable tooltips; enabling constructs the wrapper,
    /// disabling destroys it
    pub fn set_tooltip_enabled(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.entity_mut(id)?.tooltip.enabled = enabled;
        if enabled {
            if !self.tooltips.contains(&id) {
                self.attach_tooltip(id);
            }
        } else {
            self.tooltips.detach(&id);
        }
        Ok(())
    }

    /// Change the tooltip trigger
    pub fn set_tooltip_trigger(&mut self, id: EntityId, trigger: TooltipTrigger) -> Result<()> {
        self.entity_mut(id)?.tooltip.trigger = trigger;
        let anchor = self.anchor(id);
        self.tooltips.set_trigger(&id, trigger, anchor);
        Ok(())
    }

    /// Show or hide the tooltip's action button
    pub fn set_tooltip_button(&mut self, id: EntityId, show: bool) -> Result<()> {
        self.entity_mut(id)?.tooltip.show_button = show;
        Ok(())
    }

    /// Show or hide every member of a group
    pub fn set_group_visible(&mut self, group: GroupId, visible: bool) -> Result<()> {
        let record = self.arena.group_mut(&group).ok_or_else(|| missing_group(group))?;
        record.visible = visible;
        let members = record.members.clone();
        for member in members {
            self.set_visible(member, visible)?;
        }
        Ok(())
    }

    /// Mean position of a group's members
    pub fn group_centroid(&self, group: GroupId) -> Result<Vec3> {
        group::centroid(&self.arena, &group)
    }

    fn group_members(&self, group: GroupId) -> Result<Vec<EntityId>> {
        self.arena
            .group(&group)
            .map(|g| g.members.clone())
            .ok_or_else(|| missing_group(group))
    }

    /// Translate, rotate or scale a group about its centroid
    pub fn apply_group_op(&mut self, group: GroupId, op: GroupOp) -> Result<()> {
        let members = self.group_members(group)?;
        let before = self.snapshot(&members);
        group::apply_group_op(&mut self.arena, &mut self.scene, &group, op)?;
        let after = self.snapshot(&members);
        self.record("Group transform", &before, &after);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection

    /// Select an entity or group and place the gizmo on it
    pub fn select(&mut self, selection: Selection) {
        let position = match selection {
            Selection::None => None,
            Selection::Entity(id) => self.arena.get(&id).map(|e| e.transform.position),
            Selection::Group(group) => self.group_centroid(group).ok(),
        };
        match position {
            Some(position) => {
                self.selection = selection;
                self.gizmo.move_to(&mut self.scene, position);
                self.gizmo.set_visible(&mut self.scene, true);
            }
            None => self.clear_selection(),
        }
    }

    /// Deselect and hide the gizmo
    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
        self.gizmo.set_visible(&mut self.scene, false);
    }

    fn selection_target(&self) -> Option<DragTarget> {
        match self.selection {
            Selection::None => None,
            Selection::Entity(id) => Some(DragTarget::Entity(id)),
            Selection::Group(group) => Some(DragTarget::Group(group)),
        }
    }

    fn drag_members(&self, target: DragTarget) -> Vec<EntityId> {
        match target {
            DragTarget::Entity(id) => vec![id],
            DragTarget::Group(group) => self.group_members(group).unwrap_or_default(),
        }
    }

    // ------------------------------------------------------------------
    // Pointer events

    /// Pointer moved to `pos` (viewport pixels). Drives an active drag, or
    /// hover tooltips otherwise.
    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.drag.is_some() {
            self.update_drag(pos);
            return;
        }
        let ray = self.camera.ray_from_screen(pos);
        let hovered = picking::pick(&self.scene, &self.arena, &ray).map(|p| p.entity);
        let (arena, scene, camera) = (&self.arena, &self.scene, &self.camera);
        self.tooltips
            .hover(hovered, |id| entity_anchor(arena, scene, camera, id));
    }

    /// Pointer pressed at `pos` over `region`
    pub fn pointer_down(&mut self, pos: Vec2, region: PointerRegion) -> PointerOutcome {
        match region {
            PointerRegion::Tooltip | PointerRegion::Sidebar => return PointerOutcome::Ignored,
            PointerRegion::Outside => {
                self.tooltips.close_click_tooltips();
                return PointerOutcome::ClosedTooltips;
            }
            PointerRegion::Canvas => {}
        }

        let ray = self.camera.ray_from_screen(pos);

        if let Some(target) = self.selection_target() {
            if let Some(session) = self.gizmo.begin_drag(&self.scene, &ray, target) {
                let axis = session.axis();
                self.drag_before = self.snapshot(&self.drag_members(target));
                self.drag = Some(session);
                self.controls.enabled = false;
                return PointerOutcome::DragStarted(axis);
            }
        }

        let Some(pick) = picking::pick(&self.scene, &self.arena, &ray) else {
            self.clear_selection();
            self.tooltips.close_click_tooltips();
            return PointerOutcome::Cleared;
        };

        match pick.target() {
            PickTarget::Group(group) => self.select(Selection::Group(group)),
            PickTarget::Entity(id) => {
                // Script failures are logged and never interrupt the click
                let _ = self.run_script(id);
                let anchor = self.anchor(id);
                self.tooltips.click(id, anchor);
                self.select(Selection::Entity(id));
            }
        }
        PointerOutcome::Selected(pick.target())
    }

    /// Pointer released
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    /// The tooltip's action button was pressed. The click never reaches
    /// the canvas; the entity's script runs and the entity is selected.
    pub fn press_tooltip_button(&mut self, id: EntityId) -> Result<()> {
        if !self.arena.contains(&id) {
            return Err(missing_entity(id));
        }
        let _ = self.run_script(id);
        self.select(Selection::Entity(id));
        Ok(())
    }

    fn update_drag(&mut self, pos: Vec2) {
        let ray = self.camera.ray_from_screen(pos);
        let view = self.camera.view_direction();
        let Some(session) = self.drag.as_mut() else {
            return;
        };
        let Some(delta) = session.update(&ray, view) else {
            return;
        };
        let offset = session.constrain(delta);

        let moved = match session.target() {
            DragTarget::Entity(id) => match self.arena.get(&id).map(|e| e.transform) {
                Some(mut transform) => {
                    transform.position += offset;
                    self.write_transform(id, transform).map(|_| transform.position)
                }
                None => Err(StageError::EntityNotFound(id)),
            },
            DragTarget::Group(group) => {
                group::apply_group_op(&mut self.arena, &mut self.scene, &group, GroupOp::Translate(offset))
                    .and_then(|_| group::centroid(&self.arena, &group))
            }
        };

        match moved {
            Ok(position) => self.gizmo.move_to(&mut self.scene, position),
            Err(e) => {
                tracing::warn!("Drag target lost: {}", e);
                self.end_drag();
            }
        }
    }

    /// Finish any drag gesture and re-enable camera controls. Safe to call
    /// at any time, any number of times.
    pub fn end_drag(&mut self) {
        self.controls.enabled = true;
        let Some(mut session) = self.drag.take() else {
            self.drag_before.clear();
            return;
        };
        session.finish();

        let before = std::mem::take(&mut self.drag_before);
        let ids: Vec<EntityId> = before.iter().map(|(id, _)| *id).collect();
        let after = self.snapshot(&ids);
        let before: TransformSet = before.into_iter().filter(|(id, _)| self.arena.contains(id)).collect();
        self.record(&format!("Drag {}", session.axis().name()), &before, &after);
    }

    // ------------------------------------------------------------------
    // Scripts

    /// Run an entity's script. Errors are logged against the entity.
    pub fn run_script(&mut self, id: EntityId) -> Result<usize> {
        let entity = self.arena.get(&id).ok_or_else(|| missing_entity(id))?;
        let Some(source) = entity.active_script().map(str::to_string) else {
            return Ok(0);
        };

        let outcome = Script::parse(&source).and_then(|script| {
            let mut scope = ScriptScope { editor: self, entity: id };
            script.run(&mut scope)
        });
        outcome.map_err(|error| {
            tracing::error!("Script error for model {:?}: {}", id, error);
            StageError::Script { entity: id, source: error }
        })
    }

    // ------------------------------------------------------------------
    // Per-frame pass

    /// Advance animations and refresh everything that follows the camera
    /// or the selection. Idempotent for `dt == 0`.
    pub fn frame(&mut self, dt: Duration) {
        if let Some(animation) = self.animation.as_mut() {
            if animation.advance(&mut self.camera, dt) {
                self.animation = None;
                tracing::debug!("Camera animation finished");
            }
            self.sync_controls(None);
        } else if let Some(limits) = self.settings.camera.limits {
            if limits.clamp(&mut self.camera) {
                self.sync_controls(Some(limits.target));
            }
        }

        self.scene
            .set_transform(self.skybox, &Transform::from_position(self.camera.position));

        if self.drag.is_none() {
            let follow = match self.selection {
                Selection::None => None,
                Selection::Entity(id) => self.arena.get(&id).map(|e| e.transform.position),
                Selection::Group(group) => self.group_centroid(group).ok(),
            };
            match follow {
                Some(position) => self.gizmo.move_to(&mut self.scene, position),
                None if self.selection != Selection::None => self.clear_selection(),
                None => {}
            }
        }

        let (arena, scene, camera) = (&self.arena, &self.scene, &self.camera);
        self.tooltips
            .refresh(|id| entity_anchor(arena, scene, camera, id));
    }

    /// Visible tooltips with their content
    pub fn tooltip_overlays(&self) -> Vec<TooltipOverlay> {
        self.tooltips
            .iter()
            .filter(|w| w.is_visible())
            .filter_map(|w| {
                let entity = self.arena.get(&w.entity())?;
                Some(TooltipOverlay {
                    entity: entity.id,
                    title: entity.name.clone(),
                    description: entity.description.clone(),
                    button: entity.tooltip.show_button.then(|| entity.button_text.clone()),
                    anchor: w.anchor()?,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Tooltip override API

    fn find(&self, name: &str) -> Result<EntityId> {
        self.arena.find_by_name(name).ok_or_else(|| {
            tracing::error!("Model with name \"{}\" not found", name);
            StageError::NameNotFound(name.to_string())
        })
    }

    fn no_tooltip(name: &str) -> StageError {
        tracing::warn!("No tooltip found for model \"{}\"", name);
        StageError::TooltipNotFound(name.to_string())
    }

    /// Force a tooltip hidden, whatever its trigger
    pub fn hide_tooltip(&mut self, name: &str) -> Result<()> {
        let id = self.find(name)?;
        if !self.tooltips.hide(&id) {
            return Err(Self::no_tooltip(name));
        }
        tracing::info!("Tooltip hidden for model: {}", name);
        Ok(())
    }

    /// Force a tooltip visible
    pub fn show_tooltip(&mut self, name: &str) -> Result<()> {
        let id = self.find(name)?;
        if self.arena.get(&id).is_some_and(|e| !e.tooltip.enabled) {
            tracing::warn!("Tooltips are disabled for model \"{}\"", name);
            return Err(StageError::TooltipsDisabled(name.to_string()));
        }
        let anchor = self.anchor(id);
        if !self.tooltips.show(&id, anchor) {
            return Err(Self::no_tooltip(name));
        }
        tracing::info!("Tooltip shown for model: {}", name);
        Ok(())
    }

    /// Flip a tooltip under override. Returns the new visibility.
    pub fn toggle_tooltip(&mut self, name: &str) -> Result<bool> {
        let id = self.find(name)?;
        match self.tooltips.visibility(&id) {
            None => Err(Self::no_tooltip(name)),
            Some(true) => self.hide_tooltip(name).map(|_| false),
            Some(false) => self.show_tooltip(name).map(|_| true),
        }
    }

    /// Force every tooltip hidden. Returns how many.
    pub fn hide_all_tooltips(&mut self) -> usize {
        let count = self.tooltips.hide_all();
        tracing::info!("Hidden {} tooltips", count);
        count
    }

    /// Clear every override on enabled entities, letting triggers decide.
    /// Returns how many `always` tooltips came back visible.
    pub fn show_all_tooltips(&mut self) -> usize {
        let (arena, scene, camera) = (&self.arena, &self.scene, &self.camera);
        let (_, visible) = self.tooltips.release_all(
            |id| arena.get(&id).is_some_and(|e| e.tooltip.enabled),
            |id| entity_anchor(arena, scene, camera, id),
        );
        tracing::info!("Shown {} tooltips (respecting trigger settings)", visible);
        visible
    }

    /// Release the override on one tooltip, or on all of them. Returns the
    /// number released.
    pub fn release_tooltip_override(&mut self, name: Option<&str>) -> Result<usize> {
        match name {
            Some(name) => {
                let id = self.find(name)?;
                let anchor = self.anchor(id);
                if !self.tooltips.release(&id, anchor) {
                    return Err(Self::no_tooltip(name));
                }
                tracing::info!("Released API override for model: {}", name);
                Ok(1)
            }
            None => {
                let (arena, scene, camera) = (&self.arena, &self.scene, &self.camera);
                let (released, _) = self
                    .tooltips
                    .release_all(|_| true, |id| entity_anchor(arena, scene, camera, id));
                tracing::info!("Released API override for {} tooltips", released);
                Ok(released)
            }
        }
    }

    /// Logical visibility of a tooltip
    pub fn tooltip_visibility(&self, name: &str) -> Result<bool> {
        let id = self.find(name)?;
        self.tooltips.visibility(&id).ok_or_else(|| Self::no_tooltip(name))
    }

    /// Tooltip status of every entity, in arena order
    pub fn list_tooltips(&self) -> Vec<TooltipRow> {
        self.arena
            .entities()
            .map(|entity| {
                let wrapper = self.tooltips.get(&entity.id);
                TooltipRow {
                    name: entity.name.clone(),
                    has_tooltip: wrapper.is_some(),
                    visible: wrapper.is_some_and(|w| w.state().is_visible()),
                    api_override: wrapper.is_some_and(|w| w.is_overridden()),
                    api_hidden: wrapper.is_some_and(|w| w.is_override_hidden()),
                    trigger: wrapper.map(|w| w.trigger()),
                    enabled: entity.tooltip.enabled,
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Camera API

    fn sync_controls(&mut self, target: Option<Vec3>) {
        let enabled = self.controls.enabled;
        let target = target.unwrap_or(self.controls.target);
        self.controls = OrbitControls {
            enabled,
            ..OrbitControls::from_camera(&self.camera, target)
        };
    }

    fn check_finite(what: &str, values: &[Vec3]) -> Result<()> {
        if values.iter().all(|v| crate::math::is_finite(*v)) {
            Ok(())
        } else {
            tracing::error!("Invalid camera {}: {:?}", what, values);
            Err(StageError::Camera(format!("{} must be finite", what)))
        }
    }

    /// Place the camera. Cancels any running animation.
    pub fn set_camera(&mut self, position: Vec3, look_at: Option<Vec3>, up: Option<Vec3>) -> Result<()> {
        Self::check_finite("position", &[position])?;
        let extras: Vec<Vec3> = look_at.into_iter().chain(up).collect();
        Self::check_finite("orientation", &extras)?;

        self.animation = None;
        self.camera.position = position;
        if let Some(up) = up {
            self.camera.up = up;
        }
        if let Some(target) = look_at {
            self.camera.look_at(target);
        }
        self.sync_controls(look_at);
        Ok(())
    }

    /// Current camera pose
    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    /// Restore the initial pose from settings
    pub fn reset_camera(&mut self) {
        let viewport = self.camera.viewport;
        self.animation = None;
        self.camera = self.settings.camera.build(viewport);
        self.sync_controls(Some(self.settings.camera.initial_look_at));
        tracing::info!("Camera reset");
    }

    /// Offset the camera position
    pub fn move_camera(&mut self, offset: Vec3) -> Result<()> {
        Self::check_finite("offset", &[offset])?;
        self.animation = None;
        self.camera.position += offset;
        self.controls.target += offset;
        self.sync_controls(None);
        Ok(())
    }

    /// Aim the camera
    pub fn look_at(&mut self, target: Vec3) -> Result<()> {
        Self::check_finite("target", &[target])?;
        self.camera.look_at(target);
        self.sync_controls(Some(target));
        Ok(())
    }

    /// Fly to a pose over `duration`
    pub fn animate_camera_to(&mut self, position: Vec3, look_at: Vec3, duration: Duration, easing: Easing) -> Result<()> {
        Self::check_finite("animation target", &[position, look_at])?;
        self.animation = Some(CameraAnimation::fly_to(&self.camera, position, look_at, duration, easing));
        Ok(())
    }

    /// Circle `center` between two angles (radians)
    pub fn orbit_camera(
        &mut self,
        center: Vec3,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        duration: Duration,
        easing: Easing,
    ) -> Result<()> {
        Self::check_finite("orbit center", &[center])?;
        if !(radius.is_finite() && radius > 0.0 && start_angle.is_finite() && end_angle.is_finite()) {
            return Err(StageError::Camera("orbit radius and angles must be finite, radius positive".into()));
        }
        self.animation = Some(CameraAnimation::orbit(center, radius, start_angle, end_angle, duration, easing));
        Ok(())
    }

    /// Jump to the first point and fly through the rest, looking at the
    /// origin. Needs at least two points.
    pub fn move_camera_along_path(&mut self, points: &[Vec3], per_point: Duration, easing: Easing) -> Result<()> {
        if points.len() < 2 {
            tracing::error!("Camera path needs at least 2 points, got {}", points.len());
            return Err(StageError::Camera("path needs at least 2 points".into()));
        }
        Self::check_finite("path point", points)?;
        self.animation = CameraAnimation::path(&mut self.camera, points, per_point, easing);
        Ok(())
    }

    /// Cancel the running animation. Returns whether one was running.
    pub fn stop_camera_animation(&mut self) -> bool {
        let was_running = self.animation.take().is_some();
        if was_running {
            self.sync_controls(None);
        }
        was_running
    }

    /// Whether a camera animation is running
    pub fn is_camera_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Orbit the view from pointer movement. Ignored while a drag holds
    /// the controls.
    pub fn orbit_view(&mut self, delta: Vec2) -> bool {
        if !self.controls.orbit(delta.x, delta.y) {
            return false;
        }
        self.animation = None;
        self.controls.apply(&mut self.camera);
        true
    }

    /// Pan the view from pointer movement
    pub fn pan_view(&mut self, delta: Vec2) -> bool {
        if !self.controls.pan(&self.camera, delta.x, delta.y) {
            return false;
        }
        self.animation = None;
        self.controls.apply(&mut self.camera);
        true
    }

    /// Zoom the view
    pub fn zoom_view(&mut self, delta: f32) -> bool {
        if !self.controls.zoom(delta) {
            return false;
        }
        self.animation = None;
        self.controls.apply(&mut self.camera);
        true
    }

    // ------------------------------------------------------------------
    // Documents and history

    /// Replace the scene with a document's contents. Returns the number of
    /// entities created.
    pub fn load_document(&mut self, doc: &SceneDocument) -> usize {
        self.clear();
        self.splat_path = doc.splat_path.clone();
        self.skybox_url = doc.skybox.clone();

        let ids: Vec<EntityId> = doc
            .models
            .iter()
            .map(|record| self.insert(record.to_entity(NodeHandle(0))))
            .collect();

        for group in doc.resolve_groups(&ids) {
            if self
                .arena
                .create_group_with_id(group.id, group.name, &group.members, group.source_file)
                .is_some()
            {
                for member in &group.members {
                    self.retag(member);
                }
            }
        }
        self.next_primitive = ids.len() + 1;
        tracing::info!("Loaded {} models, {} groups", ids.len(), self.arena.group_count());
        ids.len()
    }

    /// Snapshot the scene as a document
    pub fn capture_document(&self) -> SceneDocument {
        SceneDocument {
            splat_path: self.splat_path.clone(),
            skybox: self.skybox_url.clone(),
            ..SceneDocument::capture(&self.arena)
        }
    }

    fn restore(&mut self, transforms: TransformSet) -> usize {
        let mut applied = 0;
        for (id, transform) in transforms {
            if self.write_transform(id, transform).is_ok() {
                applied += 1;
            }
        }
        applied
    }

    /// Undo the last transform edit. Returns the number of entities moved.
    pub fn undo(&mut self) -> Result<usize> {
        let transforms = self.history.undo()?;
        Ok(self.restore(transforms))
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Result<usize> {
        let transforms = self.history.redo()?;
        Ok(self.restore(transforms))
    }
}

/// Capabilities handed to an entity's script
struct ScriptScope<'a, S: SceneGraph> {
    editor: &'a mut Editor<S>,
    entity: EntityId,
}

impl<S: SceneGraph> ScriptHost for ScriptScope<'_, S> {
    fn perform(&mut self, action: &ScriptAction) -> std::result::Result<(), String> {
        let editor = &mut *self.editor;
        let id = self.entity;
        let result = match action {
            ScriptAction::Log(text) => {
                let name = editor.entity(&id).map(|e| e.name.clone()).unwrap_or_default();
                tracing::info!("[{}] {}", name, text);
                Ok(())
            }
            ScriptAction::SetVisible(visible) => editor.set_visible(id, *visible),
            ScriptAction::Translate(offset) => editor.edit_transform(id, "Script translate", |t| t.position += *offset),
            ScriptAction::SetColor(color) => editor.set_color(id, color),
            ScriptAction::Tooltip { command, name } => match command {
                TooltipCommand::Show => editor.show_tooltip(name),
                TooltipCommand::Hide => editor.hide_tooltip(name),
                TooltipCommand::Toggle => editor.toggle_tooltip(name).map(|_| ()),
                TooltipCommand::Release => editor.release_tooltip_override(Some(name)).map(|_| ()),
            },
            ScriptAction::CameraSet { position, look_at } => editor.set_camera(*position, *look_at, None),
            ScriptAction::CameraMove(offset) => editor.move_camera(*offset),
            ScriptAction::CameraLookAt(target) => editor.look_at(*target),
            ScriptAction::CameraReset => {
                editor.reset_camera();
                Ok(())
            }
            ScriptAction::CameraFly {
                position,
                look_at,
                duration,
            } => editor.animate_camera_to(*position, *look_at, *duration, Easing::default()),
            ScriptAction::CameraStop => {
                editor.stop_camera_animation();
                Ok(())
            }
        };
        result.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;
    use crate::tooltip::TooltipState;

    const STEP: Duration = Duration::from_millis(16);

    fn editor() -> Editor {
        Editor::new(EditorSettings::default())
    }

    fn screen_of(editor: &Editor, world: Vec3) -> Vec2 {
        editor.camera().anchor_for(world).expect("point on screen").to_vec2()
    }

    /// A point on the front face of a unit box at the spawn position, away
    /// from the gizmo handles
    fn front_face(entity_position: Vec3) -> Vec3 {
        entity_position + Vec3::new(-0.3, -0.3, 0.5)
    }

    fn click_entity(editor: &mut Editor, id: EntityId) -> PointerOutcome {
        let position = editor.entity(&id).unwrap().transform.position;
        let pos = screen_of(editor, front_face(position));
        let outcome = editor.pointer_down(pos, PointerRegion::Canvas);
        editor.pointer_up();
        outcome
    }

    fn visible(editor: &Editor, id: EntityId) -> bool {
        editor.tooltips().get(&id).unwrap().is_visible()
    }

    #[test]
    fn test_add_primitive_defaults() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        let entity = editor.entity(&id).unwrap();
        assert_eq!(entity.name, "Box_1");
        assert_eq!(entity.transform.position, SPAWN_POSITION);
        assert_eq!(entity.tooltip.trigger, TooltipTrigger::OnClick);
        assert!(editor.tooltips().contains(&id));
        assert_eq!(
            editor.scene().tag(entity.node),
            Some(NodeTag::Entity { entity: id, group: None })
        );
        let sphere = editor.add_primitive(PrimitiveKind::Sphere);
        assert_eq!(editor.entity(&sphere).unwrap().name, "Sphere_2");
    }

    #[test]
    fn test_onclick_tooltip_scenario() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        editor.frame(STEP);
        assert!(!visible(&editor, id));

        assert_eq!(click_entity(&mut editor, id), PointerOutcome::Selected(PickTarget::Entity(id)));
        editor.frame(STEP);
        assert!(visible(&editor, id));
        assert_eq!(editor.tooltip_overlays().len(), 1);

        // Empty canvas in the top-left corner
        let outcome = editor.pointer_down(Vec2::new(5.0, 5.0), PointerRegion::Canvas);
        assert_eq!(outcome, PointerOutcome::Cleared);
        assert!(!visible(&editor, id));
        assert_eq!(editor.selection(), Selection::None);
        assert!(!editor.gizmo().is_visible());
    }

    #[test]
    fn test_click_parity() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        for n in 1..=5 {
            click_entity(&mut editor, id);
            editor.frame(STEP);
            assert_eq!(visible(&editor, id), n % 2 == 1, "after {} clicks", n);
        }
    }

    #[test]
    fn test_regions() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        click_entity(&mut editor, id);

        assert_eq!(editor.pointer_down(Vec2::new(5.0, 5.0), PointerRegion::Tooltip), PointerOutcome::Ignored);
        assert_eq!(editor.pointer_down(Vec2::new(5.0, 5.0), PointerRegion::Sidebar), PointerOutcome::Ignored);
        assert!(visible(&editor, id));

        assert_eq!(
            editor.pointer_down(Vec2::new(5.0, 5.0), PointerRegion::Outside),
            PointerOutcome::ClosedTooltips
        );
        assert!(!visible(&editor, id));
        // Selection survives clicks outside the canvas
        assert_eq!(editor.selection(), Selection::Entity(id));
    }

    #[test]
    fn test_always_tooltip_follows_screen() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        editor.set_tooltip_trigger(id, TooltipTrigger::Always).unwrap();
        editor.frame(STEP);
        assert!(visible(&editor, id));

        // Pointer activity does not matter
        editor.pointer_move(Vec2::new(5.0, 5.0));
        editor.pointer_down(Vec2::new(5.0, 5.0), PointerRegion::Canvas);
        editor.frame(STEP);
        assert!(visible(&editor, id));

        // Turn around: the entity is behind the camera
        let behind = editor.camera().position * 2.0 - SPAWN_POSITION;
        editor.look_at(behind).unwrap();
        editor.frame(STEP);
        assert!(!visible(&editor, id));
        assert!(editor.tooltip_overlays().is_empty());
    }

    #[test]
    fn test_single_hover_tooltip() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        let b = editor.add_primitive(PrimitiveKind::Box);
        editor.set_position(a, Vec3::new(-1.0, 0.5, 0.0)).unwrap();
        editor.set_position(b, Vec3::new(1.0, 0.5, 0.0)).unwrap();
        editor.set_tooltip_trigger(a, TooltipTrigger::OnHover).unwrap();
        editor.set_tooltip_trigger(b, TooltipTrigger::OnHover).unwrap();

        let over_a = screen_of(&editor, Vec3::new(-1.0, 0.5, 0.5));
        let over_b = screen_of(&editor, Vec3::new(1.0, 0.5, 0.5));

        editor.pointer_move(over_a);
        assert!(visible(&editor, a));
        editor.pointer_move(over_b);
        assert!(!visible(&editor, a));
        assert!(visible(&editor, b));
        editor.pointer_move(Vec2::new(5.0, 5.0));
        assert!(!visible(&editor, b));
    }

    #[test]
    fn test_off_screen_hides_hover_and_click_tooltips() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        let b = editor.add_primitive(PrimitiveKind::Box);
        editor.set_position(a, Vec3::new(-1.0, 0.5, 0.0)).unwrap();
        editor.set_position(b, Vec3::new(1.0, 0.5, 0.0)).unwrap();
        editor.set_tooltip_trigger(a, TooltipTrigger::OnHover).unwrap();

        editor.pointer_move(screen_of(&editor, Vec3::new(-1.0, 0.5, 0.5)));
        click_entity(&mut editor, b);
        editor.frame(STEP);
        assert_eq!(editor.tooltips().get(&a).unwrap().state(), TooltipState::VisibleHover);
        assert_eq!(editor.tooltips().get(&b).unwrap().state(), TooltipState::VisibleClick);

        let behind = editor.camera().position * 2.0 - SPAWN_POSITION;
        editor.look_at(behind).unwrap();
        editor.frame(STEP);
        assert_eq!(editor.tooltips().get(&a).unwrap().state(), TooltipState::Hidden);
        assert_eq!(editor.tooltips().get(&b).unwrap().state(), TooltipState::Hidden);
        assert!(editor.tooltip_overlays().is_empty());
    }

    #[test]
    fn test_override_visible_survives_hover_elsewhere() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        let b = editor.add_primitive(PrimitiveKind::Box);
        editor.set_position(a, Vec3::new(-1.0, 0.5, 0.0)).unwrap();
        editor.set_position(b, Vec3::new(1.0, 0.5, 0.0)).unwrap();
        editor.set_tooltip_trigger(a, TooltipTrigger::OnHover).unwrap();
        editor.set_tooltip_trigger(b, TooltipTrigger::OnHover).unwrap();

        editor.show_tooltip("Box_1").unwrap();
        editor.frame(STEP);
        assert_eq!(editor.tooltips().get(&a).unwrap().state(), TooltipState::OverrideVisible);

        editor.pointer_move(screen_of(&editor, Vec3::new(1.0, 0.5, 0.5)));
        editor.frame(STEP);
        assert_eq!(editor.tooltips().get(&a).unwrap().state(), TooltipState::OverrideVisible);
        assert!(visible(&editor, a));
        assert!(visible(&editor, b));

        editor.pointer_move(Vec2::new(5.0, 5.0));
        editor.frame(STEP);
        assert!(visible(&editor, a));
        assert!(!visible(&editor, b));
    }

    #[test]
    fn test_x_drag_moves_only_x() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        click_entity(&mut editor, id);
        editor.frame(STEP);
        assert!(editor.gizmo().is_visible());

        let start = SPAWN_POSITION + Vec3::new(0.4, 0.0, 0.0);
        let outcome = editor.pointer_down(screen_of(&editor, start), PointerRegion::Canvas);
        assert_eq!(outcome, PointerOutcome::DragStarted(Axis::X));
        assert!(!editor.controls().enabled);

        for step in 1..=4 {
            let target = start + Vec3::new(0.2 * step as f32, 0.1, 0.05);
            editor.pointer_move(screen_of(&editor, target));
            editor.frame(STEP);
        }
        editor.pointer_up();

        let moved = editor.entity(&id).unwrap().transform.position;
        assert!(moved.x > SPAWN_POSITION.x + 0.1, "x moved: {:?}", moved);
        assert_eq!(moved.y, SPAWN_POSITION.y);
        assert_eq!(moved.z, SPAWN_POSITION.z);
        assert!(editor.controls().enabled);
        assert!(approx_eq(editor.gizmo().position(), moved, 1e-5));

        // One history entry for the whole gesture
        assert_eq!(editor.history().stats().undo_count, 1);
        editor.undo().unwrap();
        assert_eq!(editor.entity(&id).unwrap().transform.position, SPAWN_POSITION);
    }

    #[test]
    fn test_end_drag_idempotent() {
        let mut editor = editor();
        editor.end_drag();
        editor.end_drag();
        editor.pointer_up();
        assert!(editor.controls().enabled);
        assert!(editor.drag().is_none());
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_removing_drag_target_restores_controls() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        click_entity(&mut editor, id);
        let start = SPAWN_POSITION + Vec3::new(0.4, 0.0, 0.0);
        editor.pointer_down(screen_of(&editor, start), PointerRegion::Canvas);
        assert!(!editor.controls().enabled);

        editor.remove_entity(id).unwrap();
        assert!(editor.controls().enabled);
        assert!(editor.drag().is_none());
        assert_eq!(editor.selection(), Selection::None);
        editor.pointer_move(Vec2::new(100.0, 100.0));
        editor.pointer_up();
    }

    #[test]
    fn test_group_translate_scenario() {
        let mut editor = editor();
        let ids: Vec<EntityId> = (0..3).map(|_| editor.add_primitive(PrimitiveKind::Box)).collect();
        for (i, id) in ids.iter().enumerate() {
            editor.set_position(*id, Vec3::new(2.0 * i as f32, 0.0, 0.0)).unwrap();
        }
        let group = editor.create_group("Row", &ids, None).unwrap();
        editor.apply_group_op(group, GroupOp::Translate(Vec3::X)).unwrap();

        let positions: Vec<Vec3> = ids.iter().map(|id| editor.entity(id).unwrap().transform.position).collect();
        assert_eq!(positions, vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
        assert_eq!(editor.group_centroid(group).unwrap(), Vec3::new(3.0, 0.0, 0.0));

        // Tags follow the membership
        let node = editor.entity(&ids[0]).unwrap().node;
        assert_eq!(editor.scene().tag(node), Some(NodeTag::Entity { entity: ids[0], group: Some(group) }));
    }

    #[test]
    fn test_group_member_click_selects_group() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        let group = editor.create_group("Solo", &[id], None).unwrap();
        assert_eq!(click_entity(&mut editor, id), PointerOutcome::Selected(PickTarget::Group(group)));
        assert_eq!(editor.selection(), Selection::Group(group));
        assert!(!visible(&editor, id));
    }

    #[test]
    fn test_removing_last_member_deletes_group() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        let group = editor.create_group("Solo", &[id], None).unwrap();
        editor.select(Selection::Group(group));

        editor.remove_entity(id).unwrap();
        assert_eq!(editor.arena().group_count(), 0);
        assert_eq!(editor.selection(), Selection::None);
        assert!(editor.tooltips().is_empty());
        assert!(matches!(editor.remove_entity(id), Err(StageError::EntityNotFound(_))));
    }

    #[test]
    fn test_import_meshes() {
        let mut editor = editor();
        assert_eq!(editor.import_meshes("empty.glb", Vec::new()), ImportResult::default());
        assert!(editor.arena().is_empty());

        let mesh = |name: Option<&str>, x: f32| ImportedMesh {
            name: name.map(str::to_string),
            transform: Transform::from_position(Vec3::new(x, 0.0, 0.0)),
            half_extents: Vec3::splat(0.25),
        };
        let result = editor.import_meshes("models/chair.glb", vec![mesh(Some("Seat"), 0.0), mesh(None, 2.0)]);
        assert_eq!(result.entities.len(), 2);
        let group = result.group.unwrap();
        assert_eq!(editor.arena().group(&group).unwrap().name, "chair");
        assert_eq!(editor.entity(&result.entities[1]).unwrap().name, "chair_part_2");
        assert_eq!(editor.selection(), Selection::Group(group));
        assert!(approx_eq(editor.gizmo().position(), Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_group_visibility() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        let b = editor.add_primitive(PrimitiveKind::Box);
        let group = editor.create_group("Pair", &[a, b], None).unwrap();
        editor.set_group_visible(group, false).unwrap();
        assert!(!editor.entity(&a).unwrap().visible);
        assert!(!editor.entity(&b).unwrap().visible);
        assert!(!editor.arena().group(&group).unwrap().visible);
    }

    #[test]
    fn test_script_runs_once_per_click() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        editor
            .set_script(id, Some("entity translate 0 0 -1\nentity color #FF0000".to_string()))
            .unwrap();
        click_entity(&mut editor, id);
        let entity = editor.entity(&id).unwrap();
        assert_eq!(entity.transform.position, SPAWN_POSITION + Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(entity.material.color, "ff0000");
    }

    #[test]
    fn test_bad_script_is_contained() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        editor
            .set_script(id, Some("entity translate 0 5 0\nexplode now".to_string()))
            .unwrap();
        let result = editor.run_script(id);
        assert!(matches!(result, Err(StageError::Script { .. })));
        // Parsing failed, so nothing ran
        assert_eq!(editor.entity(&id).unwrap().transform.position, SPAWN_POSITION);

        // The click still toggles the tooltip
        click_entity(&mut editor, id);
        assert!(visible(&editor, id));
    }

    #[test]
    fn test_tooltip_button_runs_script() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        let other = editor.add_primitive(PrimitiveKind::Sphere);
        editor
            .set_script(id, Some(format!("tooltip show {}", editor.entity(&other).unwrap().name)))
            .unwrap();
        editor.press_tooltip_button(id).unwrap();
        assert_eq!(editor.selection(), Selection::Entity(id));
        assert_eq!(editor.tooltips().get(&other).unwrap().state(), TooltipState::OverrideVisible);
        assert!(!visible(&editor, id));
    }

    #[test]
    fn test_tooltip_api() {
        let mut editor = editor();
        let lamp = editor.add_primitive(PrimitiveKind::Box);
        editor.set_name(lamp, "Lamp").unwrap();
        editor.set_tooltip_trigger(lamp, TooltipTrigger::Always).unwrap();
        let chair = editor.add_primitive(PrimitiveKind::Box);
        editor.set_name(chair, "Chair").unwrap();
        editor.frame(STEP);

        editor.hide_tooltip("lamp").unwrap();
        editor.frame(STEP);
        assert!(!editor.tooltip_visibility("Lamp").unwrap());

        assert!(editor.toggle_tooltip("Chair").unwrap());
        assert!(!editor.toggle_tooltip("Chair").unwrap());

        assert_eq!(editor.show_all_tooltips(), 1);
        assert!(editor.tooltip_visibility("Lamp").unwrap());

        editor.set_tooltip_enabled(chair, false).unwrap();
        assert!(matches!(editor.show_tooltip("Chair"), Err(StageError::TooltipsDisabled(_))));
        assert!(matches!(editor.hide_tooltip("Chair"), Err(StageError::TooltipNotFound(_))));
        assert!(matches!(editor.hide_tooltip("Sofa"), Err(StageError::NameNotFound(_))));

        assert_eq!(editor.hide_all_tooltips(), 1);
        assert_eq!(editor.release_tooltip_override(None).unwrap(), 1);

        let rows = editor.list_tooltips();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Lamp");
        assert!(rows[0].visible);
        assert_eq!(rows[0].trigger, Some(TooltipTrigger::Always));
        assert!(!rows[1].has_tooltip);
        assert!(!rows[1].enabled);
        assert_eq!(rows[1].trigger, None);
    }

    #[test]
    fn test_camera_api() {
        let mut editor = editor();
        assert!(editor.move_camera_along_path(&[Vec3::ONE], STEP, Easing::Linear).is_err());
        assert!(editor.set_camera(Vec3::new(f32::NAN, 0.0, 0.0), None, None).is_err());

        let goal = Vec3::new(0.0, 2.5, 4.0);
        editor
            .animate_camera_to(goal, Vec3::new(0.0, 1.0, 0.0), Duration::from_millis(100), Easing::EaseInOutCubic)
            .unwrap();
        for _ in 0..10 {
            editor.frame(Duration::from_millis(20));
        }
        assert!(!editor.is_camera_animating());
        assert!(approx_eq(editor.camera_state().position, goal, 1e-4));

        editor.move_camera(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(approx_eq(editor.camera().position, goal + Vec3::Z, 1e-5));

        editor.reset_camera();
        assert_eq!(editor.camera().position, editor.settings().camera.initial_position);
        assert!(!editor.stop_camera_animation());
    }

    #[test]
    fn test_limits_pull_camera_back() {
        let mut editor = editor();
        editor.set_camera(Vec3::new(0.0, 1.0, 30.0), Some(Vec3::new(0.0, 1.0, 0.0)), None).unwrap();
        editor.frame(STEP);
        let distance = editor.camera().position.distance(Vec3::new(0.0, 1.0, 0.0));
        assert!(distance <= 6.0 + 1e-3);
        // Skybox follows the camera
        assert_eq!(editor.scene().world_position(editor.skybox()), Some(editor.camera().position));
    }

    #[test]
    fn test_disabled_controls_ignore_view_input() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        click_entity(&mut editor, id);
        editor.pointer_down(screen_of(&editor, SPAWN_POSITION + Vec3::new(0.4, 0.0, 0.0)), PointerRegion::Canvas);
        let before = editor.camera().position;
        assert!(!editor.orbit_view(Vec2::new(50.0, 0.0)));
        assert_eq!(editor.camera().position, before);
        editor.pointer_up();
        assert!(editor.orbit_view(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_document_round_trip() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        editor.set_tooltip_trigger(a, TooltipTrigger::Always).unwrap();
        editor.set_script(a, Some("log hello".to_string())).unwrap();
        let b = editor.add_primitive(PrimitiveKind::Torus);
        let c = editor.add_primitive(PrimitiveKind::Cone);
        editor.set_position(c, Vec3::new(1.0, 0.5, 0.0)).unwrap();
        let group = editor.create_group("Pair", &[b, c], Some("pair.glb".to_string())).unwrap();
        editor.set_environment(Some("scene.ksplat".to_string()), None);

        let doc = editor.capture_document();
        let json = doc.to_json().unwrap();

        let mut copy = self::editor();
        assert_eq!(copy.load_document(&SceneDocument::from_json(&json).unwrap()), 3);
        assert_eq!(copy.capture_document(), doc);
        assert_eq!(copy.arena().group(&group).unwrap().members, vec![b, c]);
        assert_eq!(copy.tooltips().get(&a).unwrap().trigger(), TooltipTrigger::Always);
        copy.frame(STEP);
        assert!(copy.tooltips().get(&a).unwrap().is_visible());

        // Picking works against rebuilt nodes
        let node = copy.entity(&c).unwrap().node;
        assert_eq!(copy.scene().tag(node), Some(NodeTag::Entity { entity: c, group: Some(group) }));
    }

    #[test]
    fn test_repeated_ids_in_document_get_fresh_ids() {
        let mut editor = editor();
        let a = editor.add_primitive(PrimitiveKind::Box);
        let b = editor.add_primitive(PrimitiveKind::Box);
        editor.set_position(b, Vec3::new(1.0, 0.5, 0.0)).unwrap();
        editor.create_group("First", &[a], None).unwrap();
        editor.create_group("Second", &[b], None).unwrap();

        let mut doc = editor.capture_document();
        doc.models[1].id = doc.models[0].id.clone();
        doc.groups[1].id = doc.groups[0].id.clone();

        let mut copy = self::editor();
        assert_eq!(copy.load_document(&doc), 2);
        assert_eq!(copy.arena().len(), 2);
        assert_eq!(copy.arena().group_count(), 2);

        let entities: Vec<&Entity> = copy.arena().entities().collect();
        assert_eq!(entities[0].id, a);
        assert_ne!(entities[1].id, a);
        for entity in &entities {
            // Every node points back at its own entity and an existing group
            let group = entity.group.unwrap();
            assert!(copy.arena().group(&group).is_some());
            assert_eq!(copy.arena().group(&group).unwrap().members, vec![entity.id]);
            assert_eq!(
                copy.scene().tag(entity.node),
                Some(NodeTag::Entity { entity: entity.id, group: Some(group) })
            );
            assert!(copy.tooltips().contains(&entity.id));
        }
        assert_ne!(entities[0].group, entities[1].group);
    }

    #[test]
    fn test_invalid_transform_rejected() {
        let mut editor = editor();
        let id = editor.add_primitive(PrimitiveKind::Box);
        let result = editor.set_scale(id, Vec3::new(1.0, f32::INFINITY, 1.0));
        assert!(matches!(result, Err(StageError::InvalidTransform(_))));
        assert_eq!(editor.entity(&id).unwrap().transform.scale, Vec3::ONE);
        assert!(matches!(editor.set_color(id, "red"), Err(StageError::InvalidColor(_))));
    }
}
