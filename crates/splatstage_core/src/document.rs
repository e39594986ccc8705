// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene documents.
//!
//! The JSON form is the scene file consumed by the exported viewer; the
//! editor also reads and writes the same structure as RON. Groups refer to
//! their members by index into `models`.

use crate::error::{Result, StageError};
use crate::scene_graph::NodeHandle;
use crate::state::{Entity, EntityId, EntityKind, GroupId, Material, PrimitiveKind, SceneArena, TooltipConfig, Transform};
use crate::tooltip::TooltipTrigger;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current scene document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

fn default_true() -> bool {
    true
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_button() -> String {
    "Select".to_string()
}

fn default_geometry() -> String {
    PrimitiveKind::Box.geometry_type().to_string()
}

/// One entity as stored in a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    /// Entity id; non-uuid ids from older files are replaced on load
    #[serde(default)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Tooltip body
    #[serde(default)]
    pub description: String,
    /// Tooltip button label
    #[serde(default = "default_button")]
    pub button_text: String,
    /// Action script, empty for none
    #[serde(default)]
    pub script: String,
    /// Viewer geometry type
    #[serde(default = "default_geometry")]
    pub geometry_type: String,
    /// Mesh name inside the source file, for imported parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_name: Option<String>,
    /// Position
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation in radians
    #[serde(default)]
    pub rotation: Vec3,
    /// Scale
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Rendered or hidden
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Tooltips enabled
    #[serde(default = "default_true")]
    pub show_tooltip: bool,
    /// Tooltip trigger policy
    #[serde(default)]
    pub tooltip_trigger: TooltipTrigger,
    /// Tooltip button shown
    #[serde(default = "default_true")]
    pub show_tooltip_button: bool,
    /// Owning group id
    #[serde(default)]
    pub group_id: Option<String>,
    /// Source file of imported parts
    #[serde(default)]
    pub source_file: Option<String>,
    /// Whether this is a mesh extracted from a GLB file
    #[serde(default, rename = "isGLBPart")]
    pub is_glb_part: bool,
    /// Appearance
    #[serde(default)]
    pub material: Material,
}

/// One group as stored in a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    /// Group id
    #[serde(default)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Member indices into the document's models
    #[serde(default)]
    pub object_ids: Vec<usize>,
    /// Source file
    #[serde(default)]
    pub source_file: Option<String>,
}

/// A complete scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Format version
    #[serde(default)]
    pub version: u32,
    /// Splat file the scene is built around
    #[serde(default)]
    pub splat_path: Option<String>,
    /// Skybox texture URL
    #[serde(default)]
    pub skybox: Option<String>,
    /// Entities in arena order
    #[serde(default)]
    pub models: Vec<ModelRecord>,
    /// Groups
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            splat_path: None,
            skybox: None,
            models: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// A group resolved against rebuilt entities
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGroup {
    /// Group id
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Members, in file order
    pub members: Vec<EntityId>,
    /// Source file
    pub source_file: Option<String>,
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

impl ModelRecord {
    /// Record for an arena entity
    pub fn from_entity(entity: &Entity) -> Self {
        let (mesh_name, is_glb_part) = match &entity.kind {
            EntityKind::MeshPart { mesh_name } => (Some(mesh_name.clone()), true),
            EntityKind::Primitive(_) => (None, false),
        };
        Self {
            id: entity.id.0.to_string(),
            name: entity.name.clone(),
            description: entity.description.clone(),
            button_text: entity.button_text.clone(),
            script: entity.script.clone().unwrap_or_default(),
            geometry_type: entity.kind.geometry_type().to_string(),
            mesh_name,
            position: entity.transform.position,
            rotation: entity.transform.rotation,
            scale: entity.transform.scale,
            visible: entity.visible,
            show_tooltip: entity.tooltip.enabled,
            tooltip_trigger: entity.tooltip.trigger,
            show_tooltip_button: entity.tooltip.show_button,
            group_id: entity.group.map(|g| g.0.to_string()),
            source_file: entity.source_file.clone(),
            is_glb_part,
            material: entity.material.clone(),
        }
    }

    /// Geometry provenance
    pub fn kind(&self) -> EntityKind {
        if self.is_glb_part {
            return EntityKind::MeshPart {
                mesh_name: self.mesh_name.clone().unwrap_or_else(|| self.name.clone()),
            };
        }
        match PrimitiveKind::from_geometry_type(&self.geometry_type) {
            Some(kind) => EntityKind::Primitive(kind),
            None => {
                tracing::warn!("Unknown geometry type {} for {}, using a box", self.geometry_type, self.name);
                EntityKind::Primitive(PrimitiveKind::Box)
            }
        }
    }

    /// Rebuild the entity, bound to `node`. The id is kept when it is a uuid.
    pub fn to_entity(&self, node: NodeHandle) -> Entity {
        let mut entity = Entity::new(self.name.clone(), self.kind(), node);
        if let Some(id) = parse_id(&self.id) {
            entity.id = EntityId(id);
        } else if !self.id.is_empty() {
            tracing::debug!("Replacing legacy id {} for {}", self.id, self.name);
        }
        if !self.description.is_empty() {
            entity.description = self.description.clone();
        }
        entity.button_text = self.button_text.clone();
        entity.script = Some(self.script.clone()).filter(|s| !s.trim().is_empty());
        entity.transform = Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        };
        entity.material = self.material.clone();
        entity.visible = self.visible;
        entity.source_file = self.source_file.clone();
        entity.tooltip = TooltipConfig {
            enabled: self.show_tooltip,
            trigger: self.tooltip_trigger,
            show_button: self.show_tooltip_button,
        };
        entity
    }
}

impl SceneDocument {
    /// Snapshot the arena. Group members are written as model indices.
    pub fn capture(arena: &SceneArena) -> Self {
        let models = arena.entities().map(ModelRecord::from_entity).collect();
        let groups = arena
            .groups()
            .map(|g| GroupRecord {
                id: g.id.0.to_string(),
                name: g.name.clone(),
                object_ids: g.members.iter().filter_map(|m| arena.index_of(m)).collect(),
                source_file: g.source_file.clone(),
            })
            .collect();
        Self {
            models,
            groups,
            ..Default::default()
        }
    }

    /// Resolve group member indices against the entity ids rebuilt from
    /// `models` (same order). Out-of-range indices are dropped and groups
    /// left empty are discarded.
    pub fn resolve_groups(&self, ids: &[EntityId]) -> Vec<ResolvedGroup> {
        self.groups
            .iter()
            .filter_map(|g| {
                let members: Vec<EntityId> = g.object_ids.iter().filter_map(|i| ids.get(*i).copied()).collect();
                if members.is_empty() {
                    tracing::warn!("Discarding group {} with no members", g.name);
                    return None;
                }
                Some(ResolvedGroup {
                    id: parse_id(&g.id).map(GroupId).unwrap_or_default(),
                    name: g.name.clone(),
                    members,
                    source_file: g.source_file.clone(),
                })
            })
            .collect()
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StageError::Document(e.to_string()))
    }

    /// Parse JSON
    pub fn from_json(s: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(s).map_err(|e| StageError::Document(e.to_string()))?;
        doc.check_version()
    }

    /// Serialize as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| StageError::Document(e.to_string()))
    }

    /// Parse RON
    pub fn from_ron(s: &str) -> Result<Self> {
        let doc: Self = ron::from_str(s).map_err(|e| StageError::Document(e.to_string()))?;
        doc.check_version()
    }

    fn check_version(self) -> Result<Self> {
        if self.version > DOCUMENT_FORMAT_VERSION {
            return Err(StageError::Document(format!(
                "Scene version {} is newer than supported version {}",
                self.version, DOCUMENT_FORMAT_VERSION
            )));
        }
        Ok(self)
    }

    fn is_json(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }

    /// Load from a file; `.json` is JSON, anything else RON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc = if Self::is_json(path) {
            Self::from_json(&content)?
        } else {
            Self::from_ron(&content)?
        };
        tracing::info!("Loaded scene {} ({} models, {} groups)", path.display(), doc.models.len(), doc.groups.len());
        Ok(doc)
    }

    /// Save to a file; `.json` is JSON, anything else RON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if Self::is_json(path) { self.to_json()? } else { self.to_ron()? };
        std::fs::write(path, content)?;
        tracing::info!("Saved scene {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_arena() -> SceneArena {
        let mut arena = SceneArena::new();
        let mut lamp = Entity::new("Lamp", EntityKind::Primitive(PrimitiveKind::Cylinder), NodeHandle(1));
        lamp.transform.position = Vec3::new(1.0, 0.5, -2.0);
        lamp.script = Some("log on".to_string());
        lamp.tooltip.trigger = TooltipTrigger::Always;
        arena.insert_entity(lamp);

        let seat = Entity::new("Seat", EntityKind::MeshPart { mesh_name: "seat_mesh".into() }, NodeHandle(2));
        let seat = arena.insert_entity(seat);
        let leg = arena.insert_entity(Entity::new("Leg", EntityKind::MeshPart { mesh_name: "leg".into() }, NodeHandle(3)));
        arena.create_group("chair", &[seat, leg], Some("chair.glb".to_string()));
        arena
    }

    #[test]
    fn test_json_field_names() {
        let doc = SceneDocument::capture(&sample_arena());
        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        let lamp = &value["models"][0];
        assert_eq!(lamp["buttonText"], "Select");
        assert_eq!(lamp["tooltipTrigger"], "always");
        assert_eq!(lamp["geometryType"], "CylinderGeometry");
        assert_eq!(lamp["isGLBPart"], false);
        assert_eq!(lamp["position"], serde_json::json!([1.0, 0.5, -2.0]));
        assert_eq!(value["models"][1]["isGLBPart"], true);
        assert_eq!(value["groups"][0]["objectIds"], serde_json::json!([1, 2]));
        assert_eq!(value["groups"][0]["sourceFile"], "chair.glb");
    }

    #[test]
    fn test_rebuild_preserves_entities() {
        let arena = sample_arena();
        let doc = SceneDocument::from_ron(&SceneDocument::capture(&arena).to_ron().unwrap()).unwrap();

        let rebuilt: Vec<Entity> = doc
            .models
            .iter()
            .enumerate()
            .map(|(i, m)| m.to_entity(NodeHandle(i as u64)))
            .collect();
        for (original, copy) in arena.entities().zip(&rebuilt) {
            assert_eq!(original.id, copy.id);
            assert_eq!(original.name, copy.name);
            assert_eq!(original.kind, copy.kind);
            assert_eq!(original.transform, copy.transform);
            assert_eq!(original.tooltip, copy.tooltip);
            assert_eq!(original.script, copy.script);
        }

        let ids: Vec<EntityId> = rebuilt.iter().map(|e| e.id).collect();
        let groups = doc.resolve_groups(&ids);
        let original = arena.groups().next().unwrap();
        assert_eq!(groups[0].id, original.id);
        assert_eq!(groups[0].members, original.members);
    }

    #[test]
    fn test_bad_group_indices() {
        let doc = SceneDocument {
            groups: vec![
                GroupRecord {
                    id: "g1".into(),
                    name: "partial".into(),
                    object_ids: vec![0, 7],
                    source_file: None,
                },
                GroupRecord {
                    id: "g2".into(),
                    name: "ghost".into(),
                    object_ids: vec![9],
                    source_file: None,
                },
            ],
            ..Default::default()
        };
        let ids = [EntityId::new()];
        let groups = doc.resolve_groups(&ids);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![ids[0]]);
    }

    #[test]
    fn test_legacy_viewer_file() {
        let json = r#"{
            "splatPath": "scene.ksplat",
            "skybox": null,
            "models": [{
                "id": "model_1712_42",
                "name": "Crate",
                "script": "",
                "geometryType": "BoxGeometry",
                "position": [0, 0.5, 0],
                "rotation": [0, 0, 0],
                "scale": [1, 1, 1],
                "showTooltip": true,
                "tooltipTrigger": "onhover",
                "showTooltipButton": false,
                "groupId": null,
                "isGLBPart": false,
                "material": { "color": "ff0000", "envMapIntensity": 1 },
                "uuid": "abc"
            }],
            "groups": []
        }"#;
        let doc = SceneDocument::from_json(json).unwrap();
        let entity = doc.models[0].to_entity(NodeHandle(0));
        assert_eq!(entity.tooltip.trigger, TooltipTrigger::OnHover);
        assert!(!entity.tooltip.show_button);
        assert_eq!(entity.material.color, "ff0000");
        assert_eq!(entity.description, "Description for Crate");
        assert!(entity.script.is_none());
    }

    #[test]
    fn test_newer_version_rejected() {
        let doc = SceneDocument {
            version: DOCUMENT_FORMAT_VERSION + 1,
            ..Default::default()
        };
        assert!(SceneDocument::from_json(&doc.to_json().unwrap()).is_err());
    }
}
