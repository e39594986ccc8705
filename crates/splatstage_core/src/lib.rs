// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene editing core for splatstage.
//!
//! This crate holds everything an interactive scene editor needs on top of
//! a rendering engine, with the engine itself reduced to the
//! [`SceneGraph`] trait:
//! - Entity/group arena with stable ids
//! - Ray picking with back-references from nodes to entities
//! - Screen-space tooltips with triggers and a programmatic override API
//! - Axis-constrained transform gizmo
//! - Camera limits, orbit controls and scripted camera animation
//! - Declarative per-entity action scripts
//! - Scene documents (JSON/RON) and undo history
//!
//! ## Architecture
//!
//! [`Editor`] owns the state and drives the interaction state machines.
//! Hosts feed it pointer events and a per-frame tick, then read back the
//! scene graph, gizmo and [`TooltipOverlay`]s to draw.

pub mod camera;
pub mod document;
pub mod editor;
pub mod error;
pub mod gizmo;
pub mod group;
pub mod history;
pub mod math;
pub mod picking;
pub mod scene_graph;
pub mod script;
pub mod settings;
pub mod state;
pub mod tooltip;

pub use camera::{Camera, CameraAnimation, CameraLimits, CameraState, Easing, OrbitControls, ScreenAnchor};
pub use document::SceneDocument;
pub use editor::{
    Editor, ImportResult, ImportedMesh, PointerOutcome, PointerRegion, Selection, TooltipOverlay, TooltipRow,
};
pub use error::{Result, StageError};
pub use gizmo::{DragSession, DragTarget, TransformGizmo};
pub use group::GroupOp;
pub use history::History;
pub use math::{Axis, Ray};
pub use picking::{Pick, PickTarget};
pub use scene_graph::{MemoryScene, NodeHandle, NodeSpec, NodeTag, PickShape, SceneGraph};
pub use script::{Script, ScriptAction, ScriptError, ScriptHost};
pub use settings::EditorSettings;
pub use state::{Entity, EntityId, EntityKind, GroupId, PrimitiveKind, SceneArena, Transform};
pub use tooltip::{TooltipBoard, TooltipState, TooltipTrigger};
