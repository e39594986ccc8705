// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations.

use crate::cli::{Cli, Command};
use splatstage_core::{
    Editor, EditorSettings, EntityKind, PrimitiveKind, SceneDocument, StageError, TooltipRow, TooltipTrigger,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the exported viewer document
pub const EXPORT_FILE_NAME: &str = "scene.json";

/// Errors reported by the command line
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings file unreadable or invalid
    #[error("Failed to load settings {path}: {source}")]
    Settings {
        /// Settings path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Refused to overwrite an existing file
    #[error("{0} already exists (use --force to overwrite)")]
    Exists(PathBuf),

    /// Editor or document failure
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Tooltip list could not be rendered as JSON
    #[error("Failed to encode tooltips: {0}")]
    Json(#[from] serde_json::Error),

    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for commands
pub type Result<T> = std::result::Result<T, AppError>;

/// Run a parsed command line. Returns the text to print.
pub fn run(cli: Cli) -> Result<String> {
    let settings = load_settings(cli.settings.as_deref())?;
    match cli.command {
        Command::New { out, force } => new_scene(&settings, &out, force),
        Command::Inspect { scene, json } => inspect(&settings, &scene, json),
        Command::Export {
            scene,
            out_dir,
            splat,
            skybox,
        } => export(&settings, &scene, &out_dir, splat, skybox),
    }
}

fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    let Some(path) = path else {
        return Ok(EditorSettings::default());
    };
    EditorSettings::load_or_default(path).map_err(|source| AppError::Settings {
        path: path.to_path_buf(),
        source,
    })
}

fn open(settings: &EditorSettings, scene: &Path) -> Result<Editor> {
    let doc = SceneDocument::load(scene)?;
    let mut editor = Editor::new(settings.clone());
    editor.load_document(&doc);
    editor.frame(Duration::ZERO);
    Ok(editor)
}

/// Write a starter scene
pub fn new_scene(settings: &EditorSettings, out: &Path, force: bool) -> Result<String> {
    if out.exists() && !force {
        return Err(AppError::Exists(out.to_path_buf()));
    }

    let mut editor = Editor::new(settings.clone());
    let id = editor.add_primitive(PrimitiveKind::Box);
    editor.set_name(id, "Welcome")?;
    editor.set_description(id, "Click objects to see their tooltips.")?;
    editor.set_tooltip_trigger(id, TooltipTrigger::Always)?;

    editor.capture_document().save(out)?;
    Ok(format!("Wrote starter scene to {}\n", out.display()))
}

fn kind_label(kind: &EntityKind) -> String {
    match kind {
        EntityKind::Primitive(primitive) => primitive.name().to_string(),
        EntityKind::MeshPart { mesh_name } => format!("mesh {}", mesh_name),
    }
}

fn trigger_label(row: &TooltipRow) -> &'static str {
    row.trigger.map_or("-", |t| t.as_str())
}

/// Describe a scene: entities, groups with centroids and tooltip status
pub fn inspect(settings: &EditorSettings, scene: &Path, json: bool) -> Result<String> {
    let editor = open(settings, scene)?;
    let rows = editor.list_tooltips();
    if json {
        return Ok(serde_json::to_string_pretty(&rows)? + "\n");
    }

    let mut out = String::new();
    out.push_str(&format!("Entities ({}):\n", editor.arena().len()));
    for entity in editor.arena().entities() {
        let p = entity.transform.position;
        out.push_str(&format!(
            "  {:<24} {:<16} ({:.2}, {:.2}, {:.2}){}\n",
            entity.name,
            kind_label(&entity.kind),
            p.x,
            p.y,
            p.z,
            if entity.visible { "" } else { " hidden" }
        ));
    }

    out.push_str(&format!("Groups ({}):\n", editor.arena().group_count()));
    for group in editor.arena().groups() {
        let centroid = editor.group_centroid(group.id)?;
        out.push_str(&format!(
            "  {:<24} {} members, centroid ({:.2}, {:.2}, {:.2})\n",
            group.name,
            group.members.len(),
            centroid.x,
            centroid.y,
            centroid.z
        ));
    }

    out.push_str("Tooltips:\n");
    for row in &rows {
        out.push_str(&format!(
            "  {:<24} {:<8} {}{}{}\n",
            row.name,
            trigger_label(row),
            if row.visible { "visible" } else { "hidden" },
            if row.api_override { " (override)" } else { "" },
            if row.enabled { "" } else { " (disabled)" }
        ));
    }
    Ok(out)
}

/// Write the viewer document into `out_dir`
pub fn export(
    settings: &EditorSettings,
    scene: &Path,
    out_dir: &Path,
    splat: Option<String>,
    skybox: Option<String>,
) -> Result<String> {
    let mut doc = open(settings, scene)?.capture_document();
    doc.splat_path = splat.or(doc.splat_path);
    doc.skybox = skybox.or(doc.skybox);

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(EXPORT_FILE_NAME);
    doc.save(&path)?;
    tracing::info!("Exported {} models to {}", doc.models.len(), path.display());
    Ok(format!("Exported {} models to {}\n", doc.models.len(), path.display()))
}
