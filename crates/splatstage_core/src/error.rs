// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types shared by the scene editing core.

use crate::history::HistoryError;
use crate::script::ScriptError;
use crate::state::{EntityId, GroupId};
use thiserror::Error;

/// Errors produced by editor operations.
///
/// None of these are fatal: callers log them and keep the previous valid
/// state. The render loop never sees a panic from this crate.
#[derive(Debug, Error)]
pub enum StageError {
    /// No entity with this id exists (any more)
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// No entity matched the requested name
    #[error("Model with name \"{0}\" not found")]
    NameNotFound(String),

    /// No group with this id exists (any more)
    #[error("Group not found: {0:?}")]
    GroupNotFound(GroupId),

    /// Group exists but has no members to operate on
    #[error("Group {0:?} has no members")]
    EmptyGroup(GroupId),

    /// The entity has no tooltip wrapper attached
    #[error("No tooltip found for model \"{0}\"")]
    TooltipNotFound(String),

    /// Tooltips are switched off for this entity
    #[error("Tooltips are disabled for model \"{0}\"")]
    TooltipsDisabled(String),

    /// A transform value was NaN or infinite
    #[error("Invalid transform value: {0}")]
    InvalidTransform(String),

    /// Color string is not `#rrggbb`
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A user script failed to parse or run
    #[error("Script error for model {entity:?}: {source}")]
    Script {
        /// Entity that owns the script
        entity: EntityId,
        /// Underlying script failure
        #[source]
        source: ScriptError,
    },

    /// Camera control call with bad arguments
    #[error("Camera error: {0}")]
    Camera(String),

    /// Undo/redo failure
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Scene document could not be read or written
    #[error("Document error: {0}")]
    Document(String),

    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, StageError>;
