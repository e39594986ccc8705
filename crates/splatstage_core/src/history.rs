// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo of transform edits.
//!
//! Each edit stores the affected entities' transforms before and after as
//! bincode snapshots. Undo hands back the "before" set, redo the "after"
//! set; the caller writes them into the arena and scene.

use crate::state::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default undo depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Transforms of a set of entities at one point in time
pub type TransformSet = Vec<(EntityId, Transform)>;

/// Unique edit ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditId(u64);

impl EditId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Serialized transform set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// bincode bytes
    pub data: Vec<u8>,
    /// Size in bytes
    pub size: usize,
}

impl StateSnapshot {
    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        let data = bincode::serialize(value)?;
        let size = data.len();
        Ok(Self { data, size })
    }

    /// Deserialize to value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }
}

/// One undoable transform edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformEdit {
    /// Unique edit ID
    pub id: EditId,
    /// Human-readable description
    pub description: String,
    /// Transforms before the edit
    pub before: StateSnapshot,
    /// Transforms after the edit
    pub after: StateSnapshot,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
}

impl TransformEdit {
    /// Get memory size of this edit
    pub fn memory_size(&self) -> usize {
        self.before.size + self.after.size
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Edits on the undo stack
    pub undo_count: usize,
    /// Edits on the redo stack
    pub redo_count: usize,
    /// Bytes held by snapshots
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<TransformEdit>,
    redo_stack: VecDeque<TransformEdit>,
    next_id: u64,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create a history with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth,
            memory_used: 0,
        }
    }

    /// Record an edit. Returns `None` without recording when nothing
    /// changed. Clears the redo stack otherwise.
    pub fn record(&mut self, description: &str, before: &[(EntityId, Transform)], after: &[(EntityId, Transform)]) -> Result<Option<EditId>> {
        if before == after {
            return Ok(None);
        }

        let id = EditId(self.next_id);
        self.next_id += 1;
        let edit = TransformEdit {
            id,
            description: description.to_string(),
            before: StateSnapshot::from_value(&before)?,
            after: StateSnapshot::from_value(&after)?,
            timestamp: now_secs(),
        };

        self.redo_stack.clear();
        self.memory_used += edit.memory_size();
        self.undo_stack.push_back(edit);

        // Enforce history limit
        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }

        tracing::debug!("Recorded edit {}: {}", id.value(), description);
        Ok(Some(id))
    }

    /// Undo the last edit, returning the transforms to restore
    pub fn undo(&mut self) -> Result<TransformSet> {
        let edit = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        let restore = edit.before.to_value()?;
        self.memory_used = self.memory_used.saturating_sub(edit.memory_size());
        self.redo_stack.push_back(edit);
        Ok(restore)
    }

    /// Redo the last undone edit, returning the transforms to apply
    pub fn redo(&mut self) -> Result<TransformSet> {
        let edit = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        let apply = edit.after.to_value()?;
        self.memory_used += edit.memory_size();
        self.undo_stack.push_back(edit);
        Ok(apply)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop every edit touching an entity (used when it is removed)
    pub fn forget(&mut self, entity: &EntityId) {
        let touches = |edit: &TransformEdit| {
            edit.before
                .to_value::<TransformSet>()
                .map(|set| set.iter().any(|(id, _)| id == entity))
                .unwrap_or(true)
        };
        self.undo_stack.retain(|e| !touches(e));
        self.redo_stack.retain(|e| !touches(e));
        self.memory_used = self.undo_stack.iter().map(TransformEdit::memory_size).sum();
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
