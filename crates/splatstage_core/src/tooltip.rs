// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-entity tooltip visibility.
//!
//! Each entity with tooltips enabled owns one [`TooltipWrapper`]. Its state
//! is driven by the trigger policy (always, hover, click) unless an
//! external override pins it visible or hidden. Visible tooltips are
//! re-anchored every frame and drop to `Hidden` while their entity is off
//! screen.

use crate::camera::ScreenAnchor;
use crate::state::EntityId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What makes a tooltip appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TooltipTrigger {
    /// Visible whenever the entity is on screen
    #[serde(rename = "always")]
    Always,
    /// Visible while the pointer is over the entity
    #[serde(rename = "onhover")]
    OnHover,
    /// Toggled by clicking the entity
    #[default]
    #[serde(rename = "onclick")]
    OnClick,
}

impl TooltipTrigger {
    /// Name as used in scene files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::OnHover => "onhover",
            Self::OnClick => "onclick",
        }
    }

    /// Parse a scene-file trigger name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "always" => Some(Self::Always),
            "onhover" => Some(Self::OnHover),
            "onclick" => Some(Self::OnClick),
            _ => None,
        }
    }
}

/// Visibility state of one tooltip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipState {
    /// Not shown
    Hidden,
    /// Shown by the `always` trigger
    VisibleAlways,
    /// Shown while hovered
    VisibleHover,
    /// Toggled on by a click
    VisibleClick,
    /// Forced hidden by the override API
    OverrideHidden,
    /// Forced visible by the override API
    OverrideVisible,
}

impl TooltipState {
    /// Whether this is one of the visible states
    pub fn is_visible(self) -> bool {
        matches!(
            self,
            Self::VisibleAlways | Self::VisibleHover | Self::VisibleClick | Self::OverrideVisible
        )
    }

    /// Whether the override API owns this state
    pub fn is_override(self) -> bool {
        matches!(self, Self::OverrideHidden | Self::OverrideVisible)
    }
}

/// Tooltip proxy bound to exactly one entity
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipWrapper {
    entity: EntityId,
    trigger: TooltipTrigger,
    state: TooltipState,
    anchor: Option<ScreenAnchor>,
}

impl TooltipWrapper {
    /// Entity this tooltip belongs to
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Trigger policy
    pub fn trigger(&self) -> TooltipTrigger {
        self.trigger
    }

    /// Current state
    pub fn state(&self) -> TooltipState {
        self.state
    }

    /// Last computed screen anchor
    pub fn anchor(&self) -> Option<ScreenAnchor> {
        self.anchor
    }

    /// Logically visible and anchored on screen
    pub fn is_visible(&self) -> bool {
        self.state.is_visible() && self.anchor.is_some()
    }

    /// Override API is in control
    pub fn is_overridden(&self) -> bool {
        self.state.is_override()
    }

    /// Override API forced this tooltip hidden
    pub fn is_override_hidden(&self) -> bool {
        self.state == TooltipState::OverrideHidden
    }

    /// State implied by the trigger alone, with a fresh anchor
    fn rederive(&mut self, anchor: Option<ScreenAnchor>) {
        if self.trigger == TooltipTrigger::Always && anchor.is_some() {
            self.state = TooltipState::VisibleAlways;
            self.anchor = anchor;
        } else {
            self.state = TooltipState::Hidden;
            self.anchor = None;
        }
    }

    /// Show under a visible state if the anchor is on screen
    fn show_as(&mut self, state: TooltipState, anchor: Option<ScreenAnchor>) {
        self.anchor = anchor;
        self.state = if anchor.is_some() { state } else { TooltipState::Hidden };
    }
}

/// All tooltip wrappers plus hover tracking
#[derive(Debug, Default)]
pub struct TooltipBoard {
    wrappers: IndexMap<EntityId, TooltipWrapper>,
    last_hovered: Option<EntityId>,
}

impl TooltipBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the wrapper for an entity, replacing any previous one.
    /// `always` tooltips start visible when the anchor is on screen.
    pub fn attach(&mut self, entity: EntityId, trigger: TooltipTrigger, anchor: Option<ScreenAnchor>) {
        let mut wrapper = TooltipWrapper {
            entity,
            trigger,
            state: TooltipState::Hidden,
            anchor: None,
        };
        wrapper.rederive(anchor);
        self.wrappers.insert(entity, wrapper);
    }

    /// Destroy an entity's wrapper
    pub fn detach(&mut self, entity: &EntityId) -> Option<TooltipWrapper> {
        if self.last_hovered == Some(*entity) {
            self.last_hovered = None;
        }
        self.wrappers.shift_remove(entity)
    }

    /// Look up a wrapper
    pub fn get(&self, entity: &EntityId) -> Option<&TooltipWrapper> {
        self.wrappers.get(entity)
    }

    /// Whether the entity has a wrapper
    pub fn contains(&self, entity: &EntityId) -> bool {
        self.wrappers.contains_key(entity)
    }

    /// Iterate wrappers in creation order
    pub fn iter(&self) -> impl Iterator<Item = &TooltipWrapper> {
        self.wrappers.values()
    }

    /// Number of wrappers
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    /// Whether there are no wrappers
    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// Drop every wrapper
    pub fn clear(&mut self) {
        self.wrappers.clear();
        self.last_hovered = None;
    }

    /// Change the trigger policy. Overrides are kept; otherwise the state is
    /// re-derived from the new trigger.
    pub fn set_trigger(&mut self, entity: &EntityId, trigger: TooltipTrigger, anchor: Option<ScreenAnchor>) -> bool {
        let Some(wrapper) = self.wrappers.get_mut(entity) else {
            return false;
        };
        wrapper.trigger = trigger;
        if !wrapper.is_overridden() {
            wrapper.rederive(anchor);
        }
        if self.last_hovered == Some(*entity) && trigger != TooltipTrigger::OnHover {
            self.last_hovered = None;
        }
        true
    }

    /// Pointer moved. `hovered` is the entity under the pointer, if any.
    pub fn hover(&mut self, hovered: Option<EntityId>, anchor_of: impl Fn(EntityId) -> Option<ScreenAnchor>) {
        let target = hovered.filter(|id| {
            self.wrappers
                .get(id)
                .is_some_and(|w| w.trigger == TooltipTrigger::OnHover)
        });

        // Hide every other hover tooltip, not only the last one
        for wrapper in self.wrappers.values_mut() {
            if Some(wrapper.entity) != target && wrapper.state == TooltipState::VisibleHover {
                wrapper.state = TooltipState::Hidden;
                wrapper.anchor = None;
            }
        }

        if let Some(id) = target {
            if let Some(wrapper) = self.wrappers.get_mut(&id) {
                if !wrapper.is_overridden() {
                    wrapper.show_as(TooltipState::VisibleHover, anchor_of(id));
                }
            }
        }
        self.last_hovered = target;
    }

    /// Entity last hovered with an `onhover` tooltip
    pub fn last_hovered(&self) -> Option<EntityId> {
        self.last_hovered
    }

    /// Entity clicked. Toggles an `onclick` tooltip and returns its new
    /// visibility, or `None` when the click does not apply.
    ///
    /// Showing one click tooltip closes any other.
    pub fn click(&mut self, entity: EntityId, anchor: Option<ScreenAnchor>) -> Option<bool> {
        let wrapper = self.wrappers.get(&entity)?;
        if wrapper.trigger != TooltipTrigger::OnClick || wrapper.is_overridden() {
            return None;
        }

        if wrapper.state == TooltipState::VisibleClick {
            if let Some(wrapper) = self.wrappers.get_mut(&entity) {
                wrapper.state = TooltipState::Hidden;
                wrapper.anchor = None;
            }
            return Some(false);
        }

        for other in self.wrappers.values_mut() {
            if other.entity != entity && other.state == TooltipState::VisibleClick {
                other.state = TooltipState::Hidden;
                other.anchor = None;
            }
        }
        let wrapper = self.wrappers.get_mut(&entity)?;
        wrapper.show_as(TooltipState::VisibleClick, anchor);
        Some(wrapper.is_visible())
    }

    /// Close every click-toggled tooltip. Returns how many were closed.
    pub fn close_click_tooltips(&mut self) -> usize {
        let mut closed = 0;
        for wrapper in self.wrappers.values_mut() {
            if wrapper.state == TooltipState::VisibleClick {
                wrapper.state = TooltipState::Hidden;
                wrapper.anchor = None;
                closed += 1;
            }
        }
        closed
    }

    /// Per-frame pass: re-anchor visible tooltips and apply on-screen rules.
    /// Safe to run any number of times per frame.
    pub fn refresh(&mut self, anchor_of: impl Fn(EntityId) -> Option<ScreenAnchor>) {
        for wrapper in self.wrappers.values_mut() {
            let state = wrapper.state;
            let anchor = anchor_of(wrapper.entity);
            match state {
                TooltipState::OverrideHidden => wrapper.anchor = None,
                // Stays pinned; drawn only while on screen
                TooltipState::OverrideVisible => wrapper.anchor = anchor,
                _ if wrapper.trigger == TooltipTrigger::Always => wrapper.rederive(anchor),
                TooltipState::VisibleHover | TooltipState::VisibleClick => wrapper.show_as(state, anchor),
                _ => wrapper.anchor = None,
            }
        }
    }

    /// Force hidden
    pub fn hide(&mut self, entity: &EntityId) -> bool {
        let Some(wrapper) = self.wrappers.get_mut(entity) else {
            return false;
        };
        wrapper.state = TooltipState::OverrideHidden;
        wrapper.anchor = None;
        true
    }

    /// Force visible, positioned immediately
    pub fn show(&mut self, entity: &EntityId, anchor: Option<ScreenAnchor>) -> bool {
        let Some(wrapper) = self.wrappers.get_mut(entity) else {
            return false;
        };
        wrapper.state = TooltipState::OverrideVisible;
        wrapper.anchor = anchor;
        true
    }

    /// Flip the current visibility under override. Returns the new
    /// visibility, `None` without a wrapper.
    pub fn toggle(&mut self, entity: &EntityId, anchor: Option<ScreenAnchor>) -> Option<bool> {
        let visible = self.wrappers.get(entity)?.state.is_visible();
        if visible {
            self.hide(entity);
            Some(false)
        } else {
            self.show(entity, anchor);
            Some(true)
        }
    }

    /// Force every tooltip hidden. Returns the number affected.
    pub fn hide_all(&mut self) -> usize {
        for wrapper in self.wrappers.values_mut() {
            wrapper.state = TooltipState::OverrideHidden;
            wrapper.anchor = None;
        }
        self.wrappers.len()
    }

    /// Clear the override on one tooltip and re-derive from its trigger
    pub fn release(&mut self, entity: &EntityId, anchor: Option<ScreenAnchor>) -> bool {
        let Some(wrapper) = self.wrappers.get_mut(entity) else {
            return false;
        };
        wrapper.rederive(anchor);
        if self.last_hovered == Some(*entity) {
            self.last_hovered = None;
        }
        true
    }

    /// Release every override. `include` filters which entities take part
    /// (disabled entities are skipped by `show_all`). Returns the number of
    /// wrappers released and how many came back visible.
    pub fn release_all(
        &mut self,
        include: impl Fn(EntityId) -> bool,
        anchor_of: impl Fn(EntityId) -> Option<ScreenAnchor>,
    ) -> (usize, usize) {
        let mut released = 0;
        let mut visible = 0;
        for wrapper in self.wrappers.values_mut() {
            if !include(wrapper.entity) {
                continue;
            }
            wrapper.rederive(anchor_of(wrapper.entity));
            released += 1;
            if wrapper.state == TooltipState::VisibleAlways {
                visible += 1;
            }
        }
        self.last_hovered = None;
        (released, visible)
    }

    /// Logical visibility, `None` without a wrapper
    pub fn visibility(&self, entity: &EntityId) -> Option<bool> {
        self.wrappers.get(entity).map(|w| w.state.is_visible())
    }
}
