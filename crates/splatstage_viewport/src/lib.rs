// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui viewport adapter for splatstage.
//!
//! [`ViewportPanel`] turns egui pointer input into editor pointer events,
//! ticks the editor once per frame and paints the gizmo and tooltip cards
//! over whatever the host renders underneath.

pub mod card;
pub mod panel;

pub use card::{CardHit, CardLayout};
pub use panel::{PressTarget, ViewportPanel};
