// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tooltip card layout.
//!
//! Cards are laid out without a painter so hit regions can be computed and
//! tested on their own. A card hangs above its anchor: the anchor sits at the
//! middle of the card's bottom edge, plus a small pointer gap.

use splatstage_core::{EntityId, TooltipOverlay};

/// Card width in points
pub const CARD_WIDTH: f32 = 220.0;
/// Inner padding
pub const PADDING: f32 = 8.0;
/// Title row height
pub const TITLE_HEIGHT: f32 = 18.0;
/// Description line height
pub const LINE_HEIGHT: f32 = 15.0;
/// Button row height
pub const BUTTON_HEIGHT: f32 = 22.0;
/// Gap between the card and its anchor
pub const POINTER_GAP: f32 = 6.0;

/// Rough glyph budget per description line
const CHARS_PER_LINE: usize = 32;

/// Where one tooltip card and its parts go
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// Owning entity
    pub entity: EntityId,
    /// Whole card
    pub rect: egui::Rect,
    /// Top-left of the title text
    pub title_pos: egui::Pos2,
    /// Wrapped description lines with their top-left positions
    pub lines: Vec<(egui::Pos2, String)>,
    /// Button, when the card shows one
    pub button: Option<egui::Rect>,
}

/// What a point on the card layer hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardHit {
    /// The action button of a card
    Button(EntityId),
    /// Anywhere else on a card
    Body(EntityId),
}

/// Greedy word wrap to `width` characters. Words longer than a line are
/// kept whole.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Lay out a card for `overlay` inside the panel at `origin`
pub fn layout_card(overlay: &TooltipOverlay, origin: egui::Pos2) -> CardLayout {
    let wrapped = if overlay.description.trim().is_empty() {
        Vec::new()
    } else {
        wrap(&overlay.description, CHARS_PER_LINE)
    };

    let mut height = PADDING * 2.0 + TITLE_HEIGHT + wrapped.len() as f32 * LINE_HEIGHT;
    if overlay.button.is_some() {
        height += PADDING + BUTTON_HEIGHT;
    }

    let anchor = origin + egui::vec2(overlay.anchor.x, overlay.anchor.y);
    let rect = egui::Rect::from_min_size(
        egui::pos2(anchor.x - CARD_WIDTH / 2.0, anchor.y - POINTER_GAP - height),
        egui::vec2(CARD_WIDTH, height),
    );

    let title_pos = rect.min + egui::vec2(PADDING, PADDING);
    let mut y = title_pos.y + TITLE_HEIGHT;
    let lines = wrapped
        .into_iter()
        .map(|line| {
            let pos = egui::pos2(title_pos.x, y);
            y += LINE_HEIGHT;
            (pos, line)
        })
        .collect();

    let button = overlay.button.as_ref().map(|_| {
        egui::Rect::from_min_size(
            egui::pos2(rect.min.x + PADDING, y + PADDING),
            egui::vec2(CARD_WIDTH - PADDING * 2.0, BUTTON_HEIGHT),
        )
    });

    CardLayout {
        entity: overlay.entity,
        rect,
        title_pos,
        lines,
        button,
    }
}

/// Hit test the card layer. Later cards are drawn on top and win.
pub fn hit_test(cards: &[CardLayout], pos: egui::Pos2) -> Option<CardHit> {
    cards.iter().rev().find_map(|card| {
        if card.button.is_some_and(|b| b.contains(pos)) {
            Some(CardHit::Button(card.entity))
        } else if card.rect.contains(pos) {
            Some(CardHit::Body(card.entity))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatstage_core::ScreenAnchor;

    fn overlay(description: &str, button: bool) -> TooltipOverlay {
        TooltipOverlay {
            entity: EntityId::new(),
            title: "Lamp".to_string(),
            description: description.to_string(),
            button: button.then(|| "Select".to_string()),
            anchor: ScreenAnchor { x: 300.0, y: 200.0 },
        }
    }

    #[test]
    fn test_card_hangs_above_anchor() {
        let card = layout_card(&overlay("Warm light", false), egui::pos2(10.0, 20.0));
        assert_eq!(card.rect.center().x, 310.0);
        assert_eq!(card.rect.bottom(), 220.0 - POINTER_GAP);
        assert_eq!(card.lines.len(), 1);
        assert!(card.button.is_none());
    }

    #[test]
    fn test_button_inside_card() {
        let card = layout_card(&overlay("A much longer description that needs more than one line", true), egui::Pos2::ZERO);
        let button = card.button.unwrap();
        assert!(card.rect.contains_rect(button));
        assert!(card.lines.len() >= 2);
        assert!(button.top() > card.lines.last().unwrap().0.y);
    }

    #[test]
    fn test_hit_test() {
        let cards = vec![layout_card(&overlay("", true), egui::Pos2::ZERO)];
        let entity = cards[0].entity;
        let button = cards[0].button.unwrap();

        assert_eq!(hit_test(&cards, button.center()), Some(CardHit::Button(entity)));
        assert_eq!(hit_test(&cards, cards[0].rect.left_top() + egui::vec2(2.0, 2.0)), Some(CardHit::Body(entity)));
        assert_eq!(hit_test(&cards, egui::pos2(300.0, 210.0)), None);
    }

    #[test]
    fn test_topmost_card_wins() {
        let below = layout_card(&overlay("", false), egui::Pos2::ZERO);
        let above = layout_card(&overlay("", false), egui::Pos2::ZERO);
        let pos = below.rect.center();
        let top = above.entity;
        assert_eq!(hit_test(&[below, above], pos), Some(CardHit::Body(top)));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("supercalifragilistic ok", 5), vec!["supercalifragilistic", "ok"]);
        assert_eq!(wrap("a\nb", 10), vec!["a", "b"]);
    }
}
