//! Crisis responder: the fixed emergency-support card

use crate::types::{CrisisCard, Turn};

/// Hotline shown on every crisis card
pub const CRISIS_HOTLINE: &str = "(852) 2766 5433";

/// Build the fixed crisis card
pub fn build_crisis_card() -> CrisisCard {
    CrisisCard {
        title: "⚠️ 紧急支援 / Immediate Support",
        hotline: CRISIS_HOTLINE,
        call_to_action: "You don't have to face this alone. Please call now, or reach out to someone you trust nearby.",
    }
}

/// Crisis card as a conversation turn
pub fn crisis_turn() -> Turn {
    Turn::crisis_card(build_crisis_card().markup())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Speaker;

    #[test]
    fn test_card_is_fixed() {
        assert_eq!(build_crisis_card(), build_crisis_card());
        assert_eq!(build_crisis_card().markup(), build_crisis_card().markup());
    }

    #[test]
    fn test_markup_contains_hotline() {
        let markup = build_crisis_card().markup();
        assert!(markup.contains(CRISIS_HOTLINE));
        assert!(markup.contains("Immediate Support"));
    }

    #[test]
    fn test_crisis_turn_is_flagged() {
        let turn = crisis_turn();
        assert!(turn.is_crisis_card);
        assert_eq!(turn.speaker, Speaker::Assistant);
        assert!(!turn.in_context());
    }

    #[test]
    fn test_terminal_plain_has_no_escapes() {
        let text = build_crisis_card().to_terminal_string(false);
        assert!(text.contains(CRISIS_HOTLINE));
        assert!(!text.contains('\x1b'));
    }
}
