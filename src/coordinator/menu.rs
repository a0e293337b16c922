//! Context menu items and the visibility projection
//!
//! The four menu items are fixed; only their visibility changes, and it
//! is always derived from the session phase. The projection is one of
//! three closed tuples so a menu observer can never see a mix.

use crate::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::Phase;

/// One context menu entry
#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    /// Stable identifier, also used on the menu host side
    pub id: &'static str,
    /// Display title
    pub title: &'static str,
    /// Contexts where the item may appear
    pub contexts: &'static [&'static str],
    /// Visibility before the first transition
    pub initially_visible: bool,
}

/// The reader's four menu items
pub static MENU_ITEMS: [MenuItem; 4] = [
    MenuItem {
        id: "speak_text",
        title: "Ouvir texto",
        contexts: &["selection"],
        initially_visible: true,
    },
    MenuItem {
        id: "stop_speech",
        title: "Parar leitura",
        contexts: &["all"],
        initially_visible: false,
    },
    MenuItem {
        id: "pause_speech",
        title: "Pausar leitura",
        contexts: &["all"],
        initially_visible: false,
    },
    MenuItem {
        id: "resume_speech",
        title: "Continuar leitura",
        contexts: &["all"],
        initially_visible: false,
    },
];

/// Command a menu item maps to when clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Speak,
    Stop,
    Pause,
    Resume,
}

/// Menu item id -> command lookup
static MENU_COMMANDS: Lazy<HashMap<&'static str, MenuCommand>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("speak_text", MenuCommand::Speak);
    m.insert("stop_speech", MenuCommand::Stop);
    m.insert("pause_speech", MenuCommand::Pause);
    m.insert("resume_speech", MenuCommand::Resume);
    m
});

impl MenuCommand {
    /// Resolve a clicked menu item id to its command
    pub fn from_item_id(id: &str) -> Option<Self> {
        MENU_COMMANDS.get(id).copied()
    }
}

/// Visibility of the four menu items
///
/// Derived from the session phase, never maintained by hand. Only the
/// three constants below ever occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuVisibility {
    pub speak: bool,
    pub stop: bool,
    pub pause: bool,
    pub resume: bool,
}

impl MenuVisibility {
    /// No session: only "speak" is offered
    pub const IDLE: Self = Self {
        speak: true,
        stop: false,
        pause: false,
        resume: false,
    };

    /// Speech in progress: stop or pause
    pub const SPEAKING: Self = Self {
        speak: false,
        stop: true,
        pause: true,
        resume: false,
    };

    /// Speech paused: stop or resume
    pub const PAUSED: Self = Self {
        speak: false,
        stop: true,
        pause: false,
        resume: true,
    };

    /// Derive the visibility tuple for a phase
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Idle => Self::IDLE,
            Phase::Speaking => Self::SPEAKING,
            Phase::Paused => Self::PAUSED,
        }
    }
}

/// Host service that renders the context menu
///
/// `apply` receives the whole tuple in one call, so the rendered menu is
/// updated atomically with respect to the transition that caused it.
pub trait MenuHost {
    /// Create the four items at startup
    fn create_items(&mut self, items: &[MenuItem]) -> Result<()>;

    /// Apply a complete visibility tuple
    fn apply(&mut self, visibility: MenuVisibility) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_tuples() {
        // Exactly one of speak/resume is visible, and stop is visible
        // whenever speak is not.
        for phase in [Phase::Idle, Phase::Speaking, Phase::Paused] {
            let vis = MenuVisibility::for_phase(phase);
            assert_ne!(vis.speak, vis.stop);
            assert!(!(vis.pause && vis.resume));
        }

        assert_eq!(MenuVisibility::for_phase(Phase::Idle), MenuVisibility::IDLE);
        assert_eq!(
            MenuVisibility::for_phase(Phase::Speaking),
            MenuVisibility::SPEAKING
        );
        assert_eq!(
            MenuVisibility::for_phase(Phase::Paused),
            MenuVisibility::PAUSED
        );
    }

    #[test]
    fn test_paused_keeps_stop_visible() {
        // Stop remains available while paused so the user can end the
        // session without resuming first.
        assert!(MenuVisibility::PAUSED.stop);
        assert!(MenuVisibility::PAUSED.resume);
        assert!(!MenuVisibility::PAUSED.pause);
    }

    #[test]
    fn test_menu_command_lookup() {
        assert_eq!(
            MenuCommand::from_item_id("speak_text"),
            Some(MenuCommand::Speak)
        );
        assert_eq!(
            MenuCommand::from_item_id("resume_speech"),
            Some(MenuCommand::Resume)
        );
        assert_eq!(MenuCommand::from_item_id("unknown"), None);
    }

    #[test]
    fn test_menu_items_initial_state() {
        // Only the speak item starts visible, and only it is limited to
        // text selections.
        let visible: Vec<_> = MENU_ITEMS.iter().filter(|i| i.initially_visible).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "speak_text");
        assert_eq!(visible[0].contexts, ["selection"]);
    }
}
