//! Dynamic help text generation from keymaps.

use crate::app::Message;
use crate::keys::{Keymap, format_key};

/// A single help item representing one or more related actions.
pub struct HelpItem {
    /// Messages to look up keys for. Keys are joined with "/".
    messages: Vec<Message>,
    /// The label to show (e.g., "scroll", "open", "quit").
    label: &'static str,
}

impl HelpItem {
    /// Create a help item for a single action.
    pub fn new(message: Message, label: &'static str) -> Self {
        Self {
            messages: vec![message],
            label,
        }
    }

    /// Create a help item for paired actions (e.g., n/p for next/prev card).
    pub fn pair(first: Message, second: Message, label: &'static str) -> Self {
        Self {
            messages: vec![first, second],
            label,
        }
    }

    /// Format this help item using the given keymap.
    /// Returns None if no keys are bound for any of the messages.
    pub fn format(&self, keymap: &Keymap) -> Option<String> {
        let keys: Vec<String> = self
            .messages
            .iter()
            .filter_map(|msg| {
                keymap
                    .find_key(msg)
                    .map(|(code, mods)| format_key(code, mods))
            })
            .collect();
        if keys.is_empty() {
            return None;
        }
        Some(format!("{}:{}", keys.join("/"), self.label))
    }
}

/// A collection of help items for a specific context.
pub struct HelpConfig {
    /// Items to show in expanded (full help) mode.
    pub expanded: Vec<HelpItem>,
    /// Items to show in compact (minimal) mode.
    pub compact: Vec<HelpItem>,
}

impl HelpConfig {
    /// Format help text for the given mode.
    pub fn format(&self, keymap: &Keymap, show_expanded: bool) -> String {
        let items = if show_expanded {
            &self.expanded
        } else {
            &self.compact
        };
        items
            .iter()
            .filter_map(|item| item.format(keymap))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Help configuration for the feed.
pub fn feed_help() -> HelpConfig {
    use Message::{
        Bottom, HalfPageDown, HalfPageUp, NextCard, NextFeed, OpenArticle, PrevCard, Quit,
        Refresh, ScrollDown, ScrollUp, ToggleDebug, ToggleHelp, Top,
    };
    HelpConfig {
        expanded: vec![
            HelpItem::pair(ScrollDown, ScrollUp, "scroll"),
            HelpItem::pair(HalfPageDown, HalfPageUp, "half page"),
            HelpItem::pair(NextCard, PrevCard, "cards"),
            HelpItem::pair(Top, Bottom, "top/bottom"),
            HelpItem::new(NextFeed, "feed"),
            HelpItem::new(OpenArticle, "open"),
            HelpItem::new(Refresh, "refresh"),
            HelpItem::new(ToggleDebug, "debug"),
            HelpItem::new(Quit, "quit"),
            HelpItem::new(ToggleHelp, "hide"),
        ],
        compact: vec![
            HelpItem::pair(NextCard, PrevCard, "cards"),
            HelpItem::new(OpenArticle, "open"),
            HelpItem::new(NextFeed, "feed"),
            HelpItem::new(ToggleHelp, "help"),
            HelpItem::new(Quit, "quit"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::app_keymap;

    #[test]
    fn feed_help_expanded_contains_expected_items() {
        let help = feed_help().format(&app_keymap(), true);
        assert!(help.contains("j/k:scroll"));
        assert!(help.contains("C-d/C-u:half page"));
        assert!(help.contains("n/p:cards"));
        assert!(help.contains("g/G:top/bottom"));
        assert!(help.contains("q:quit"));
    }

    #[test]
    fn feed_help_compact_is_shorter() {
        let keymap = app_keymap();
        let expanded = feed_help().format(&keymap, true);
        let compact = feed_help().format(&keymap, false);
        assert!(compact.len() < expanded.len());
        assert!(compact.contains("Tab:feed"));
        assert!(compact.contains("?:help"));
    }

    #[test]
    fn help_item_returns_none_for_unbound_message() {
        let keymap = Keymap::new(); // Empty keymap
        let item = HelpItem::new(Message::Quit, "quit");
        assert!(item.format(&keymap).is_none());
    }
}
