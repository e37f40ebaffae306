use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::Feed;
use crate::app::{App, Message};

/// A declarative keybinding map that can be composed and extended.
#[derive(Clone)]
pub struct Keymap {
    bindings: Vec<(KeyCode, KeyModifiers, Message)>,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a key binding with no modifiers.
    pub fn bind(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::NONE, message));
        self
    }

    /// Add a key binding with Ctrl modifier.
    pub fn bind_ctrl(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::CONTROL, message));
        self
    }

    /// Look up a message for a key event.
    /// Later bindings take precedence over earlier ones.
    pub fn get(&self, event: &KeyEvent) -> Option<Message> {
        self.bindings
            .iter()
            .rev()
            .find(|(code, mods, _)| *code == event.code && event.modifiers.contains(*mods))
            .map(|(_, _, msg)| msg.clone())
    }

    /// Extend this keymap with another. The other keymap's bindings take precedence.
    pub fn extend(mut self, other: Self) -> Self {
        self.bindings.extend(other.bindings);
        self
    }

    /// Find the first key bound to a specific message.
    pub fn find_key(&self, message: &Message) -> Option<(KeyCode, KeyModifiers)> {
        self.bindings
            .iter()
            .find(|(_, _, msg)| msg == message)
            .map(|(code, mods, _)| (*code, *mods))
    }
}

/// Format a key binding for display in help text.
pub fn format_key(code: KeyCode, mods: KeyModifiers) -> String {
    let key_str = match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    };
    if mods.contains(KeyModifiers::CONTROL) {
        format!("C-{key_str}")
    } else if mods.contains(KeyModifiers::ALT) {
        format!("M-{key_str}")
    } else {
        key_str
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Keybindings that work regardless of what is on screen.
pub fn global_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('q'), Message::Quit)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
        .bind(KeyCode::Char('`'), Message::ToggleDebug)
        .bind(KeyCode::Char('?'), Message::ToggleHelp)
}

/// Feed keybindings: scrolling, card jumps and feed switching.
pub fn feed_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('j'), Message::ScrollDown)
        .bind(KeyCode::Down, Message::ScrollDown)
        .bind(KeyCode::Char('k'), Message::ScrollUp)
        .bind(KeyCode::Up, Message::ScrollUp)
        .bind_ctrl(KeyCode::Char('d'), Message::HalfPageDown)
        .bind_ctrl(KeyCode::Char('u'), Message::HalfPageUp)
        .bind(KeyCode::Char('n'), Message::NextCard)
        .bind(KeyCode::Char(' '), Message::NextCard)
        .bind(KeyCode::Char('p'), Message::PrevCard)
        .bind(KeyCode::Char('g'), Message::Top)
        .bind(KeyCode::Char('G'), Message::Bottom)
        .bind(KeyCode::Char('o'), Message::OpenArticle)
        .bind(KeyCode::Enter, Message::OpenArticle)
        .bind(KeyCode::Char('r'), Message::Refresh)
        .bind(KeyCode::Tab, Message::NextFeed)
        .bind(KeyCode::Char('1'), Message::SwitchFeed(Feed::Random))
        .bind(KeyCode::Char('2'), Message::SwitchFeed(Feed::Trending))
}

/// The full keymap. Feed bindings are added after the global ones, so they
/// win on conflicts.
pub fn app_keymap() -> Keymap {
    global_keymap().extend(feed_keymap())
}

/// Extra keys while the expanded help is showing.
fn help_keymap() -> Keymap {
    Keymap::new().bind(KeyCode::Esc, Message::ToggleHelp)
}

pub fn handle_key(key: KeyEvent, app: &App) -> Option<Message> {
    if app.show_help
        && let Some(msg) = help_keymap().get(&key)
    {
        return Some(msg);
    }
    app_keymap().get(&key)
}
