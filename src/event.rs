use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    Resize,
}

impl Event {
    /// Maps a terminal event to an app event. Key releases and events the
    /// reader has no use for (mouse, focus, paste) are dropped.
    pub fn from_crossterm(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Some(Event::Key(key)),
            CrosstermEvent::Resize(_, _) => Some(Event::Resize),
            _ => None,
        }
    }
}
