pub mod common;
pub mod debug;
pub mod feed;
pub mod spinner;
pub mod status_bar;


use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
};

use crate::app::App;

const DEBUG_PANE_HEIGHT: u16 = 10;

/// Splits off the debug pane at the bottom when it is visible.
pub fn split_main(area: Rect, debug_visible: bool) -> (Rect, Option<Rect>) {
    if debug_visible {
        let [main, debug] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(DEBUG_PANE_HEIGHT)])
                .areas(area);
        (main, Some(debug))
    } else {
        (area, None)
    }
}

/// The rows cards are drawn into for a terminal of size `area`. The app lays
/// out cards for this rectangle before each draw.
pub fn list_area(area: Rect, debug_visible: bool) -> Rect {
    let (main, _) = split_main(area, debug_visible);
    feed::list_inner(main)
}

pub fn render(app: &App, frame: &mut Frame) {
    let (main_area, debug_area) = split_main(frame.area(), app.debug.visible);

    feed::render(frame, app, main_area);

    if let Some(debug_area) = debug_area {
        debug::render(frame, app, debug_area);
    }
}
