use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

/// One line describing what the viewport currently tracks.
fn viewport_summary(app: &App) -> String {
    let viewport = &app.viewport;
    let Some(mount) = viewport.mount_id() else {
        return "unmounted".to_string();
    };
    let mode = if viewport.is_degraded() {
        "degraded"
    } else {
        "observing"
    };
    let visible = match (viewport.visible().first(), viewport.visible().last()) {
        (Some(first), Some(last)) => format!("{first}..={last}"),
        _ => "none".to_string(),
    };
    let current = viewport
        .current_index()
        .map_or_else(|| "-".to_string(), |i| i.to_string());
    format!(
        "#{} {} {}/{} visible {} current {}",
        mount.get(),
        mode,
        viewport.attached_count(),
        viewport.item_count(),
        visible,
        current
    )
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(theme.dim_style());

    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Viewport: ", theme.dim_style()),
        Span::styled(viewport_summary(app), Style::default().fg(theme.foreground)),
    ]));

    // Running tasks
    let task_count = app.debug.running_tasks.len();
    lines.push(Line::from(vec![
        Span::styled("Tasks: ", theme.dim_style()),
        Span::styled(
            task_count.to_string(),
            Style::default().fg(if task_count > 0 {
                theme.primary
            } else {
                theme.foreground
            }),
        ),
    ]));

    for task in &app.debug.running_tasks {
        let elapsed = task.started_at.elapsed();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}] ", task.id), theme.dim_style()),
            Span::styled(&task.description, Style::default().fg(theme.foreground)),
            Span::styled(
                format!(" ({:.1?})", elapsed),
                Style::default().fg(theme.card_meta),
            ),
        ]));
    }

    // Recent log entries (newest first, limit to fit area)
    let available_lines = usize::from(area.height.saturating_sub(2)); // border
    let log_lines = available_lines.saturating_sub(lines.len());

    for entry in app.debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(Span::styled(
            format!("  {}", entry.message),
            theme.dim_style(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ObserverKind;
    use crate::test_utils::{TestAppBuilder, sample_articles};
    use crate::views::tests::render_app;

    #[test]
    fn test_unmounted_summary() {
        let app = TestAppBuilder::new().build();
        assert_eq!(viewport_summary(&app), "unmounted");
    }

    #[test]
    fn test_debug_pane_shows_viewport_and_log() {
        let mut app = TestAppBuilder::new()
            .with_articles(sample_articles())
            .has_more(false)
            .mounted()
            .show_debug()
            .build();
        app.debug.log("Load Random completed: 120ms");

        let output = render_app(&mut app, 100, 40);

        assert!(output.contains("Debug"));
        assert!(output.contains("observing 5/5 visible 0..="));
        assert!(output.contains("current 0"));
        assert!(output.contains("Load Random completed"));
    }

    #[test]
    fn test_degraded_summary() {
        let app = TestAppBuilder::new()
            .with_articles(sample_articles())
            .observer(ObserverKind::Disabled)
            .mounted()
            .build();
        let summary = viewport_summary(&app);
        assert!(summary.ends_with("degraded 0/5 visible 0..=4 current 0"));
    }
}
