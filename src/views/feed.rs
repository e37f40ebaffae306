use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::api::{Article, Feed};
use crate::app::App;
use crate::cards::{Card, GUTTER};
use crate::help::feed_help;
use crate::keys::app_keymap;
use crate::theme::ResolvedTheme;
use crate::time::format_relative;
use crate::views::common::{format_count, render_error};
use crate::views::spinner::spinner_frame;
use crate::views::status_bar::StatusBar;

fn split(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1), // Feed tabs
        Constraint::Min(0),    // Cards
        Constraint::Length(1), // Status bar
    ])
    .areas(area)
}

fn list_block(theme: &ResolvedTheme, feed: Feed) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" {} ", feed.label()))
}

/// Inner rectangle of the card list inside the feed view.
pub fn list_inner(area: Rect) -> Rect {
    let [_, list, _] = split(area);
    Block::default().borders(Borders::ALL).inner(list)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [tabs, list, status] = split(area);

    render_feed_tabs(frame, app, tabs);
    render_cards(frame, app, list);
    render_status_bar(frame, app, status);
}

fn render_feed_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans: Vec<Span> = Feed::all()
        .iter()
        .enumerate()
        .flat_map(|(i, feed)| {
            let style = if *feed == app.feed {
                theme.active_tab_style()
            } else {
                theme.dim_style()
            };
            vec![
                Span::styled(format!("[{}]", i + 1), theme.dim_style()),
                Span::styled(feed.label(), style),
                Span::raw("  "),
            ]
        })
        .collect();

    if app.load.should_show_spinner() {
        spans.push(Span::styled(
            spinner_frame(app.load.loading_start),
            theme.spinner_style(),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    if app.articles.is_empty() {
        if let Some(err) = &app.load.error {
            render_error(frame, err, theme, area);
        } else {
            let text = if app.load.loading {
                "Loading articles..."
            } else {
                "Nothing to read here."
            };
            let widget = Paragraph::new(Span::styled(text, theme.dim_style()))
                .block(list_block(theme, app.feed));
            frame.render_widget(widget, area);
        }
        return;
    }

    let block = list_block(theme, app.feed);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let top = app.scroll_offset;
    let bottom = top + usize::from(inner.height);
    let Some(first) = app.layout.card_at(top) else {
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    // Scrolled into the gap above `first`.
    let first_top = app.layout.cards[first].bounds.top;
    lines.extend((top..first_top).map(|_| Line::default()));

    let now = app.clock.now();
    let visible_cards = app
        .layout
        .cards
        .iter()
        .zip(&app.articles)
        .enumerate()
        .skip(first)
        .take_while(|(_, (card, _))| card.bounds.top < bottom);
    for (i, (card, article)) in visible_cards {
        if i > first {
            lines.push(Line::default());
        }
        let is_current = app.current == Some(i);
        let seen = app.seen.contains(&article.id);
        lines.extend(card_lines(card, article, is_current, seen, theme, now));
    }

    let skip = top.saturating_sub(first_top);
    let widget = Paragraph::new(lines).scroll((u16::try_from(skip).unwrap_or(u16::MAX), 0));
    frame.render_widget(widget, inner);
}

fn card_lines(
    card: &Card,
    article: &Article,
    is_current: bool,
    seen: bool,
    theme: &ResolvedTheme,
    now: i64,
) -> Vec<Line<'static>> {
    let gutter = || {
        if is_current {
            Span::styled(
                format!("{:<width$}", "▌", width = GUTTER),
                Style::default().fg(theme.primary),
            )
        } else {
            Span::raw(" ".repeat(GUTTER))
        }
    };

    let mut lines = Vec::with_capacity(card.height());
    let title_style = if is_current {
        theme.selection_style()
    } else {
        theme.title_style(seen)
    };
    for title in &card.title {
        lines.push(Line::from(vec![
            gutter(),
            Span::styled(title.clone(), title_style),
        ]));
    }
    if let Some(description) = &card.description {
        lines.push(Line::from(vec![
            gutter(),
            Span::styled(
                description.clone(),
                Style::default()
                    .fg(theme.card_description)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    for extract in &card.extract {
        lines.push(Line::from(vec![
            gutter(),
            Span::styled(extract.clone(), Style::default().fg(theme.foreground)),
        ]));
    }
    lines.push(Line::from(vec![
        gutter(),
        Span::styled(meta_text(article, now), Style::default().fg(theme.card_meta)),
    ]));
    lines
}

/// "12.3k views · edited 2d ago", with either part left out when unknown.
fn meta_text(article: &Article, now: i64) -> String {
    let views = article.views.map(|v| format!("{} views", format_count(v)));
    let edited = article
        .edited_at
        .map(|ts| format!("edited {}", format_relative(ts, now)));
    match (views, edited) {
        (Some(views), Some(edited)) => format!("{views} · {edited}"),
        (Some(part), None) | (None, Some(part)) => part,
        (None, None) => String::new(),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = feed_help().format(&app_keymap(), app.show_help);
    let loading_text = app
        .load
        .loading_more
        .then(|| format!("{} Loading more...", spinner_frame(app.load.loading_start)));

    let mut bar = StatusBar::new(&app.theme)
        .label(app.feed.label())
        .help(&help_text);
    if let Some(text) = &loading_text {
        bar = bar.loading(text);
    }
    // Errors with an empty feed are shown in place of the cards.
    if !app.articles.is_empty()
        && let Some(err) = &app.load.error
    {
        bar = bar.error(err);
    }
    if let Some(current) = app.current
        && !app.articles.is_empty()
    {
        bar = bar.position(current + 1, app.articles.len());
    }
    bar.render(frame, area);
}
