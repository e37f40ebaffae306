use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::theme::ResolvedTheme;

/// Builder for rendering a consistent status bar across views.
///
/// The status bar has a standard layout:
/// `[Label] [Loading?] [Error?] Position | Help Text`
pub struct StatusBar<'a> {
    theme: &'a ResolvedTheme,
    label: &'a str,
    loading_text: Option<&'a str>,
    error_text: Option<&'a str>,
    position: Option<(usize, usize)>,
    help_text: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new(theme: &'a ResolvedTheme) -> Self {
        Self {
            theme,
            label: "",
            loading_text: None,
            error_text: None,
            position: None,
            help_text: "",
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn loading(mut self, text: &'a str) -> Self {
        self.loading_text = Some(text);
        self
    }

    /// A failure that did not replace the feed, like a failed next page.
    pub fn error(mut self, text: &'a str) -> Self {
        self.error_text = Some(text);
        self
    }

    pub fn position(mut self, current: usize, total: usize) -> Self {
        self.position = Some((current, total));
        self
    }

    pub fn help(mut self, text: &'a str) -> Self {
        self.help_text = text;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.label),
                self.theme.status_bar_style(),
            ),
            Span::raw(" "),
        ];

        if let Some(loading) = self.loading_text {
            spans.push(Span::styled(
                loading.to_string(),
                self.theme.spinner_style(),
            ));
            spans.push(Span::raw(" | "));
        }

        if let Some(error) = self.error_text {
            spans.push(Span::styled(error.to_string(), self.theme.error_style()));
            spans.push(Span::raw(" | "));
        }

        if let Some((current, total)) = self.position {
            spans.push(Span::styled(
                format!("{}/{}", current, total),
                self.theme.dim_style(),
            ));
            spans.push(Span::raw(" | "));
        }

        spans.push(Span::styled(
            self.help_text.to_string(),
            self.theme.dim_style(),
        ));

        let status = Line::from(spans);
        frame.render_widget(Paragraph::new(status), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::render_to_string;

    #[test]
    fn test_status_bar_full() {
        let theme = ResolvedTheme::dark();
        let output = render_to_string(60, 1, |frame| {
            StatusBar::new(&theme)
                .label("Random")
                .position(5, 100)
                .help("n/p:cards  ?:help")
                .render(frame, frame.area());
        });

        assert!(output.contains("Random"));
        assert!(output.contains("5/100"));
        assert!(output.contains("n/p:cards"));
    }

    #[test]
    fn test_status_bar_with_loading_and_error() {
        let theme = ResolvedTheme::dark();
        let output = render_to_string(80, 1, |frame| {
            StatusBar::new(&theme)
                .label("Trending")
                .loading("⠋ Loading more...")
                .error("Network error")
                .position(1, 50)
                .help("?:help")
                .render(frame, frame.area());
        });

        assert!(output.contains("Loading more"));
        assert!(output.contains("Network error"));
        assert!(output.contains("1/50"));
    }

    #[test]
    fn test_status_bar_minimal() {
        let theme = ResolvedTheme::dark();
        let output = render_to_string(40, 1, |frame| {
            StatusBar::new(&theme)
                .label("Random")
                .help("q:quit")
                .render(frame, frame.area());
        });

        insta::assert_snapshot!(output.trim(), @"Random  q:quit");
    }
}
