//! Card geometry for the feed.
//!
//! Every article is laid out as a card in content rows: wrapped title, an
//! optional one-line description, a bounded extract and a meta line. Cards
//! are separated by one blank row. The bounds double as the viewport markers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::Article;
use crate::viewport::{FeedItem, LayoutFrame, RowRange};

/// Columns taken by the selection gutter on the left of each card.
pub const GUTTER: usize = 2;
pub const EXTRACT_LINES: usize = 3;
const CARD_SPACING: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: Vec<String>,
    pub description: Option<String>,
    pub extract: Vec<String>,
    pub bounds: RowRange,
}

impl Card {
    fn wrap(article: &Article, width: usize) -> Self {
        let text_width = width.saturating_sub(GUTTER).max(1);
        let title = textwrap::wrap(&article.title, text_width)
            .into_iter()
            .map(|line| line.into_owned())
            .collect();
        let description = article
            .description
            .as_deref()
            .map(|d| truncate(d, text_width));
        let extract = wrap_bounded(&article.extract, text_width, EXTRACT_LINES);

        let mut card = Card {
            title,
            description,
            extract,
            bounds: RowRange::default(),
        };
        card.bounds.height = card.height();
        card
    }

    /// Rows including the meta line.
    pub fn height(&self) -> usize {
        self.title.len() + usize::from(self.description.is_some()) + self.extract.len() + 1
    }
}

/// Wraps `text` to at most `max_lines`, ending the last kept line with an
/// ellipsis when something was cut.
fn wrap_bounded(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = textwrap::wrap(text, width)
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = truncate(&format!("{last}…"), width);
        }
    }
    lines
}

/// Cuts `text` to `width` display columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// All cards of the feed at one terminal width.
#[derive(Debug, Clone, Default)]
pub struct FeedLayout {
    pub width: u16,
    pub cards: Vec<Card>,
    pub total_height: usize,
}

impl FeedLayout {
    pub fn build(articles: &[Article], width: u16) -> Self {
        let mut top = 0;
        let mut cards = Vec::with_capacity(articles.len());
        for article in articles {
            let mut card = Card::wrap(article, usize::from(width));
            card.bounds.top = top;
            top = card.bounds.bottom() + CARD_SPACING;
            cards.push(card);
        }
        let total_height = top.saturating_sub(CARD_SPACING);
        Self {
            width,
            cards,
            total_height,
        }
    }

    pub fn max_scroll(&self, height: usize) -> usize {
        self.total_height.saturating_sub(height)
    }

    /// Index of the card covering `row`, or of the next card when `row` falls
    /// between two cards.
    pub fn card_at(&self, row: usize) -> Option<usize> {
        self.cards.iter().position(|card| card.bounds.bottom() > row)
    }

    /// The markers of one layout pass. Every card is a marker; its index
    /// attribute is its position in the list.
    pub fn frame(&self, articles: &[Article], viewport: RowRange) -> LayoutFrame {
        self.cards
            .iter()
            .zip(articles)
            .enumerate()
            .fold(LayoutFrame::new(viewport), |frame, (i, (card, article))| {
                frame.with_marker(article.marker_key(), i.to_string(), card.bounds)
            })
    }
}
