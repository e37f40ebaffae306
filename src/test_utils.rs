//! Test data builders for app and view tests.

use std::time::Instant;

use crate::api::{Article, Feed};
use crate::app::App;
use crate::settings::{ObserverKind, ViewportSettings};
use crate::storage::Storage;
use crate::theme::ResolvedTheme;
use crate::time::fixed_clock;

/// Fixed timestamp for deterministic tests: 2023-11-16 00:00:00 UTC.
/// Sample articles were edited around 1700000000, so they show as "1d ago".
pub const TEST_NOW: i64 = 1700092800;

pub struct ArticleBuilder {
    id: u64,
    title: String,
    description: Option<String>,
    extract: String,
    url: Option<String>,
    views: Option<u64>,
    edited_at: Option<i64>,
}

impl Default for ArticleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl ArticleBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            title: "Test Article".to_string(),
            description: Some("Test description".to_string()),
            extract: "A short test extract.".to_string(),
            url: None,
            views: None,
            edited_at: Some(1700000000),
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn no_description(mut self) -> Self {
        self.description = None;
        self
    }

    pub fn extract(mut self, extract: &str) -> Self {
        self.extract = extract.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn views(mut self, views: u64) -> Self {
        self.views = Some(views);
        self
    }

    pub fn edited_at(mut self, ts: i64) -> Self {
        self.edited_at = Some(ts);
        self
    }

    pub fn build(self) -> Article {
        let url = self.url.unwrap_or_else(|| {
            format!("https://en.wikipedia.org/wiki/{}", self.title.replace(' ', "_"))
        });
        Article {
            id: self.id,
            title: self.title,
            description: self.description,
            extract: self.extract,
            url,
            views: self.views,
            edited_at: self.edited_at,
        }
    }
}

#[allow(dead_code)]
pub struct TestAppBuilder {
    feed: Feed,
    articles: Vec<Article>,
    seen: Vec<u64>,
    current: Option<usize>,
    loading: bool,
    loading_more: bool,
    current_page: usize,
    has_more: bool,
    error: Option<String>,
    show_help: bool,
    show_debug: bool,
    scroll_offset: usize,
    theme: ResolvedTheme,
    viewport: ViewportSettings,
    storage: Option<Storage>,
    mounted: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            feed: Feed::Random,
            articles: Vec::new(),
            seen: Vec::new(),
            current: None,
            loading: false,
            loading_more: false,
            current_page: 0,
            has_more: true,
            error: None,
            show_help: false,
            show_debug: false,
            scroll_offset: 0,
            theme: ResolvedTheme::dark(),
            viewport: ViewportSettings::default(),
            storage: None,
            mounted: false,
        }
    }

    pub fn feed(mut self, feed: Feed) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_articles(mut self, articles: Vec<Article>) -> Self {
        self.articles = articles;
        self
    }

    pub fn seen(mut self, ids: Vec<u64>) -> Self {
        self.seen = ids;
        self
    }

    /// Sets the current index directly, without going through the viewport.
    pub fn current(mut self, index: usize) -> Self {
        self.current = Some(index);
        self
    }

    pub fn loading(mut self) -> Self {
        self.loading = true;
        self
    }

    pub fn loading_more(mut self, loading: bool) -> Self {
        self.loading_more = loading;
        self
    }

    pub fn has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    pub fn error(mut self, msg: &str) -> Self {
        self.error = Some(msg.to_string());
        self
    }

    pub fn show_help(mut self) -> Self {
        self.show_help = true;
        self
    }

    pub fn show_debug(mut self) -> Self {
        self.show_debug = true;
        self
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn theme(mut self, theme: ResolvedTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn observer(mut self, kind: ObserverKind) -> Self {
        self.viewport.observer = kind;
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Mounts the viewport on the builder's articles.
    pub fn mounted(mut self) -> Self {
        self.mounted = true;
        self
    }

    pub fn build(self) -> App {
        let mut app = App::new(self.theme, &self.viewport, self.storage);
        app.feed = self.feed;
        app.articles = self.articles;
        app.seen = self.seen.into_iter().collect();
        app.current = self.current;
        app.load.loading = self.loading;
        app.load.loading_start = self.loading.then(Instant::now);
        app.load.loading_more = self.loading_more;
        app.load.current_page = self.current_page;
        app.load.has_more = self.has_more;
        app.load.error = self.error;
        app.show_help = self.show_help;
        app.debug.visible = self.show_debug;
        app.scroll_offset = self.scroll_offset;
        app.clock = fixed_clock(TEST_NOW);
        if self.mounted {
            app.mount = Some(app.viewport.mount(&app.articles));
        }
        app
    }
}

pub fn sample_articles() -> Vec<Article> {
    vec![
        ArticleBuilder::new()
            .id(1)
            .title("Ada Lovelace")
            .description("English mathematician (1815–1852)")
            .extract("Augusta Ada King, Countess of Lovelace, was an English mathematician and writer chiefly known for her work on Charles Babbage's proposed mechanical general-purpose computer, the Analytical Engine.")
            .views(182_311)
            .edited_at(1700000000)
            .build(),
        ArticleBuilder::new()
            .id(2)
            .title("Tardigrade")
            .description("Phylum of water-dwelling micro-animals")
            .extract("Tardigrades, known colloquially as water bears or moss piglets, are a phylum of eight-legged segmented micro-animals.")
            .views(64_020)
            .edited_at(1699990000)
            .build(),
        ArticleBuilder::new()
            .id(3)
            .title("Voynich manuscript")
            .no_description()
            .extract("The Voynich manuscript is an illustrated codex hand-written in an unknown script.")
            .edited_at(1699980000)
            .build(),
        ArticleBuilder::new()
            .id(4)
            .title("Great Emu War")
            .description("1932 wildlife management operation in Australia")
            .extract("The Emu War was a nuisance wildlife management military operation undertaken in Australia over the later part of 1932.")
            .views(91_877)
            .edited_at(1699970000)
            .build(),
        ArticleBuilder::new()
            .id(5)
            .title("Lake Baikal")
            .description("Rift lake in Siberia, Russia")
            .extract("Lake Baikal is a rift lake and the deepest lake in the world.")
            .views(23_456)
            .edited_at(1699960000)
            .build(),
    ]
}
