use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiError, Article, Feed, Page, WikiClient};
use crate::cards::FeedLayout;
use crate::settings::ViewportSettings;
use crate::storage::Storage;
use crate::theme::ResolvedTheme;
use crate::time::Clock;
use crate::viewport::{
    FeedViewport, MountId, RowRange, ViewportCallbacks, VisibleSet, should_prefetch,
};

pub enum AsyncResult {
    Articles {
        generation: u64,
        task_id: u64,
        result: Result<Page, ApiError>,
    },
    MoreArticles {
        generation: u64,
        task_id: u64,
        page: usize,
        result: Result<Page, ApiError>,
    },
    Saved {
        task_id: u64,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Debug panel state: task tracking and log messages.
#[derive(Debug, Default)]
pub struct DebugState {
    pub visible: bool,
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        debug!("{message}");
        self.log.push_back(LogEntry { message });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

/// Loading and pagination state.
#[derive(Debug, Default)]
pub struct LoadState {
    pub loading: bool,
    pub loading_start: Option<Instant>,
    pub loading_more: bool,
    pub current_page: usize,
    pub has_more: bool,
    pub error: Option<String>,
}

impl LoadState {
    pub fn new() -> Self {
        Self {
            has_more: true,
            ..Default::default()
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        if loading {
            self.loading_start = Some(Instant::now());
        }
        // loading_start is kept for the minimum spinner duration
    }

    pub fn should_show_spinner(&self) -> bool {
        const MIN_SPINNER_DURATION: std::time::Duration = std::time::Duration::from_millis(500);
        if self.loading_more {
            return true;
        }
        if let Some(start) = self.loading_start {
            self.loading || start.elapsed() < MIN_SPINNER_DURATION
        } else {
            false
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ScrollDown,
    ScrollUp,
    HalfPageDown,
    HalfPageUp,
    NextCard,
    PrevCard,
    Top,
    Bottom,
    OpenArticle,
    Refresh,
    NextFeed,
    SwitchFeed(Feed),
    ToggleHelp,
    ToggleDebug,
    Quit,
    // Sent by the viewport callbacks
    VisibilityChanged(VisibleSet),
    CurrentChanged(usize),
    LoadMore,
}

pub struct App {
    pub feed: Feed,
    pub articles: Vec<Article>,
    /// Articles that have been current at some point, this session or earlier.
    pub seen: HashSet<u64>,
    pub load: LoadState,
    pub should_quit: bool,
    pub show_help: bool,
    pub client: WikiClient,
    pub storage: Option<Storage>,
    /// First visible content row.
    pub scroll_offset: usize,
    pub theme: ResolvedTheme,
    pub clock: Arc<dyn Clock>,
    // Async task management
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub result_rx: mpsc::Receiver<AsyncResult>,
    pub generation: u64,
    pub debug: DebugState,
    // Viewport and the last state it reported
    pub viewport: FeedViewport,
    /// Handle of the active mount; layout passes are reported against it.
    pub mount: Option<MountId>,
    pub message_rx: mpsc::UnboundedReceiver<Message>,
    pub visible: VisibleSet,
    pub current: Option<usize>,
    pub layout: FeedLayout,
    layout_dirty: bool,
    pub list_height: usize,
}

fn viewport_callbacks(tx: &mpsc::UnboundedSender<Message>) -> ViewportCallbacks {
    let visible_tx = tx.clone();
    let current_tx = tx.clone();
    let more_tx = tx.clone();
    ViewportCallbacks::new()
        .on_visibility_change(move |visible| {
            visible_tx
                .send(Message::VisibilityChanged(visible.clone()))
                .context("reader stopped listening")
        })
        .on_current_index_change(move |index| {
            current_tx
                .send(Message::CurrentChanged(index))
                .context("reader stopped listening")
        })
        .on_load_more(move || {
            more_tx
                .send(Message::LoadMore)
                .context("reader stopped listening")
        })
}

impl App {
    pub fn new(
        theme: ResolvedTheme,
        viewport_settings: &ViewportSettings,
        storage: Option<Storage>,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let viewport = FeedViewport::new(
            viewport_settings.observation_service(),
            viewport_settings.observer_options(),
            viewport_callbacks(&message_tx),
        )
        .with_prefetch_distance(viewport_settings.prefetch_distance);

        Self {
            feed: Feed::default(),
            articles: Vec::new(),
            seen: HashSet::new(),
            load: LoadState::new(),
            should_quit: false,
            show_help: false,
            client: WikiClient::new(),
            storage,
            scroll_offset: 0,
            theme,
            clock: crate::time::system_clock(),
            result_tx,
            result_rx,
            generation: 0,
            debug: DebugState::new(),
            viewport,
            mount: None,
            message_rx,
            visible: VisibleSet::new(),
            current: None,
            layout: FeedLayout::default(),
            layout_dirty: true,
            list_height: 0,
        }
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::Articles {
                generation,
                task_id,
                result,
            } => {
                if generation != self.generation {
                    self.debug.end_task(task_id, "discarded (stale)");
                    return;
                }
                self.debug.end_task(task_id, outcome(&result));
                self.load.set_loading(false);
                match result {
                    Ok(page) => {
                        self.articles = page.articles;
                        self.load.current_page = 0;
                        self.load.has_more = page.has_more;
                        self.scroll_offset = 0;
                        self.layout_dirty = true;
                        let mount = self.viewport.mount(&self.articles);
                        self.mount = Some(mount);
                        self.debug.log(format!(
                            "Mounted viewport #{} with {} articles",
                            mount.get(),
                            self.articles.len()
                        ));
                        self.persist(self.articles.clone());
                        if self.needs_more() {
                            self.load_more();
                        }
                    }
                    Err(e) => self.fail(e),
                }
            }
            AsyncResult::MoreArticles {
                generation,
                task_id,
                page,
                result,
            } => {
                if generation != self.generation {
                    self.debug.end_task(task_id, "discarded (stale)");
                    return;
                }
                self.debug.end_task(task_id, outcome(&result));
                self.load.loading_more = false;
                match result {
                    Ok(fetched) => {
                        self.load.current_page = page;
                        self.load.has_more = fetched.has_more;
                        if !fetched.articles.is_empty() {
                            self.persist(fetched.articles.clone());
                            self.articles.extend(fetched.articles);
                            self.layout_dirty = true;
                            self.viewport.set_items(&self.articles);
                        }
                        if self.needs_more() {
                            self.load_more();
                        }
                    }
                    Err(e) => self.fail(e),
                }
            }
            AsyncResult::Saved { task_id, result } => {
                self.debug.end_task(task_id, outcome(&result));
                if let Err(e) = result {
                    self.fail(e);
                }
            }
        }
    }

    fn fail(&mut self, err: ApiError) {
        warn!(error = %err, fatal = err.is_fatal(), "request failed");
        self.load.set_error(err.user_message());
        if err.is_fatal() {
            self.should_quit = true;
        }
    }

    /// Applies every message the viewport has queued since the last call.
    pub fn drain_messages(&mut self) {
        while let Ok(msg) = self.message_rx.try_recv() {
            self.update(msg);
        }
    }

    pub fn update(&mut self, msg: Message) {
        match msg {
            Message::ScrollDown => self.scroll_down(1),
            Message::ScrollUp => self.scroll_up(1),
            Message::HalfPageDown => self.scroll_down(self.half_page()),
            Message::HalfPageUp => self.scroll_up(self.half_page()),
            Message::NextCard => self.next_card(),
            Message::PrevCard => self.prev_card(),
            Message::Top => self.scroll_offset = 0,
            Message::Bottom => self.scroll_offset = self.max_scroll(),
            Message::OpenArticle => self.open_article(),
            Message::Refresh => self.refresh(),
            Message::NextFeed => self.switch_feed(self.feed.next()),
            Message::SwitchFeed(feed) => self.switch_feed(feed),
            Message::ToggleHelp => self.show_help = !self.show_help,
            Message::ToggleDebug => self.debug.toggle(),
            Message::Quit => self.should_quit = true,
            Message::VisibilityChanged(visible) => self.visible = visible,
            Message::CurrentChanged(index) => self.set_current(index),
            Message::LoadMore => self.load_more(),
        }
    }

    /// Lays out the cards for the list area and reports the pass to the
    /// viewport.
    pub fn layout_pass(&mut self, width: u16, height: u16) {
        if self.layout_dirty || self.layout.width != width {
            self.layout = FeedLayout::build(&self.articles, width);
            self.layout_dirty = false;
        }
        self.list_height = usize::from(height);
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());

        let Some(mount) = self.mount else {
            return;
        };
        if self.viewport.is_degraded() {
            // Without observation the viewport never asks for more.
            if self.at_bottom() {
                self.load_more();
            }
            return;
        }
        let frame = self.layout.frame(
            &self.articles,
            RowRange::new(self.scroll_offset, self.list_height),
        );
        self.viewport.on_layout(mount, &frame);
    }

    pub fn current_article(&self) -> Option<&Article> {
        self.current.and_then(|i| self.articles.get(i))
    }

    fn set_current(&mut self, index: usize) {
        self.current = Some(index);
        let Some(article) = self.articles.get(index) else {
            return;
        };
        let id = article.id;
        if self.seen.insert(id)
            && let Some(storage) = self.storage.clone()
        {
            let article = article.clone();
            let tx = self.result_tx.clone();
            let task_id = self.debug.start_task(format!("Mark {id} seen"));
            tokio::spawn(async move {
                let result = storage.mark_seen(&article).await.map_err(ApiError::from);
                let _ = tx.send(AsyncResult::Saved { task_id, result }).await;
            });
        }
    }

    fn persist(&mut self, articles: Vec<Article>) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let tx = self.result_tx.clone();
        let task_id = self
            .debug
            .start_task(format!("Save {} articles", articles.len()));
        tokio::spawn(async move {
            let result = storage.save_articles(&articles).await.map_err(ApiError::from);
            let _ = tx.send(AsyncResult::Saved { task_id, result }).await;
        });
    }

    fn max_scroll(&self) -> usize {
        self.layout.max_scroll(self.list_height)
    }

    fn half_page(&self) -> usize {
        (self.list_height / 2).max(1)
    }

    fn at_bottom(&self) -> bool {
        !self.articles.is_empty() && self.scroll_offset + self.list_height >= self.layout.total_height
    }

    fn scroll_down(&mut self, rows: usize) {
        self.scroll_offset = (self.scroll_offset + rows).min(self.max_scroll());
    }

    fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    fn next_card(&mut self) {
        if let Some(card) = self
            .layout
            .cards
            .iter()
            .find(|card| card.bounds.top > self.scroll_offset)
        {
            self.scroll_offset = card.bounds.top.min(self.max_scroll());
        }
    }

    fn prev_card(&mut self) {
        if let Some(card) = self
            .layout
            .cards
            .iter()
            .rev()
            .find(|card| card.bounds.top < self.scroll_offset)
        {
            self.scroll_offset = card.bounds.top;
        }
    }

    fn open_article(&mut self) {
        let Some(url) = self.current_article().map(|a| a.url.clone()) else {
            return;
        };
        if let Err(e) = open::that(&url) {
            self.debug.log(format!("Failed to open {url}: {e}"));
        }
    }

    fn refresh(&mut self) {
        self.reset_feed();
        self.spawn_fetch(0, true, false);
    }

    fn switch_feed(&mut self, feed: Feed) {
        if self.feed != feed {
            self.feed = feed;
            self.load_articles();
        }
    }

    /// Starts the feed from its first page.
    pub fn load_articles(&mut self) {
        self.reset_feed();
        self.spawn_fetch(0, false, false);
    }

    fn reset_feed(&mut self) {
        self.generation += 1;
        self.viewport.unmount();
        self.mount = None;
        // Queued events describe the old list.
        while self.message_rx.try_recv().is_ok() {}
        self.articles.clear();
        self.layout_dirty = true;
        self.visible.clear();
        self.current = None;
        self.scroll_offset = 0;
        self.load.set_loading(true);
        self.load.clear_error();
        self.load.loading_more = false;
        self.load.current_page = 0;
        self.load.has_more = true;
    }

    /// True when the list is empty or an item near its end is on screen
    /// while more pages exist.
    fn needs_more(&self) -> bool {
        if self.load.loading || self.load.loading_more || !self.load.has_more {
            return false;
        }
        let count = self.articles.len();
        let distance = self.viewport.prefetch_distance();
        count == 0 || self.visible.iter().any(|&i| should_prefetch(i, count, distance))
    }

    /// Requests the next page. Ignored while a fetch is in flight or once the
    /// feed is exhausted.
    fn load_more(&mut self) {
        if self.load.loading || self.load.loading_more || !self.load.has_more {
            return;
        }
        self.load.loading_more = true;
        let next_page = self.load.current_page + 1;
        self.spawn_fetch(next_page, false, true);
    }

    /// Spawn an async task to fetch one page of the current feed.
    ///
    /// - `page`: Which page to fetch (0 for initial load)
    /// - `force_refresh`: Whether to drop cached responses first
    /// - `is_more`: If true, sends `AsyncResult::MoreArticles`; otherwise `AsyncResult::Articles`
    fn spawn_fetch(&mut self, page: usize, force_refresh: bool, is_more: bool) {
        let client = self.client.clone();
        let feed = self.feed;
        let tx = self.result_tx.clone();
        let generation = self.generation;
        let today = self.clock.today();
        let exclude: HashSet<u64> = self.articles.iter().map(|a| a.id).collect();

        let task_desc = if is_more {
            format!("Load {} page {}", feed.label(), page)
        } else if force_refresh {
            format!("Refresh {}", feed.label())
        } else {
            format!("Load {}", feed.label())
        };
        let task_id = self.debug.start_task(task_desc);

        tokio::spawn(async move {
            if force_refresh {
                client.clear_cache().await;
            }
            let result = client.fetch_page(feed, page, today, &exclude).await;
            let msg = if is_more {
                AsyncResult::MoreArticles {
                    generation,
                    task_id,
                    page,
                    result,
                }
            } else {
                AsyncResult::Articles {
                    generation,
                    task_id,
                    result,
                }
            };
            let _ = tx.send(msg).await;
        });
    }
}

fn outcome<T>(result: &Result<T, ApiError>) -> &'static str {
    if result.is_ok() { "completed" } else { "failed" }
}
