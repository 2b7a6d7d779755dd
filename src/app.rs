// App state and main event loop.
// Owns both strategies, routes keys to the focused pane and redraws.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;

use crate::api::PostsApi;
use crate::cache::ResourceCache;
use crate::config::Config;
use crate::state::{CachedPosts, ListCursor, PostStrategy, UncachedPosts};
use crate::ui;

/// Which list has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Uncached,
    Cached,
}

impl Pane {
    pub fn title(&self) -> &'static str {
        match self {
            Pane::Uncached => "Single Query",
            Pane::Cached => "Prefetch + Cache",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Pane::Uncached => Pane::Cached,
            Pane::Cached => Pane::Uncached,
        }
    }
}

/// Main application state.
pub struct App<A: PostsApi> {
    /// Pane receiving navigation keys.
    pub focus: Pane,
    pub uncached: UncachedPosts<A>,
    pub cached: CachedPosts<A>,
    pub uncached_cursor: ListCursor,
    pub cached_cursor: ListCursor,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
}

impl<A: PostsApi> App<A> {
    pub fn new(api: Arc<A>, cache: ResourceCache, config: &Config) -> Self {
        Self {
            focus: Pane::default(),
            uncached: UncachedPosts::new(api.clone(), config),
            cached: CachedPosts::new(api, cache, config),
            uncached_cursor: ListCursor::new(),
            cached_cursor: ListCursor::new(),
            show_help: false,
            should_quit: false,
        }
    }

    /// Kick off the initial posts fetch on both sides.
    pub fn mount(&mut self) {
        self.uncached.mount();
        self.cached.mount();
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.mount();
        while !self.should_quit {
            self.apply_pending();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Pull finished fetches into both strategies.
    pub fn apply_pending(&mut self) -> bool {
        let uncached = self.uncached.apply_pending();
        let cached = self.cached.apply_pending();
        if uncached {
            clamp_cursor(&mut self.uncached_cursor, &self.uncached);
        }
        if cached {
            clamp_cursor(&mut self.cached_cursor, &self.cached);
        }
        uncached || cached
    }

    /// Handle keyboard and focus events.
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            self.handle_event(event::read()?);
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::FocusGained => {
                self.uncached.focus_gained();
                self.cached.focus_gained();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.focus = self.focus.next();
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_highlighted(),
            _ => {}
        }
    }

    fn focused(&mut self) -> (&mut dyn PostStrategy, &mut ListCursor) {
        match self.focus {
            Pane::Uncached => (&mut self.uncached, &mut self.uncached_cursor),
            Pane::Cached => (&mut self.cached, &mut self.cached_cursor),
        }
    }

    /// Move the highlight; landing on a post counts as hovering it.
    fn move_cursor(&mut self, down: bool) {
        let (strategy, cursor) = self.focused();
        let Some(posts) = strategy.posts().data() else {
            return;
        };
        let len = posts.len();
        let index = if down {
            cursor.select_next(len)
        } else {
            cursor.select_prev(len)
        };
        if let Some(post_id) = index.and_then(|i| posts.get(i)).map(|p| p.id) {
            strategy.hover(post_id);
        }
    }

    fn toggle_highlighted(&mut self) {
        let (strategy, cursor) = self.focused();
        let post_id = cursor
            .selected()
            .and_then(|i| strategy.posts().data()?.get(i).map(|p| p.id));
        if let Some(post_id) = post_id {
            strategy.toggle_post(post_id);
        }
    }
}

fn clamp_cursor(cursor: &mut ListCursor, strategy: &dyn PostStrategy) {
    if let Some(posts) = strategy.posts().data() {
        cursor.clamp(posts.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::error::Resource;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn loaded_app() -> (Arc<MockApi>, App<MockApi>) {
        let api = Arc::new(MockApi::seeded());
        let mut app = App::new(api.clone(), ResourceCache::default(), &Config::default());
        app.mount();
        while !(app.uncached.posts().is_loaded() && app.cached.posts().is_loaded()) {
            tokio::task::yield_now().await;
            app.apply_pending();
        }
        (api, app)
    }

    #[test]
    fn test_pane_cycle() {
        assert_eq!(Pane::Uncached.next(), Pane::Cached);
        assert_eq!(Pane::Cached.next(), Pane::Uncached);
    }

    #[tokio::test]
    async fn test_cursor_starts_on_first_post() {
        let (_, app) = loaded_app().await;
        assert_eq!(app.uncached_cursor.selected(), Some(0));
        assert_eq!(app.cached_cursor.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_hover_prefetches_only_on_cached_pane() {
        let (api, mut app) = loaded_app().await;

        app.handle_event(press(KeyCode::Down));
        tokio::task::yield_now().await;
        assert_eq!(api.count(Resource::Comments), 0);

        app.handle_event(press(KeyCode::Tab));
        assert_eq!(app.focus, Pane::Cached);
        app.handle_event(press(KeyCode::Down));
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(api.count(Resource::Comments), 1);
        assert!(app.cached.selected_post().is_none());
    }

    #[tokio::test]
    async fn test_enter_toggles_highlighted_post() {
        let (_, mut app) = loaded_app().await;

        app.handle_event(press(KeyCode::Enter));
        assert_eq!(app.uncached.selected_post(), Some(1));
        app.handle_event(press(KeyCode::Enter));
        assert_eq!(app.uncached.selected_post(), None);
    }

    #[tokio::test]
    async fn test_help_swallows_keys() {
        let (_, mut app) = loaded_app().await;

        app.handle_event(press(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_event(press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.handle_event(press(KeyCode::Esc));
        assert!(!app.show_help);
        app.handle_event(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
