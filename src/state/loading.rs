// Loading state and list cursor.
// Shared building blocks for both fetch strategies and the panes.

use ratatui::widgets::ListState;

/// Loading state for async data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadingState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Loaded when a value is available, loading otherwise.
    pub fn from_cached(value: Option<T>) -> Self {
        match value {
            Some(data) => LoadingState::Loaded(data),
            None => LoadingState::Loading,
        }
    }
}

/// Keyboard cursor over a list whose length can change underneath it.
#[derive(Debug, Clone, Default)]
pub struct ListCursor {
    pub list_state: ListState,
}

impl ListCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Move down, stopping at the last item. Returns the new index.
    pub fn select_next(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => len - 1,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
        Some(i)
    }

    /// Move up, stopping at the first item. Returns the new index.
    pub fn select_prev(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        Some(i)
    }

    /// Keep the cursor inside the list after it was (re)loaded.
    pub fn clamp(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }
}
