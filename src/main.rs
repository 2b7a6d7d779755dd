// postcache: compare uncached and cached data fetching side by side.
// Entry point wiring config, logging, the HTTP client and the TUI.

mod api;
mod app;
mod cache;
mod config;
mod error;
mod logging;
mod state;
mod ui;

use std::io;
use std::sync::Arc;

use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;

use crate::api::ApiClient;
use crate::app::App;
use crate::cache::ResourceCache;
use crate::config::Config;
use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let log_path = logging::setup_tracing()?;
    let api = Arc::new(ApiClient::new(&config)?);
    tracing::info!(
        base_url = %api.base_url(),
        log = ?log_path,
        "postcache starting"
    );

    let cache = ResourceCache::new(config.refresh_interval());
    let mut app = App::new(api, cache, &config);

    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableFocusChange)?;
    let result = app.run(&mut terminal);
    let disabled = execute!(io::stdout(), DisableFocusChange);
    ratatui::restore();
    disabled?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "postcache exited with an error");
    }
    Ok(result?)
}
