//! EPUB reader controller layered on the rendering engine's event stream.
//!
//! The engine does the actual rendering and structural navigation; this
//! controller arms position tracking only once the location index exists,
//! keeps the single-bookmark contract, and handles swipe input itself
//! because the engine's built-in gesture handling did not fire reliably.

use crate::cache::BookCache;
use crate::config::BookEnv;
use crate::engine::{PageDirection, Relocation, RenderEngine};
use crate::progress::{ProgressSync, SaveMode, SaveOutcome, percent_from_fraction};
use crate::sync::ProgressStore;
use crate::theme::{ThemeDef, ThemeRegistry};
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Net movement of one touch interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchTracker {
    start: Option<(f32, f32)>,
}

impl TouchTracker {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.start = Some((x, y));
    }

    /// Net (dx, dy) since `begin`, if a touch was in progress.
    pub fn end(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let (start_x, start_y) = self.start.take()?;
        Some((x - start_x, y - start_y))
    }
}

pub struct EpubReader<S: ProgressStore, E: RenderEngine> {
    engine: E,
    sync: ProgressSync<S>,
    cache: BookCache,
    themes: ThemeRegistry,
    book_key: String,
    /// At most one bookmark per book.
    bookmark: Option<String>,
    /// Relocations are ignored until the location index is in place, so no
    /// percentage is ever reported against a missing index.
    locations_ready: bool,
    /// Start of the currently displayed range; what gets persisted.
    position: Option<String>,
    percent: u8,
    touch: TouchTracker,
    swipe_threshold: f32,
}

impl<S: ProgressStore, E: RenderEngine> EpubReader<S, E> {
    pub fn new(
        engine: E,
        sync: ProgressSync<S>,
        cache: BookCache,
        env: &BookEnv,
        swipe_threshold: f32,
    ) -> Self {
        let mut bookmarks = env.bookmarks.iter();
        let bookmark = bookmarks.next().cloned();
        if bookmarks.next().is_some() {
            debug!("Host supplied more than one bookmark; keeping the first");
        }
        EpubReader {
            engine,
            sync,
            cache,
            themes: ThemeRegistry::new(env.themes.clone()),
            book_key: env.book_key(),
            bookmark,
            locations_ready: false,
            position: None,
            percent: 0,
            touch: TouchTracker::default(),
            swipe_threshold,
        }
    }

    /// First content-ready signal: build or load the location index before
    /// relocation handling is armed, then jump to the saved position. A
    /// failed jump is logged and the book opens at its beginning.
    pub fn content_ready(&mut self) -> Result<()> {
        let restored = match self.cache.load_location_index(&self.book_key) {
            Some(index) => match self.engine.load_locations(&index) {
                Ok(()) => {
                    debug!(book = %self.book_key, "Loaded location index from cache");
                    true
                }
                Err(err) => {
                    warn!("Cached location index rejected, regenerating: {err:#}");
                    false
                }
            },
            None => false,
        };
        if !restored {
            let index = self
                .engine
                .generate_locations()
                .context("failed to build location index")?;
            self.cache.save_location_index(&self.book_key, &index);
            info!(book = %self.book_key, "Generated and cached location index");
        }
        self.locations_ready = true;

        if let Some(token) = self.sync.restore() {
            if let Err(err) = self.engine.display(&token) {
                warn!("Failed to jump to saved position: {err:#}");
            }
        }
        Ok(())
    }

    pub fn on_relocated(&mut self, relocation: &Relocation) -> Option<SaveOutcome> {
        self.on_relocated_at(relocation, Instant::now())
    }

    /// Handle the engine's relocation event: update the visible percentage
    /// and attempt a debounced save. Returns `None` when the event arrived
    /// before the location index was ready and was dropped.
    pub fn on_relocated_at(
        &mut self,
        relocation: &Relocation,
        now: Instant,
    ) -> Option<SaveOutcome> {
        if !self.locations_ready {
            debug!("Dropping relocation before location index is ready");
            return None;
        }
        self.percent = percent_from_fraction(relocation.end.percentage);
        self.position = Some(relocation.start.cfi.clone());
        let token = relocation.start.cfi.clone();
        Some(self.sync.save_at(&token, self.percent, SaveMode::Debounced, now))
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Text for the progress indicator element.
    pub fn progress_label(&self) -> String {
        format!("{}%", self.percent)
    }

    /// Replace any existing bookmark with `location` and persist it. The old
    /// mark is dropped client-side before the POST; a persistence failure is
    /// the one error the host surfaces to the user.
    pub fn add_bookmark(&mut self, location: &str) -> Result<()> {
        if self.bookmark.take().is_some() {
            debug!("Dropping previous bookmark");
        }
        self.bookmark = Some(location.to_string());
        self.sync
            .store()
            .save_bookmark(location)
            .context("failed to save bookmark")
    }

    /// Clear the bookmark; persisted as the empty string.
    pub fn remove_bookmark(&mut self) -> Result<()> {
        self.bookmark = None;
        self.sync
            .store()
            .save_bookmark("")
            .context("failed to clear bookmark")
    }

    pub fn bookmark(&self) -> Option<&str> {
        self.bookmark.as_deref()
    }

    pub fn on_touch_start(&mut self, x: f32, y: f32) {
        self.touch.begin(x, y);
    }

    /// Finish a touch interaction; a mostly-horizontal movement past the
    /// threshold turns one page. Which engine call is "forward" depends on
    /// the book's page progression direction.
    pub fn on_touch_end(&mut self, x: f32, y: f32) -> Result<()> {
        let Some((dx, dy)) = self.touch.end(x, y) else {
            return Ok(());
        };
        if dx.abs() < self.swipe_threshold || dx.abs() <= dy.abs() {
            return Ok(());
        }
        let forward = match self.engine.direction() {
            PageDirection::LeftToRight => dx < 0.0,
            PageDirection::RightToLeft => dx > 0.0,
        };
        if forward {
            self.engine.next_page().context("swipe page-forward failed")
        } else {
            self.engine.prev_page().context("swipe page-back failed")
        }
    }

    /// Last-selected theme, falling back to the default light theme.
    pub fn current_theme(&self) -> Option<&ThemeDef> {
        let stored = self.cache.load_theme();
        self.themes.resolve(stored.as_deref())
    }

    /// Select a registered theme and remember the choice across sessions.
    pub fn select_theme(&mut self, name: &str) -> Option<&ThemeDef> {
        if self.themes.get(name).is_none() {
            warn!(name, "Ignoring unknown theme selection");
            return None;
        }
        self.cache.save_theme(name);
        self.themes.get(name)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Final save on teardown; ignores the debounce floor. `None` when no
    /// relocation was ever seen, so there is nothing to persist.
    pub fn finish(&mut self) -> Option<SaveOutcome> {
        self.finish_at(Instant::now())
    }

    pub fn finish_at(&mut self, now: Instant) -> Option<SaveOutcome> {
        let position = self.position.clone()?;
        Some(self.sync.save_at(&position, self.percent, SaveMode::Forced, now))
    }
}
