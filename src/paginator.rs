//! Horizontal paginator for plain-text documents.
//!
//! The host renders the text blob into a fixed viewport and reports the
//! measured widths; paging is a pure offset shift by (page width + gap). The
//! offset is zero at the start of the document and grows negative as the
//! reader advances, matching the CSS `left` offset the position token is
//! denominated in. Keyboard arrows, click targets, wheel and swipe input all
//! reduce to the same forward/backward intents.

use crate::progress::{ProgressSync, SaveMode, SaveOutcome, percent_complete};
use crate::sync::ProgressStore;
use std::time::Instant;
use tracing::{debug, warn};

/// Fixed gap between logical pages, in pixels.
pub const PAGE_GAP: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Forward,
    Backward,
}

pub struct TextPaginator<S: ProgressStore> {
    sync: ProgressSync<S>,
    viewport_width: u32,
    /// Logical page width; unset until the content has been measured, and
    /// navigation is a no-op until then.
    page_width: Option<u32>,
    /// Total scrollable width of the rendered content.
    scroll_width: u64,
    gap: u32,
    /// Current horizontal offset, always <= 0.
    offset: i64,
}

impl<S: ProgressStore> TextPaginator<S> {
    pub fn new(sync: ProgressSync<S>, viewport_width: u32) -> Self {
        TextPaginator {
            sync,
            viewport_width,
            page_width: None,
            scroll_width: 0,
            gap: PAGE_GAP,
            offset: 0,
        }
    }

    /// Record the measured content: the rendered natural width becomes the
    /// single logical page width, the scroll width bounds forward paging.
    /// Called once the asynchronously loaded text has been laid out, and
    /// again whenever the host re-measures.
    pub fn content_measured(&mut self, natural_width: u32, scroll_width: u64) {
        self.page_width = Some(natural_width);
        self.scroll_width = scroll_width;
        debug!(natural_width, scroll_width, "Content measured");
    }

    /// Apply saved progress as a negative horizontal offset. Call after
    /// [`content_measured`](Self::content_measured).
    pub fn restore(&mut self) {
        let Some(token) = self.sync.restore() else {
            return;
        };
        match token.trim().parse::<u64>() {
            Ok(pixels) => {
                self.offset = -(pixels as i64);
                debug!(offset = self.offset, "Restored reading position");
            }
            Err(err) => warn!(%token, "Ignoring unparseable saved offset: {err}"),
        }
    }

    pub fn navigate(&mut self, intent: NavIntent) -> bool {
        self.navigate_at(intent, Instant::now())
    }

    /// Apply a navigation intent; returns whether the offset changed. Any
    /// change triggers a debounced save attempt.
    pub fn navigate_at(&mut self, intent: NavIntent, now: Instant) -> bool {
        let moved = match intent {
            NavIntent::Forward => self.advance(),
            NavIntent::Backward => self.retreat(),
        };
        if moved {
            self.save(SaveMode::Debounced, now);
        }
        moved
    }

    fn advance(&mut self) -> bool {
        let Some(page_width) = self.page_width else {
            return false;
        };
        let candidate = self.offset - i64::from(page_width + self.gap);
        // Stepping past the trailing edge of the content is rejected outright
        // rather than clamped.
        if candidate.unsigned_abs() >= self.scroll_width {
            return false;
        }
        self.offset = candidate;
        true
    }

    fn retreat(&mut self) -> bool {
        let Some(page_width) = self.page_width else {
            return false;
        };
        if self.offset >= 0 {
            return false;
        }
        self.offset = (self.offset + i64::from(page_width + self.gap)).min(0);
        true
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    pub fn percent(&self) -> u8 {
        percent_complete(self.offset.unsigned_abs(), self.scroll_width)
    }

    /// Text for the progress indicator element.
    pub fn progress_label(&self) -> String {
        format!("{}%", self.percent())
    }

    /// Final save on teardown; ignores the debounce floor.
    pub fn finish(&mut self) -> SaveOutcome {
        self.finish_at(Instant::now())
    }

    pub fn finish_at(&mut self, now: Instant) -> SaveOutcome {
        self.save(SaveMode::Forced, now)
    }

    fn save(&mut self, mode: SaveMode, now: Instant) -> SaveOutcome {
        let token = self.offset.unsigned_abs().to_string();
        let percent = self.percent();
        self.sync.save_at(&token, percent, mode, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookFormat;
    use crate::sync::ProgressUpdate;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingStore {
        saved_token: Option<String>,
        saves: RefCell<Vec<ProgressUpdate>>,
    }

    impl ProgressStore for RecordingStore {
        fn fetch_progress(&self, _book_id: u64, _format: BookFormat) -> Result<Option<String>> {
            Ok(self.saved_token.clone())
        }

        fn save_progress(&self, update: &ProgressUpdate) -> Result<()> {
            self.saves.borrow_mut().push(update.clone());
            Ok(())
        }

        fn save_bookmark(&self, _location: &str) -> Result<()> {
            Ok(())
        }
    }

    fn paginator(store: RecordingStore) -> TextPaginator<RecordingStore> {
        let sync = ProgressSync::new(store, 7, BookFormat::Txt, Duration::from_secs(30));
        TextPaginator::new(sync, 500)
    }

    fn measured_paginator(scroll_width: u64) -> TextPaginator<RecordingStore> {
        let mut paginator = paginator(RecordingStore::default());
        paginator.content_measured(500, scroll_width);
        paginator
    }

    #[test]
    fn navigation_is_a_noop_before_content_is_measured() {
        let mut paginator = paginator(RecordingStore::default());
        assert!(!paginator.navigate_at(NavIntent::Forward, Instant::now()));
        assert!(!paginator.navigate_at(NavIntent::Backward, Instant::now()));
        assert_eq!(paginator.offset(), 0);
        assert!(paginator.sync.store().saves.borrow().is_empty());
    }

    #[test]
    fn forward_steps_by_page_width_plus_gap() {
        let mut paginator = measured_paginator(5000);
        paginator.offset = -150;
        assert!(paginator.navigate_at(NavIntent::Forward, Instant::now()));
        assert_eq!(paginator.offset(), -670);
    }

    #[test]
    fn forward_is_rejected_at_the_scroll_width_bound() {
        // Next step would land at -670; content only scrolls to 600.
        let mut paginator = measured_paginator(600);
        paginator.offset = -150;
        assert!(!paginator.navigate_at(NavIntent::Forward, Instant::now()));
        assert_eq!(paginator.offset(), -150);
        assert!(paginator.sync.store().saves.borrow().is_empty());
    }

    #[test]
    fn backward_never_goes_positive() {
        let mut paginator = measured_paginator(5000);
        paginator.offset = -150;
        assert!(paginator.navigate_at(NavIntent::Backward, Instant::now()));
        assert_eq!(paginator.offset(), 0);
        // Already at the start: no-op.
        assert!(!paginator.navigate_at(NavIntent::Backward, Instant::now()));
        assert_eq!(paginator.offset(), 0);
    }

    #[test]
    fn restore_applies_saved_pixels_as_negative_offset() {
        let mut paginator = paginator(RecordingStore {
            saved_token: Some("240".to_string()),
            ..RecordingStore::default()
        });
        paginator.content_measured(500, 5000);
        paginator.restore();
        assert_eq!(paginator.offset(), -240);
    }

    #[test]
    fn restore_ignores_unparseable_token() {
        let mut paginator = paginator(RecordingStore {
            saved_token: Some("epubcfi(/6/2)".to_string()),
            ..RecordingStore::default()
        });
        paginator.content_measured(500, 5000);
        paginator.restore();
        assert_eq!(paginator.offset(), 0);
    }

    #[test]
    fn percent_reflects_offset_over_scroll_width() {
        let mut paginator = measured_paginator(1000);
        paginator.offset = -240;
        assert_eq!(paginator.percent(), 24);
        assert_eq!(paginator.progress_label(), "24%");
    }

    #[test]
    fn percent_is_zero_when_nothing_measured() {
        let paginator = paginator(RecordingStore::default());
        assert_eq!(paginator.percent(), 0);
    }

    #[test]
    fn navigation_saves_are_debounced_but_finish_is_not() {
        let mut paginator = measured_paginator(5000);
        let start = Instant::now();
        assert!(paginator.navigate_at(NavIntent::Forward, start));
        assert!(paginator.navigate_at(NavIntent::Forward, start + Duration::from_secs(5)));
        // Two moves, one request.
        assert_eq!(paginator.sync.store().saves.borrow().len(), 1);

        assert_eq!(
            paginator.finish_at(start + Duration::from_secs(6)),
            SaveOutcome::Saved
        );
        let saves = paginator.sync.store().saves.borrow();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[1].progress, "1040");
        assert_eq!(saves[1].progress_percent, 21);
    }
}
