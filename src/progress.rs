//! Percentage arithmetic and the debounced save path.
//!
//! Both controllers funnel persistence through [`ProgressSync`], which owns
//! the book identity, the store handle and the debounce gate. The gate
//! enforces a fixed floor between saves; the forced save on teardown bypasses
//! it. A failed save leaves the gate untouched so the next interaction can
//! retry immediately, and the session never stalls on a failure: it is logged
//! and reading continues.

use crate::config::BookFormat;
use crate::sync::{ProgressStore, ProgressUpdate};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Position within the document as a rounded percentage, clamped to 0-100.
/// An unmeasured document (`total == 0`) reads as 0%.
pub fn percent_complete(offset: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (offset as f64 / total as f64) * 100.0;
    percent.round().clamp(0.0, 100.0) as u8
}

/// Percentage from the rendering engine's 0.0-1.0 completion fraction.
pub fn percent_from_fraction(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Whether a save attempt may skip the debounce floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Debounced,
    /// Page-unload path; always goes through.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Suppressed by the debounce floor; no request was emitted.
    Debounced,
    /// The request was emitted and failed; logged, never surfaced.
    Failed,
}

/// Wall-clock floor between consecutive saves.
///
/// Lives on the controller instance rather than in process-wide state, and
/// resets only when a save actually succeeds.
#[derive(Debug, Clone)]
pub struct SaveGate {
    min_interval: Duration,
    last_saved: Option<Instant>,
}

impl SaveGate {
    pub fn new(min_interval: Duration) -> Self {
        SaveGate {
            min_interval,
            last_saved: None,
        }
    }

    pub fn permits(&self, mode: SaveMode, now: Instant) -> bool {
        match mode {
            SaveMode::Forced => true,
            SaveMode::Debounced => self
                .last_saved
                .is_none_or(|last| now.duration_since(last) >= self.min_interval),
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.last_saved = Some(now);
    }
}

/// Per-session persistence handle: one book, one format, one gate.
pub struct ProgressSync<S: ProgressStore> {
    store: S,
    book_id: u64,
    format: BookFormat,
    gate: SaveGate,
}

impl<S: ProgressStore> ProgressSync<S> {
    pub fn new(store: S, book_id: u64, format: BookFormat, min_interval: Duration) -> Self {
        ProgressSync {
            store,
            book_id,
            format,
            gate: SaveGate::new(min_interval),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saved position token, if the server has one. Failures are logged and
    /// read as "nothing saved" so the session still starts.
    pub fn restore(&self) -> Option<String> {
        match self.store.fetch_progress(self.book_id, self.format) {
            Ok(token) => token,
            Err(err) => {
                warn!(
                    book_id = self.book_id,
                    format = %self.format,
                    "Failed to fetch saved progress: {err:#}"
                );
                None
            }
        }
    }

    pub fn save(&mut self, token: &str, percent: u8, mode: SaveMode) -> SaveOutcome {
        self.save_at(token, percent, mode, Instant::now())
    }

    pub fn save_at(
        &mut self,
        token: &str,
        percent: u8,
        mode: SaveMode,
        now: Instant,
    ) -> SaveOutcome {
        if !self.gate.permits(mode, now) {
            debug!(book_id = self.book_id, "Save suppressed by debounce floor");
            return SaveOutcome::Debounced;
        }
        let update = ProgressUpdate {
            book_id: self.book_id,
            format: self.format,
            progress: token.to_string(),
            progress_percent: percent,
        };
        match self.store.save_progress(&update) {
            Ok(()) => {
                self.gate.record_success(now);
                debug!(book_id = self.book_id, percent, "Saved reading position");
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(book_id = self.book_id, "Failed to save progress: {err:#}");
                SaveOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingStore {
        saves: RefCell<Vec<ProgressUpdate>>,
        fail_saves: bool,
    }

    impl ProgressStore for RecordingStore {
        fn fetch_progress(
            &self,
            _book_id: u64,
            _format: BookFormat,
        ) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn save_progress(&self, update: &ProgressUpdate) -> anyhow::Result<()> {
            if self.fail_saves {
                return Err(anyhow!("server unavailable"));
            }
            self.saves.borrow_mut().push(update.clone());
            Ok(())
        }

        fn save_bookmark(&self, _location: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_sync(store: RecordingStore) -> ProgressSync<RecordingStore> {
        ProgressSync::new(store, 42, BookFormat::Txt, Duration::from_secs(30))
    }

    #[test]
    fn percent_is_rounded_and_bounded() {
        assert_eq!(percent_complete(0, 1000), 0);
        assert_eq!(percent_complete(240, 1000), 24);
        assert_eq!(percent_complete(995, 1000), 100);
        assert_eq!(percent_complete(1500, 1000), 100);
        assert_eq!(percent_complete(1, 3), 33);
    }

    #[test]
    fn zero_total_width_yields_zero_percent() {
        assert_eq!(percent_complete(0, 0), 0);
        assert_eq!(percent_complete(240, 0), 0);
    }

    #[test]
    fn fraction_percent_rounds_and_clamps() {
        assert_eq!(percent_from_fraction(0.42), 42);
        assert_eq!(percent_from_fraction(0.425), 43);
        assert_eq!(percent_from_fraction(-0.2), 0);
        assert_eq!(percent_from_fraction(1.7), 100);
    }

    #[test]
    fn second_save_within_floor_is_suppressed() {
        let mut sync = test_sync(RecordingStore::default());
        let start = Instant::now();
        assert_eq!(
            sync.save_at("100", 10, SaveMode::Debounced, start),
            SaveOutcome::Saved
        );
        let outcome = sync.save_at(
            "200",
            20,
            SaveMode::Debounced,
            start + Duration::from_secs(29),
        );
        assert_eq!(outcome, SaveOutcome::Debounced);
        assert_eq!(sync.store().saves.borrow().len(), 1);
    }

    #[test]
    fn save_passes_once_floor_has_elapsed() {
        let mut sync = test_sync(RecordingStore::default());
        let start = Instant::now();
        sync.save_at("100", 10, SaveMode::Debounced, start);
        let outcome = sync.save_at(
            "200",
            20,
            SaveMode::Debounced,
            start + Duration::from_secs(30),
        );
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(sync.store().saves.borrow().len(), 2);
    }

    #[test]
    fn forced_save_bypasses_floor() {
        let mut sync = test_sync(RecordingStore::default());
        let start = Instant::now();
        sync.save_at("100", 10, SaveMode::Debounced, start);
        let outcome = sync.save_at("200", 20, SaveMode::Forced, start + Duration::from_secs(1));
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(sync.store().saves.borrow().len(), 2);
    }

    #[test]
    fn failed_save_does_not_reset_gate() {
        let mut sync = test_sync(RecordingStore {
            fail_saves: true,
            ..RecordingStore::default()
        });
        let start = Instant::now();
        assert_eq!(
            sync.save_at("100", 10, SaveMode::Debounced, start),
            SaveOutcome::Failed
        );
        // Immediately retryable: the floor only counts from successes.
        sync.store.fail_saves = false;
        assert_eq!(
            sync.save_at("100", 10, SaveMode::Debounced, start + Duration::from_secs(1)),
            SaveOutcome::Saved
        );
    }

    #[test]
    fn save_body_carries_book_identity_and_stringified_token() {
        let mut sync = test_sync(RecordingStore::default());
        sync.save_at("670", 24, SaveMode::Debounced, Instant::now());
        let saves = sync.store().saves.borrow();
        assert_eq!(
            saves[0],
            ProgressUpdate {
                book_id: 42,
                format: BookFormat::Txt,
                progress: "670".to_string(),
                progress_percent: 24,
            }
        );
    }
}
