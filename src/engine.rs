//! Seam to the third-party EPUB rendering engine.
//!
//! The engine owns layout, structural locations and the location index; the
//! controller only drives it and listens to its relocation stream. Locations
//! are engine-defined CFI strings and stay opaque on this side.

use anyhow::Result;

/// Page progression direction from the book's package metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// One endpoint of the currently displayed range.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPoint {
    /// Engine-defined structural location.
    pub cfi: String,
    /// Completion fraction at this point, 0.0-1.0. Meaningless until the
    /// location index exists.
    pub percentage: f64,
}

/// Payload of the engine's relocation event.
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub start: LocationPoint,
    pub end: LocationPoint,
}

pub trait RenderEngine {
    /// Jump straight to a location, bypassing page-at-a-time navigation.
    fn display(&mut self, cfi: &str) -> Result<()>;

    fn next_page(&mut self) -> Result<()>;

    fn prev_page(&mut self) -> Result<()>;

    fn direction(&self) -> PageDirection;

    /// Build the location index used for percentage lookups. Expensive;
    /// callers cache the returned serialized form.
    fn generate_locations(&mut self) -> Result<String>;

    /// Restore a previously generated location index.
    fn load_locations(&mut self, index: &str) -> Result<()>;
}
