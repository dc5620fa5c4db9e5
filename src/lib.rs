//! Client-side reading-progress synchronization for a library server.
//!
//! Two controllers mirror the server's two in-browser viewers: a horizontal
//! paginator for plain-text documents and a thin wrapper over an external
//! EPUB rendering engine. Both restore the saved position on load, persist
//! it behind a debounce floor while the user reads, and force one final save
//! on teardown. The DOM, the rendering engine, and the server stay external:
//! measurements and touch coordinates arrive as plain values, the engine is
//! a trait the host implements, and the server is reached through
//! [`sync::ProgressStore`].

pub mod cache;
pub mod config;
pub mod engine;
pub mod epub;
pub mod paginator;
pub mod progress;
pub mod sync;
pub mod theme;
