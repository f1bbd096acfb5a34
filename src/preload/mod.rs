//! Priority-based prefetching of deferred UI panels.
//!
//! Dashboard views defer most of their panels; this module loads them before
//! the user navigates, so the panel is warm on arrival. Two triggers exist:
//! an eager pass over the highest-priority panels right after mount, and a
//! debounced hover-intent signal for everything else.
//!
//! ```text
//! mount ──► preload_high_priority() ──► top-N panels by priority
//!
//! hover ──► preload_on_hover(id) ──► [debounce 200ms] ──► load panel
//!                     ▲                    │
//!            repeat hover resets     cancel_preload(id)
//!                  the timer          clears the timer
//! ```
//!
//! Loads here are whole UI modules rather than section data, but share the
//! same debounce-and-cancel discipline as the rest of the crate.

mod entry;
mod scheduler;

pub use entry::{PreloadEntry, PreloadRecord, PreloadState};
pub use scheduler::{PanelLoader, PreloadScheduler, PreloadStats, PreloadStatsSnapshot};
