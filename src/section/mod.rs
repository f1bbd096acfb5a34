//! Section registry and load coordination.
//!
//! A *section* is one independently loaded unit of dashboard data ("financial
//! metrics", "client list", "system health"). The [`LoadCoordinator`] owns
//! the registry of sections for one view, drives loads through the retry
//! executor, derives staleness, and aggregates per-section progress into an
//! overall completion percentage. A [`StalenessSweeper`] re-derives the
//! staleness flags on a fixed interval, and [`SectionHandle`] gives view
//! components a per-section facade.
//!
//! Previously loaded data survives both reloads and failures: a loading
//! section keeps showing its last good payload until a new load succeeds,
//! and a failed load overlays an error without discarding anything
//! (availability over freshness).

mod coordinator;
mod handle;
mod record;
mod state;
mod store;
mod sweep;

pub use coordinator::{
    BatchOutcome, CoordinatorStats, CoordinatorStatsSnapshot, LoadCoordinator, SectionLoader,
};
pub use handle::SectionHandle;
pub use record::{Section, SectionUpdate};
pub use state::SectionState;
pub use store::{RegistrySnapshot, SectionSnapshot, SectionStore};
pub use sweep::StalenessSweeper;
