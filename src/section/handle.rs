//! Per-section consumer facade.

use std::sync::Arc;
use std::time::Instant;

use crate::config::LoadOptions;
use super::coordinator::{LoadCoordinator, SectionLoader};
use super::record::{Section, SectionUpdate};
use super::state::SectionState;

/// Read/command facade over one named section.
///
/// Handles are cheap to clone and hand to descendant components; every
/// mutation goes through the owning coordinator, which keeps the registry's
/// single-writer discipline and publishes change notifications.
///
/// The manual lifecycle commands (`start_loading`, `set_progress`,
/// `complete_loading`, `set_error`) exist for loads the view drives itself,
/// outside the coordinator's loader path.
pub struct SectionHandle<T> {
    coordinator: Arc<LoadCoordinator<T>>,
    id: String,
}

impl<T: Clone + Send + Sync + 'static> SectionHandle<T> {
    pub(crate) fn new(coordinator: Arc<LoadCoordinator<T>>, id: &str) -> Self {
        Self {
            coordinator,
            id: id.to_string(),
        }
    }

    /// The section id this handle is bound to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a clone of the section record.
    pub fn section(&self) -> Option<Section<T>> {
        self.coordinator.section(&self.id)
    }

    /// True while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.coordinator.store().state(&self.id) == Some(SectionState::Loading)
    }

    /// The last error message, if the section is in the error state.
    pub fn error(&self) -> Option<String> {
        self.section().and_then(|s| s.error)
    }

    /// Timestamp of the last successful load.
    pub fn last_updated(&self) -> Option<Instant> {
        self.section().and_then(|s| s.last_updated)
    }

    /// Reported progress of an in-flight load.
    pub fn progress(&self) -> Option<u8> {
        self.section().and_then(|s| s.progress)
    }

    /// Transitions the section into `Loading` with zero progress.
    pub fn start_loading(&self) {
        self.coordinator.update_section(
            &self.id,
            SectionUpdate::new()
                .state(SectionState::Loading)
                .clear_error()
                .progress(0),
        );
    }

    /// Updates the progress of a manually driven load (clamped to 100).
    pub fn set_progress(&self, percent: u8) {
        self.coordinator
            .update_section(&self.id, SectionUpdate::new().progress(percent));
    }

    /// Completes a manually driven load with the given payload.
    pub fn complete_loading(&self, data: T) {
        self.coordinator.update_section(
            &self.id,
            SectionUpdate::new()
                .data(data)
                .state(SectionState::Loaded)
                .clear_error()
                .progress(100)
                .touch(),
        );
    }

    /// Fails a manually driven load. Previously loaded data is retained.
    pub fn set_error(&self, message: impl Into<String>) {
        self.coordinator.update_section(
            &self.id,
            SectionUpdate::new()
                .state(SectionState::Error)
                .error(message),
        );
    }

    /// Loads this section through the coordinator (see
    /// [`LoadCoordinator::load_section`]).
    pub async fn load_section(&self, loader: SectionLoader<T>, options: LoadOptions) -> Option<T> {
        let name = self
            .coordinator
            .store()
            .name(&self.id)
            .unwrap_or_else(|| self.id.clone());
        self.coordinator
            .load_section(&self.id, &name, loader, options)
            .await
    }

    /// Re-invokes the stored loader for this section.
    pub async fn retry(&self) -> Option<T> {
        self.coordinator.refresh_section(&self.id).await
    }
}

impl<T> Clone for SectionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            id: self.id.clone(),
        }
    }
}
