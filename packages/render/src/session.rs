//! Explicit per-process application state.
//!
//! A [`MapSession`] owns the shared dataset snapshot, the encoding
//! constants and the single marker layer every selection is rendered into.

use std::sync::Arc;

use bubble_map_loader::Dataset;

use crate::{Encoding, MarkerLayer, RawSelection, RenderOutcome, render};

/// Dataset snapshot plus the marker layer it is drawn on.
#[derive(Debug, Clone)]
pub struct MapSession {
    dataset: Arc<Dataset>,
    encoding: Encoding,
    layer: MarkerLayer,
    selection: RawSelection,
}

impl MapSession {
    /// A session with an empty marker layer.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, encoding: Encoding) -> Self {
        Self {
            dataset,
            encoding,
            layer: MarkerLayer::new(),
            selection: RawSelection::default(),
        }
    }

    /// The selection controls' default: first category, first year.
    #[must_use]
    pub fn default_selection(&self) -> RawSelection {
        RawSelection {
            category: self
                .dataset
                .categories()
                .first()
                .map(ToString::to_string),
            year: self.dataset.years().first().map(ToString::to_string),
        }
    }

    /// Renders the default selection, as the page does once its controls
    /// are populated.
    pub fn render_initial(&mut self) -> RenderOutcome {
        let selection = self.default_selection();
        self.select(selection)
    }

    /// Applies a selection change and re-renders.
    ///
    /// The selection is remembered even when the render is a no-op, so the
    /// controls keep showing what the user picked.
    pub fn select(&mut self, selection: RawSelection) -> RenderOutcome {
        let outcome = render(&self.dataset, &selection, &mut self.layer, &self.encoding);
        log::info!(
            "Selection {:?}/{:?}: {} ({} markers on the map)",
            selection.category,
            selection.year,
            outcome.kind(),
            self.layer.len()
        );
        self.selection = selection;
        outcome
    }

    /// The loaded snapshot.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Markers currently on the map.
    #[must_use]
    pub const fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    /// The most recent selection.
    #[must_use]
    pub const fn selection(&self) -> &RawSelection {
        &self.selection
    }
}
