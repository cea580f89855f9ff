//! Layer ↔ table conversion.
//!
//! Forward conversions read a host [`FeatureSource`] into a [`GeoTable`] or a
//! vertex [`SampleTable`]; reverse conversions write a table into a sink the
//! host creates on request. All of them:
//!
//! - poll [`Feedback::is_canceled`] once per row and return the partial
//!   result with [`ConversionOutcome::cancelled`] set instead of failing
//! - skip records that cannot be converted, recording a [`RecordError`]
//!   instead of failing the whole conversion
//! - report progress in percent every `progress_interval` rows and 100 at
//!   the end
//!
//! [`FeatureSource`]: geobridge_core_common::FeatureSource
//! [`GeoTable`]: crate::table::GeoTable
//! [`SampleTable`]: crate::table::SampleTable

mod filters;
mod forward;
mod points;
mod reverse;

pub use filters::{filter_ignored_units, require_fields};
pub use forward::{layer_to_samples, layer_to_table};
pub use points::points_to_layer;
pub use reverse::table_to_layer;

use geobridge_core_common::{Feedback, GeometryType};
use geobridge_shared::RecordError;
use log::warn;

/// Result of a conversion that ran to completion or was cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutcome<T> {
    pub output: T,
    /// Per-record problems, in the order they were met
    pub diagnostics: Vec<RecordError>,
    /// True when the host cancelled; `output` then holds the rows done so far
    pub cancelled: bool,
}

impl<T> ConversionOutcome<T> {
    /// True when the conversion finished without skipping any record.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.diagnostics.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ConversionOutcome<U> {
        ConversionOutcome {
            output: f(self.output),
            diagnostics: self.diagnostics,
            cancelled: self.cancelled,
        }
    }
}

/// What a reverse conversion wrote into the host sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Destination geometry type, `None` for attribute-only output
    pub geometry_type: Option<GeometryType>,
    /// True when no geometry was usable and the default family was chosen
    pub defaulted_family: bool,
    pub written: usize,
    pub skipped: usize,
    /// Features whose geometry was sent as WKT because WKB encoding failed
    pub wkt_fallbacks: usize,
}

/// Per-conversion bookkeeping shared by the converters.
pub(crate) struct RowTracker<'a> {
    feedback: &'a dyn Feedback,
    total: Option<usize>,
    interval: usize,
    diagnostics: Vec<RecordError>,
    cancelled: bool,
}

impl<'a> RowTracker<'a> {
    pub(crate) fn new(feedback: &'a dyn Feedback, total: Option<usize>, interval: usize) -> Self {
        feedback.set_progress(0.0);
        Self {
            feedback,
            total,
            interval: interval.max(1),
            diagnostics: Vec::new(),
            cancelled: false,
        }
    }

    /// Poll for cancellation before processing a row.
    pub(crate) fn should_stop(&mut self) -> bool {
        if self.feedback.is_canceled() {
            warn!("conversion cancelled; returning partial result");
            self.cancelled = true;
        }
        self.cancelled
    }

    /// Record that `done` rows have been processed.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn row_done(&self, done: usize) {
        if done % self.interval != 0 {
            return;
        }
        if let Some(total) = self.total.filter(|&t| t > 0) {
            self.feedback
                .set_progress((done as f64 / total as f64 * 100.0).min(100.0));
        }
    }

    pub(crate) fn report(&mut self, error: RecordError) {
        warn!("{error}");
        self.feedback.report_error(&error.to_string());
        self.diagnostics.push(error);
    }

    pub(crate) fn finish<T>(self, output: T) -> ConversionOutcome<T> {
        if !self.cancelled {
            self.feedback.set_progress(100.0);
        }
        ConversionOutcome {
            output,
            diagnostics: self.diagnostics,
            cancelled: self.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geobridge_core_common::RecordingFeedback;
    use geobridge_shared::RecordPosition;

    #[test]
    fn progress_is_batched() {
        let feedback = RecordingFeedback::new();
        let tracker = RowTracker::new(&feedback, Some(10), 5);
        for done in 1..=10 {
            tracker.row_done(done);
        }
        let outcome = tracker.finish(());
        assert_eq!(*feedback.progress.borrow(), vec![0.0, 50.0, 100.0, 100.0]);
        assert!(outcome.is_clean());
    }

    #[test]
    fn cancellation_sticks() {
        let feedback = RecordingFeedback::new().cancel_after(1);
        let mut tracker = RowTracker::new(&feedback, None, 1);
        assert!(!tracker.should_stop());
        assert!(tracker.should_stop());
        let outcome = tracker.finish(3);
        assert!(outcome.cancelled);
        assert_eq!(outcome.output, 3);
        assert_eq!(feedback.last_progress(), Some(0.0));
    }

    #[test]
    fn skipped_records_reach_feedback() {
        let feedback = RecordingFeedback::new();
        let mut tracker = RowTracker::new(&feedback, None, 1);
        tracker.report(RecordError::geometry("bad ring", RecordPosition::row(2)));
        let outcome = tracker.finish(()).map(|()| "done");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(feedback.errors.borrow().len(), 1);
        assert_eq!(outcome.output, "done");
    }
}
