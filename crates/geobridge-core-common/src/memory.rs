//! In-memory implementations of the host traits.
//!
//! Hosts without a native layer model (batch jobs, tests) can use these
//! directly: a [`MemoryLayer`] is both a feature source and, through
//! [`MemorySinkProvider`], a destination.

use std::cell::{Cell, RefCell};

use anyhow::{Result, bail};

use crate::crs::Crs;
use crate::geometry::GeometryType;
use crate::io::{Feature, FeatureSink, FeatureSinkProvider, FeatureSource, Feedback};
use crate::value::FieldSchema;

/// A feature layer held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryLayer {
    pub fields: Vec<String>,
    /// Typed schema, known when the layer was created by a sink provider
    pub schema: Option<FieldSchema>,
    pub geometry_type: Option<GeometryType>,
    pub crs: Option<Crs>,
    pub features: Vec<Feature>,
}

impl MemoryLayer {
    #[must_use]
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>, crs: Option<Crs>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            crs,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureSource for MemoryLayer {
    fn field_names(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn crs(&self) -> Option<Crs> {
        self.crs.clone()
    }

    fn features(&self) -> Box<dyn Iterator<Item = Feature> + '_> {
        Box::new(self.features.iter().cloned())
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.features.len())
    }
}

/// Sink appending to a borrowed [`MemoryLayer`].
#[derive(Debug)]
pub struct MemoryLayerSink<'a> {
    layer: &'a mut MemoryLayer,
}

impl FeatureSink for MemoryLayerSink<'_> {
    fn add_feature(&mut self, feature: Feature) -> Result<()> {
        self.layer.push(feature);
        Ok(())
    }
}

/// Sink provider collecting every created layer.
#[derive(Debug, Default)]
pub struct MemorySinkProvider {
    pub layers: Vec<MemoryLayer>,
    failure: Option<String>,
}

impl MemorySinkProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose sink creation always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            layers: Vec::new(),
            failure: Some(message.into()),
        }
    }

    /// The most recently created layer.
    #[must_use]
    pub fn last_layer(&self) -> Option<&MemoryLayer> {
        self.layers.last()
    }
}

impl FeatureSinkProvider for MemorySinkProvider {
    fn create_sink(
        &mut self,
        schema: &FieldSchema,
        geometry_type: Option<GeometryType>,
        crs: Option<&Crs>,
    ) -> Result<Box<dyn FeatureSink + '_>> {
        if let Some(message) = &self.failure {
            bail!("{message}");
        }

        self.layers.push(MemoryLayer {
            fields: schema.names().into_iter().map(str::to_owned).collect(),
            schema: Some(schema.clone()),
            geometry_type,
            crs: crs.cloned(),
            features: Vec::new(),
        });
        let index = self.layers.len() - 1;
        Ok(Box::new(MemoryLayerSink {
            layer: &mut self.layers[index],
        }))
    }
}

/// Feedback that records everything it is told.
///
/// Optionally requests cancellation once `is_canceled` has been polled a
/// given number of times.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub infos: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
    pub progress: RefCell<Vec<f64>>,
    cancel_after: Option<usize>,
    polls: Cell<usize>,
}

impl RecordingFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel once `polls` cancellation checks have returned false.
    #[must_use]
    pub fn cancel_after(mut self, polls: usize) -> Self {
        self.cancel_after = Some(polls);
        self
    }

    #[must_use]
    pub fn last_progress(&self) -> Option<f64> {
        self.progress.borrow().last().copied()
    }
}

impl Feedback for RecordingFeedback {
    fn push_info(&self, message: &str) {
        self.infos.borrow_mut().push(message.to_string());
    }

    fn report_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn set_progress(&self, percent: f64) {
        self.progress.borrow_mut().push(percent);
    }

    fn is_canceled(&self) -> bool {
        let Some(limit) = self.cancel_after else {
            return false;
        };
        let polls = self.polls.get();
        self.polls.set(polls + 1);
        polls >= limit
    }
}
