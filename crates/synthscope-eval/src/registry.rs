use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::builtin;
use crate::descriptor::{MetricCategory, MetricDescriptor};
use crate::errors::EvalError;
use crate::metric::Metric;

/// A descriptor paired with its implementation.
#[derive(Clone)]
pub struct RegisteredMetric {
    pub descriptor: Arc<MetricDescriptor>,
    pub metric: Arc<dyn Metric>,
}

impl std::fmt::Debug for RegisteredMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredMetric")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Catalog of metrics available to an engine.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, RegisteredMetric>,
}

impl MetricRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in metric set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (descriptor, metric) in builtin::builtins() {
            registry.metrics.insert(
                descriptor.id.clone(),
                RegisteredMetric {
                    descriptor: Arc::new(descriptor),
                    metric,
                },
            );
        }
        registry
    }

    pub fn register(
        &mut self,
        descriptor: MetricDescriptor,
        metric: Arc<dyn Metric>,
    ) -> Result<(), EvalError> {
        if self.metrics.contains_key(&descriptor.id) {
            return Err(EvalError::DuplicateMetric(descriptor.id));
        }
        descriptor
            .validate()
            .map_err(|message| EvalError::InvalidDescriptor {
                id: descriptor.id.clone(),
                message,
            })?;
        self.metrics.insert(
            descriptor.id.clone(),
            RegisteredMetric {
                descriptor: Arc::new(descriptor),
                metric,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredMetric> {
        self.metrics.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.metrics.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Descriptors ordered by category, then identifier.
    pub fn descriptors(&self) -> Vec<&MetricDescriptor> {
        let mut descriptors = self
            .metrics
            .values()
            .map(|entry| entry.descriptor.as_ref())
            .collect::<Vec<_>>();
        descriptors.sort_by(|a, b| (a.category, &a.id).cmp(&(b.category, &b.id)));
        descriptors
    }

    /// Resolve metric identifiers and category names into an ordered,
    /// de-duplicated list. An empty selection means every registered metric.
    pub fn resolve<S: AsRef<str>>(&self, selection: &[S]) -> Result<Vec<RegisteredMetric>, EvalError> {
        let mut ids = BTreeSet::new();

        if selection.is_empty() {
            ids.extend(self.metrics.keys().cloned());
        }

        for selector in selection {
            let selector = selector.as_ref().trim();
            if self.metrics.contains_key(selector) {
                ids.insert(selector.to_string());
                continue;
            }
            match MetricCategory::parse(selector) {
                Some(category) => ids.extend(
                    self.metrics
                        .values()
                        .filter(|entry| entry.descriptor.category == category)
                        .map(|entry| entry.descriptor.id.clone()),
                ),
                None => return Err(EvalError::UnknownMetric(selector.to_string())),
            }
        }

        let mut resolved = ids
            .iter()
            .filter_map(|id| self.metrics.get(id).cloned())
            .collect::<Vec<_>>();
        resolved.sort_by(|a, b| {
            (a.descriptor.category, &a.descriptor.id).cmp(&(b.descriptor.category, &b.descriptor.id))
        });
        Ok(resolved)
    }
}
