use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use synthscope_core::{Dataset, Error as CoreError, Schema, profile};

use crate::aggregate::Aggregator;
use crate::descriptor::MetricDescriptor;
use crate::errors::{EvalError, MetricError};
use crate::metric::{Metric, MetricInput, MetricOutput, MetricParams};
use crate::metrics::{REPORT_VERSION, Report, ReportMeta};
use crate::model::{EvaluateOptions, MetricResult, MetricStatus};
use crate::registry::MetricRegistry;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initialized,
    SchemaValidated,
    Running,
    Completed,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Initialized => "initialized",
            PipelineState::SchemaValidated => "schema_validated",
            PipelineState::Running => "running",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Initialized, SchemaValidated)
                | (SchemaValidated, Running)
                | (Running, Completed)
                | (Initialized | SchemaValidated | Running, Failed)
        )
    }
}

/// Runs registered metrics over a real/synthetic dataset pair and
/// aggregates the outcome into a [`Report`].
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    registry: MetricRegistry,
    options: EvaluateOptions,
}

impl EvaluationEngine {
    pub fn new(registry: MetricRegistry, options: EvaluateOptions) -> Self {
        Self { registry, options }
    }

    /// Engine backed by the built-in metric set.
    pub fn with_builtins(options: EvaluateOptions) -> Self {
        Self::new(MetricRegistry::with_builtins(), options)
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Mutable access for registering metrics between runs.
    pub fn registry_mut(&mut self) -> &mut MetricRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &EvaluateOptions {
        &self.options
    }

    /// Evaluate `synthetic` against `real` with the selected metrics (ids or
    /// category names, empty for all). Metric-level faults are recorded in
    /// the report; only pipeline-level problems return an error.
    pub fn run<S: AsRef<str>>(
        &self,
        real: impl Into<Arc<Dataset>>,
        synthetic: impl Into<Arc<Dataset>>,
        selection: &[S],
    ) -> Result<Report, EvalError> {
        let started = Instant::now();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let run_id = Uuid::new_v4().to_string();
        let real = real.into();
        let synthetic = synthetic.into();

        let mut state = PipelineState::Initialized;
        info!(
            run_id = %run_id,
            real_rows = real.n_rows(),
            synthetic_rows = synthetic.n_rows(),
            columns = real.n_columns(),
            seed = self.options.seed,
            distance = self.options.distance.as_str(),
            "evaluation started"
        );

        let prepared = self.validate(&real, &synthetic).and_then(|schema| {
            transition(&run_id, &mut state, PipelineState::SchemaValidated);
            let selected = self.registry.resolve(selection)?;
            self.check_weights()?;
            Ok((schema, selected))
        });
        let (schema, selected) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                transition(&run_id, &mut state, PipelineState::Failed);
                warn!(run_id = %run_id, error = %err, "evaluation failed");
                return Err(err);
            }
        };

        transition(&run_id, &mut state, PipelineState::Running);
        let schema = Arc::new(schema);
        let columns: Option<Arc<[String]>> = self.options.columns.as_deref().map(Arc::from);
        let invocations = selected
            .iter()
            .map(|entry| Invocation {
                descriptor: Arc::clone(&entry.descriptor),
                metric: Arc::clone(&entry.metric),
                real: Arc::clone(&real),
                synthetic: Arc::clone(&synthetic),
                schema: Arc::clone(&schema),
                columns: columns.clone(),
                params: self.params_for(&entry.descriptor.id),
                timeout: self.options.timeout_for(&entry.descriptor.id),
            })
            .collect::<Vec<_>>();

        let results = match self.dispatch(invocations) {
            Ok(results) => results,
            Err(err) => {
                transition(&run_id, &mut state, PipelineState::Failed);
                warn!(run_id = %run_id, error = %err, "evaluation failed");
                return Err(err);
            }
        };

        let descriptors = selected
            .iter()
            .map(|entry| entry.descriptor.as_ref().clone())
            .collect::<Vec<_>>();
        let meta = ReportMeta {
            report_version: REPORT_VERSION.to_string(),
            run_id: run_id.clone(),
            timestamp,
            n_real_rows: real.n_rows() as u64,
            n_synthetic_rows: synthetic.n_rows() as u64,
            n_columns: real.n_columns() as u64,
            seed: self.options.seed,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let report = Aggregator::from_options(&self.options).aggregate(
            &results,
            &descriptors,
            meta,
            schema.as_ref().clone(),
        );
        transition(&run_id, &mut state, PipelineState::Completed);

        info!(
            run_id = %run_id,
            metrics = report.metrics.len(),
            ok = report.count_status(MetricStatus::Ok),
            skipped = report.count_status(MetricStatus::Skipped),
            failed = report.count_status(MetricStatus::Failed),
            overall = ?report.overall,
            duration_ms = report.meta.duration_ms,
            "evaluation completed"
        );
        Ok(report)
    }

    /// Structural checks on the pair, then profiling of the real dataset.
    fn validate(&self, real: &Dataset, synthetic: &Dataset) -> Result<Schema, EvalError> {
        self.options.validate()?;

        let real_names = real.column_names().into_iter().collect::<BTreeSet<_>>();
        let synthetic_names = synthetic.column_names().into_iter().collect::<BTreeSet<_>>();
        if real_names != synthetic_names {
            return Err(CoreError::SchemaMismatch {
                missing: real_names
                    .difference(&synthetic_names)
                    .map(|name| name.to_string())
                    .collect(),
                extra: synthetic_names
                    .difference(&real_names)
                    .map(|name| name.to_string())
                    .collect(),
            }
            .into());
        }
        if synthetic.is_empty() {
            return Err(CoreError::EmptyDataset("synthetic dataset has no rows".to_string()).into());
        }

        if let Some(columns) = &self.options.columns {
            let unknown = columns
                .iter()
                .filter(|name| !real_names.contains(name.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                return Err(EvalError::InvalidConfig(format!(
                    "unknown columns in restriction: {}",
                    unknown.join(", ")
                )));
            }
        }

        Ok(profile(real, &self.options.profile)?)
    }

    fn check_weights(&self) -> Result<(), EvalError> {
        match self.options.weights.keys().find(|id| !self.registry.contains(id)) {
            Some(id) => Err(EvalError::InvalidConfig(format!(
                "weight given for unknown metric: {id}"
            ))),
            None => Ok(()),
        }
    }

    fn params_for(&self, metric_id: &str) -> MetricParams {
        MetricParams {
            seed: hash_seed(self.options.seed, metric_id),
            target_column: self.options.target_column.clone(),
            holdout_fraction: self.options.holdout_fraction,
            neighbours: self.options.neighbours,
            distance: self.options.distance,
            corr_numeric_only: self.options.corr_numeric_only,
        }
    }

    /// Run every invocation on a bounded pool. Output order follows input
    /// order.
    fn dispatch(&self, invocations: Vec<Invocation>) -> Result<Vec<MetricResult>, EvalError> {
        let workers = self
            .options
            .workers
            .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
            .unwrap_or(1)
            .min(invocations.len().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("synthscope-metric-{idx}"))
            .build()
            .map_err(|err| EvalError::WorkerPool(err.to_string()))?;

        debug!(workers, metrics = invocations.len(), "dispatching metrics");
        Ok(pool.install(|| {
            invocations
                .into_par_iter()
                .map(|invocation| invocation.execute())
                .collect()
        }))
    }
}

/// Everything one metric needs, owned so it can outlive the caller when a
/// timeout abandons it.
#[derive(Clone)]
struct Invocation {
    descriptor: Arc<MetricDescriptor>,
    metric: Arc<dyn Metric>,
    real: Arc<Dataset>,
    synthetic: Arc<Dataset>,
    schema: Arc<Schema>,
    columns: Option<Arc<[String]>>,
    params: MetricParams,
    timeout: Option<Duration>,
}

impl Invocation {
    fn execute(self) -> MetricResult {
        let started = Instant::now();
        let outcome = match self.timeout {
            Some(timeout) => self.invoke_with_timeout(timeout),
            None => self.invoke_guarded(),
        }
        .and_then(|output| {
            if output.score.is_finite() {
                Ok(output)
            } else {
                Err(MetricError::Computation(format!(
                    "non-finite score {}",
                    output.score
                )))
            }
        });
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                debug!(
                    metric = %self.descriptor.id,
                    status = MetricStatus::Ok.as_str(),
                    score = output.score,
                    duration_ms,
                    "metric completed"
                );
                MetricResult::ok(&self.descriptor, output)
            }
            Err(err) => {
                let status = err.status();
                if status == MetricStatus::Skipped {
                    debug!(
                        metric = %self.descriptor.id,
                        status = status.as_str(),
                        reason = %err,
                        duration_ms,
                        "metric skipped"
                    );
                } else {
                    warn!(
                        metric = %self.descriptor.id,
                        status = status.as_str(),
                        error = %err,
                        duration_ms,
                        "metric failed"
                    );
                }
                MetricResult::from_error(&self.descriptor, &err)
            }
        }
    }

    /// Call the metric, turning a panic into a failure.
    fn invoke_guarded(&self) -> Result<MetricOutput, MetricError> {
        let input = MetricInput {
            metric_id: &self.descriptor.id,
            real: &self.real,
            synthetic: &self.synthetic,
            schema: &self.schema,
            columns: self.columns.as_deref(),
            params: &self.params,
        };
        catch_unwind(AssertUnwindSafe(|| self.metric.compute(&input)))
            .unwrap_or_else(|panic| Err(MetricError::Panicked(panic_message(panic))))
    }

    /// Run on a dedicated thread and stop waiting after `timeout`. An
    /// abandoned metric keeps running detached until it returns.
    fn invoke_with_timeout(&self, timeout: Duration) -> Result<MetricOutput, MetricError> {
        let (sender, receiver) = mpsc::channel();
        let invocation = self.clone();
        std::thread::Builder::new()
            .name(format!("synthscope-{}", self.descriptor.id))
            .spawn(move || {
                let _ = sender.send(invocation.invoke_guarded());
            })
            .map_err(|err| MetricError::Computation(format!("failed to spawn metric thread: {err}")))?;

        match receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(MetricError::Timeout(timeout.as_millis() as u64))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(MetricError::Panicked(
                "metric thread exited without a result".to_string(),
            )),
        }
    }
}

fn transition(run_id: &str, state: &mut PipelineState, next: PipelineState) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    debug!(
        run_id = %run_id,
        from = state.as_str(),
        to = next.as_str(),
        "pipeline state"
    );
    *state = next;
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during metric computation".to_string()
    }
}

/// FNV-1a mix of the run seed and a metric identifier.
fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_states_advance_in_order() {
        use PipelineState::*;
        assert!(Initialized.can_transition_to(SchemaValidated));
        assert!(SchemaValidated.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(!Initialized.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Running));
        assert!(Completed.is_terminal() && Failed.is_terminal());
        assert!(!Running.is_terminal());
    }

    #[test]
    fn metric_seeds_differ_per_metric_and_are_stable() {
        let a = hash_seed(42, "fidelity.ks_distance");
        let b = hash_seed(42, "privacy.dcr");
        assert_ne!(a, b);
        assert_eq!(a, hash_seed(42, "fidelity.ks_distance"));
        assert_ne!(a, hash_seed(43, "fidelity.ks_distance"));
    }

    fn formatted_panic() -> u32 {
        panic!("boom {}", 1)
    }

    fn opaque_panic() -> u32 {
        std::panic::panic_any(7_u8)
    }

    #[test]
    fn panic_payloads_are_readable() {
        let message = catch_unwind(formatted_panic).expect_err("panics");
        assert_eq!(panic_message(message), "boom 1");
        let message = catch_unwind(opaque_panic).expect_err("panics");
        assert_eq!(panic_message(message), "panic during metric computation");
    }
}
