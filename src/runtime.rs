//! Data-parallel batch resolution.
//!
//! Each query resolves independently against the frozen index, so a batch
//! can be sharded across a small pool of threads. Workers pull tagged jobs
//! from a bounded channel, resolve them with a cache of their own, and send
//! back `(position, outcome)` pairs; results are reassembled by position so
//! the output order always equals the input order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::audit::{AuditLog, QueryRow};
use crate::cache::ResolutionCache;
use crate::config::{BatchConfig, ResolverConfig};
use crate::error::{ExecutionError, LinkError, LinkResult};
use crate::index::NameIndex;
use crate::outcome::MatchOutcome;
use crate::resolver::resolve;

struct Job {
    position: usize,
    query: String,
}

struct Resolved {
    position: usize,
    outcome: MatchOutcome,
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn start<I: NameIndex + 'static>(
        index: &Arc<I>,
        config: ResolverConfig,
        batch: BatchConfig,
        results: &Sender<Resolved>,
    ) -> LinkResult<Self> {
        let (tx, rx) = bounded::<Job>(batch.queue_capacity.max(1));

        let mut handles = Vec::with_capacity(batch.workers);
        for idx in 0..batch.workers.max(1) {
            let rx: Receiver<Job> = rx.clone();
            let results = results.clone();
            let index = Arc::clone(index);
            let name = format!("namelink-resolve-{idx}");
            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                let mut cache = ResolutionCache::new();
                let mut resolved = 0usize;
                while let Ok(Job { position, query }) = rx.recv() {
                    let outcome = resolve(&query, index.as_ref(), &mut cache, &config);
                    if results.send(Resolved { position, outcome }).is_err() {
                        break;
                    }
                    resolved += 1;
                }
                tracing::debug!(
                    worker = idx,
                    resolved,
                    cache_hits = cache.hits(),
                    cache_entries = cache.len(),
                    "resolver worker finished"
                );
            });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    // Stop the workers already running before reporting.
                    Self { tx, workers: handles }.shutdown();
                    return Err(ExecutionError::WorkerSpawn {
                        name,
                        message: err.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(Self { tx, workers: handles })
    }

    /// Close the job channel and wait for every worker. Returns the number
    /// of workers that panicked.
    fn shutdown(self) -> usize {
        drop(self.tx);
        self.workers.into_iter().map(JoinHandle::join).filter(Result::is_err).count()
    }
}

/// Resolves batches of queries on a pool of worker threads.
///
/// The index is shared read-only; every batch starts workers with empty
/// caches, so one batch is one resolution pass.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use namelink::{BatchConfig, BatchResolver, Entity, ReferenceIndex, ResolverConfig};
///
/// let index = Arc::new(ReferenceIndex::build([Entity::new("1", "John Smith")]));
/// let batch = BatchConfig::default().with_workers(2);
/// let batch = BatchResolver::new(index, ResolverConfig::default(), batch)?;
/// let outcomes = batch.resolve_batch(&["john smith", "nobody"])?;
/// assert!(outcomes[0].is_matched());
/// assert!(!outcomes[1].is_matched());
/// # Ok::<(), namelink::LinkError>(())
/// ```
pub struct BatchResolver<I: NameIndex + 'static> {
    index: Arc<I>,
    config: ResolverConfig,
    batch: BatchConfig,
}

impl<I: NameIndex + 'static> BatchResolver<I> {
    /// Create a batch resolver after validating both configurations.
    pub fn new(index: Arc<I>, config: ResolverConfig, batch: BatchConfig) -> LinkResult<Self> {
        config.validate()?;
        batch.validate()?;
        Ok(Self { index, config, batch })
    }

    /// Resolve `queries`, returning outcomes in input order.
    pub fn resolve_batch<S: AsRef<str>>(&self, queries: &[S]) -> LinkResult<Vec<MatchOutcome>> {
        let expected = queries.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let (results_tx, results_rx) = unbounded::<Resolved>();
        let pool = WorkerPool::start(&self.index, self.config, self.batch, &results_tx)?;
        drop(results_tx);

        let mut submitted = 0usize;
        for (position, query) in queries.iter().enumerate() {
            let job = Job {
                position,
                query: query.as_ref().to_string(),
            };
            if pool.tx.send(job).is_err() {
                break;
            }
            submitted += 1;
        }
        let panicked = pool.shutdown();

        let mut slots: Vec<Option<MatchOutcome>> = vec![None; expected];
        let mut completed = 0usize;
        for Resolved { position, outcome } in results_rx.try_iter() {
            if let Some(slot) = slots.get_mut(position) {
                *slot = Some(outcome);
                completed += 1;
            }
        }

        if panicked > 0 || submitted < expected || completed < expected {
            return Err(ExecutionError::WorkerDisconnected { completed, expected }.into());
        }

        tracing::info!(
            queries = expected,
            workers = self.batch.workers,
            "batch resolution complete"
        );

        slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or_else(|| LinkError::from(ExecutionError::MissingResult { position }))
            })
            .collect()
    }

    /// Resolve query rows into an audit log tagged with `fingerprint`.
    pub fn audit_batch<R: Into<QueryRow>>(
        &self,
        rows: impl IntoIterator<Item = R>,
        fingerprint: Option<String>,
    ) -> LinkResult<AuditLog> {
        let rows: Vec<QueryRow> = rows.into_iter().map(Into::into).collect();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        let outcomes = self.resolve_batch(&names)?;

        let mut audit = AuditLog::new();
        if let Some(fp) = fingerprint {
            audit = audit.with_fingerprint(fp);
        }
        for (row, outcome) in rows.into_iter().zip(outcomes) {
            audit.record(row.name, row.original_id, &outcome);
        }
        Ok(audit)
    }

    /// The shared index.
    #[must_use]
    pub fn index(&self) -> &I {
        &self.index
    }

    /// The batch configuration.
    #[must_use]
    pub const fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::entity::Entity;
    use crate::index::ReferenceIndex;
    use crate::outcome::MatchStatus;
    use crate::resolver::Resolver;

    fn batch(workers: usize) -> BatchResolver<ReferenceIndex> {
        let config = BatchConfig::default().with_workers(workers);
        BatchResolver::new(index(), ResolverConfig::default(), config).unwrap()
    }

    fn index() -> Arc<ReferenceIndex> {
        Arc::new(ReferenceIndex::build([
            Entity::new("1", "John Smith"),
            Entity::new("2", "Anne Lee"),
            Entity::new("3", "Lee Anne"),
            Entity::new("4", "Smith, Jane"),
        ]))
    }

    #[test]
    fn output_order_matches_input_order() {
        let batch = batch(4);
        let queries: Vec<String> = (0..200)
            .map(|i| match i % 4 {
                0 => "John Smith".to_string(),
                1 => "lee anne lee".to_string(),
                2 => format!("nobody {i}"),
                _ => "Jane Smith".to_string(),
            })
            .collect();
        let outcomes = batch.resolve_batch(&queries).unwrap();
        assert_eq!(outcomes.len(), queries.len());
        for (i, outcome) in outcomes.iter().enumerate() {
            let expected = match i % 4 {
                0 | 3 => MatchStatus::Matched,
                1 => MatchStatus::Ambiguous,
                _ => MatchStatus::Unmatched,
            };
            assert_eq!(outcome.status(), expected, "query #{i}");
        }
    }

    #[test]
    fn batch_agrees_with_sequential() {
        let index = index();
        let queries = ["John Smith", "Jane Smith", "anne lee", "Lee Anne Lee", "x", ""];
        let mut sequential = Resolver::with_defaults(Arc::clone(&index));
        let expected = sequential.resolve_all(queries);

        let config = BatchConfig::default().with_workers(3);
        let batch = BatchResolver::new(index, ResolverConfig::default(), config).unwrap();
        assert_eq!(batch.resolve_batch(&queries).unwrap(), expected);
    }

    #[test]
    fn empty_batch() {
        let batch = batch(1);
        let none: [&str; 0] = [];
        assert!(batch.resolve_batch(&none).unwrap().is_empty());
    }

    #[test]
    fn small_queue_applies_backpressure_without_deadlock() {
        let config = BatchConfig {
            workers: 1,
            queue_capacity: 1,
        };
        let batch = BatchResolver::new(index(), ResolverConfig::default(), config).unwrap();
        let queries = vec!["John Smith"; 64];
        let outcomes = batch.resolve_batch(&queries).unwrap();
        assert!(outcomes.iter().all(MatchOutcome::is_matched));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = BatchConfig::default().with_workers(0);
        let err = BatchResolver::new(index(), ResolverConfig::default(), config)
            .err()
            .unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn audit_batch_keeps_original_ids() {
        let batch = batch(2);
        let audit = batch
            .audit_batch(
                [("John Smith", "1"), ("Jane Smith", "77"), ("nobody", "")],
                Some("fp".to_string()),
            )
            .unwrap();
        assert_eq!(audit.len(), 3);
        assert_eq!(audit.records()[1].corrected_id(), "4");
        assert!(audit.records()[1].id_changed());
        assert_eq!(audit.summary().corrected, 1);
        assert_eq!(audit.fingerprint(), Some("fp"));
    }
}
