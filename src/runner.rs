//! Fan-out/fan-in execution of one pipeline stage.
//!
//! A stage's input is split into contiguous partitions, one per worker. Each worker runs on
//! its own thread and takes its partition *by value*: there is no shared mutable state, and
//! the only thing workers share is the immutable worker function. The caller blocks until
//! every worker has been joined, then results are concatenated in partition order.
//!
//! The worker index is handed to the worker function so accelerator-bound stages can bind
//! worker `i` to device `i` for the lifetime of the stage. Nothing outlives the call: models
//! loaded inside a worker are dropped when its thread exits.

use std::thread;

use tracing::debug;

use crate::{Error, Result};

/// Split `items` into `parts` contiguous, order-preserving partitions.
///
/// Sizes differ by at most one; the first `len % parts` partitions get the extra item.
/// `parts` must be non-zero.
pub fn partition<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    debug_assert!(parts > 0, "partition count must be non-zero");

    let base = items.len() / parts;
    let extra = items.len() % parts;
    let mut iter = items.into_iter();

    (0..parts)
        .map(|i| {
            let n = base + usize::from(i < extra);
            iter.by_ref().take(n).collect()
        })
        .collect()
}

/// Run `work` over `workers` partitions of `items` and flatten the results.
///
/// Semantics:
/// - `work(index, partition)` is called once per non-empty partition, each on its own thread.
/// - The output preserves partition order: partition 0's results come first.
/// - Every worker is joined before anything is returned. If any worker fails (returns an
///   error or panics), the stage fails with the first failure in partition order and no
///   partial results are returned.
pub fn run_partitioned<T, U, F>(stage: &str, items: Vec<T>, workers: usize, work: F) -> Result<Vec<U>>
where
    T: Send,
    U: Send,
    F: Fn(usize, Vec<T>) -> Result<Vec<U>> + Sync,
{
    if workers == 0 {
        return Err(Error::Config(format!(
            "stage '{stage}' needs at least one worker"
        )));
    }

    let partitions = partition(items, workers);

    let (spawn_err, joined) = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(partitions.len());
        let mut spawn_err = None;

        for (index, part) in partitions.into_iter().enumerate() {
            // No point binding a device (and loading a model) for nothing.
            if part.is_empty() {
                continue;
            }

            debug!(stage, worker = index, items = part.len(), "starting worker");
            let work = &work;
            let spawned = thread::Builder::new()
                .name(format!("{stage}-{index}"))
                .spawn_scoped(scope, move || work(index, part));

            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(err) => {
                    spawn_err = Some(Error::Worker {
                        index,
                        source: Box::new(err.into()),
                    });
                    break;
                }
            }
        }

        // Join everything we started, even after a spawn failure, so no worker outlives the
        // stage and panics are observed here rather than by the scope.
        let joined: Vec<_> = handles
            .into_iter()
            .map(|(index, handle)| (index, handle.join()))
            .collect();

        (spawn_err, joined)
    });

    if let Some(err) = spawn_err {
        return Err(err);
    }

    let mut out = Vec::new();
    for (index, outcome) in joined {
        match outcome {
            Ok(Ok(results)) => out.extend(results),
            Ok(Err(err)) => {
                return Err(Error::Worker {
                    index,
                    source: Box::new(err),
                });
            }
            Err(_) => return Err(Error::WorkerPanicked(index)),
        }
    }

    Ok(out)
}
