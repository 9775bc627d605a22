//! Fan a batch of elements out over worker threads.
//!
//! Elements are classified fully independently and the classification tree is
//! read-only, so the workers share the [`Classifier`] without any locking.
//! Results are reassembled in input order before returning.

use std::num::NonZeroUsize;
use std::thread;

use crossbeam_channel::bounded;
use log::debug;

use crate::classificator::draw::DrawRules;
use crate::element::Element;
use crate::features::metadata::MetadataCollector;
use crate::features::params::FeatureParams;
use crate::features::Classifier;

/// How many elements may sit in each channel per worker.
///
/// - bigger consumes more memory
/// - lower produces more synchronization overhead
const BACKLOG: usize = 64;

/// Classify `elements` on `workers` threads, `0` meaning one per core.
pub fn classify_batch<D, M>(
    classifier: &Classifier<D>,
    meta: &M,
    elements: Vec<Element>,
    workers: usize,
) -> Vec<FeatureParams>
where
    D: DrawRules + Sync,
    M: MetadataCollector + Sync,
{
    let workers = match workers {
        0 => thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
        n => n,
    };

    if workers <= 1 || elements.len() <= 1 {
        let mut elements = elements;
        return elements
            .iter_mut()
            .map(|element| classifier.process(element, meta))
            .collect();
    }

    let mut results: Vec<Option<FeatureParams>> = Vec::new();
    results.resize_with(elements.len(), || None);

    thread::scope(|scope| {
        let (task_tx, task_rx) = bounded::<(usize, Element)>(workers * BACKLOG);
        let (result_tx, result_rx) = bounded::<(usize, FeatureParams)>(workers * BACKLOG);

        for worker in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, mut element) in task_rx {
                    let params = classifier.process(&mut element, meta);
                    if result_tx.send((index, params)).is_err() {
                        break;
                    }
                }
                debug!("Worker {worker} ran out of elements");
            });
        }
        // the workers hold their own clones
        drop(task_rx);
        drop(result_tx);

        scope.spawn(move || {
            for task in elements.into_iter().enumerate() {
                if task_tx.send(task).is_err() {
                    break;
                }
            }
        });

        for (index, params) in result_rx {
            results[index] = Some(params);
        }
    });

    results
        .into_iter()
        .map(|params| params.expect("every element is classified exactly once"))
        .collect()
}
