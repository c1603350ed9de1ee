// Copyright 2026 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded concurrent fan-out over a set of work items.
//!
//! [`fan_out`] starts one task per item, at most `max_concurrent` at a time, waits for all of
//! them and folds their results into a summary. Cancelling the token stops new work from being
//! started and aborts the work that is running.

use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of a [`fan_out`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutSummary<T> {
    /// The folded results of all completed tasks
    pub value: T,
    /// Number of tasks that ran to completion
    pub completed: usize,
    /// Number of items that were not started or were aborted because of cancellation
    pub cancelled: usize,
    /// Number of tasks that panicked
    pub panicked: usize,
}

/// Runs `work` for every item on the tokio runtime and folds the results.
///
/// Results are folded in completion order. Panicking tasks are logged and counted, their result
/// is skipped. Tasks inherit the current tracing span.
pub async fn fan_out<I, W, Fut, R, T, F>(
    items: I,
    max_concurrent: usize,
    cancel: &CancellationToken,
    work: W,
    init: T,
    mut fold: F,
) -> FanOutSummary<T>
where
    I: IntoIterator,
    W: Fn(I::Item) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
    F: FnMut(T, R) -> T,
{
    let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();
    let mut cancelled = 0;

    for item in items {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = permits.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            cancelled += 1;
            continue;
        };

        let fut = work(item);
        let token = cancel.clone();
        tasks.spawn(
            async move {
                let _permit = permit;
                tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    res = fut => Some(res),
                }
            }
            .in_current_span(),
        );
    }

    let mut summary = FanOutSummary {
        value: init,
        completed: 0,
        cancelled,
        panicked: 0,
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(res)) => {
                summary.value = fold(summary.value, res);
                summary.completed += 1;
            }
            Ok(None) => summary.cancelled += 1,
            Err(err) if err.is_panic() => {
                tracing::warn!(?err, "Fan-out task panicked");
                summary.panicked += 1;
            }
            Err(err) => {
                tracing::debug!(?err, "Fan-out task aborted");
                summary.cancelled += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use test_log::test;

    use super::*;

    #[test(tokio::test)]
    async fn should_fold_all_results() {
        let cancel = CancellationToken::new();
        let summary = fan_out(
            1..=10u32,
            3,
            &cancel,
            |i| async move { i * 2 },
            0,
            |acc, r| acc + r,
        )
        .await;

        assert_eq!(
            summary,
            FanOutSummary {
                value: 110,
                completed: 10,
                cancelled: 0,
                panicked: 0
            }
        );
    }

    #[test(tokio::test)]
    async fn should_limit_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let summary = fan_out(
            0..20,
            4,
            &cancel,
            |_| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            },
            (),
            |(), ()| (),
        )
        .await;

        assert_eq!(summary.completed, 20);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[test(tokio::test)]
    async fn should_count_panicked_tasks() {
        let cancel = CancellationToken::new();
        let summary = fan_out(
            0..4,
            2,
            &cancel,
            |i| async move {
                if i == 2 {
                    panic!("task {i} failed");
                }
                i
            },
            Vec::new(),
            |mut acc, r| {
                acc.push(r);
                acc
            },
        )
        .await;

        let mut value = summary.value;
        value.sort();
        assert_eq!(value, [0, 1, 3]);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.panicked, 1);
    }

    #[test(tokio::test(start_paused = true))]
    async fn should_abort_running_work_on_cancel() {
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let summary = fan_out(
            0..5,
            2,
            &cancel,
            |_| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
            },
            (),
            |(), ()| (),
        )
        .await;

        assert_eq!(summary.completed, 0);
        assert_eq!(summary.cancelled, 5);
    }

    #[test(tokio::test)]
    async fn should_not_start_work_when_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = AtomicUsize::new(0);

        let summary = fan_out(
            0..3,
            1,
            &cancel,
            |_| {
                started.fetch_add(1, Ordering::SeqCst);
                async {}
            },
            (),
            |(), ()| (),
        )
        .await;

        assert_eq!(started.load(Ordering::SeqCst), 0);
        assert_eq!(summary.cancelled, 3);
    }
}
