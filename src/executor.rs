// Copyright 2024 The ShaleKV Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("sub-task panicked: {0}")]
    Panicked(String),
    #[error("sub-task cancelled")]
    Cancelled,
}

impl From<JoinError> for TaskError {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return TaskError::Cancelled;
        }
        let panic = err.into_panic();
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        TaskError::Panicked(message)
    }
}

/// Fans independent sub-tasks out over the runtime with bounded concurrency.
///
/// Results come back in input order so callers correlate by index. Each
/// sub-task runs in its own spawned task: a panic resolves that slot to
/// [`TaskError::Panicked`] without disturbing siblings.
#[derive(Clone)]
pub struct ParallelExecutor {
    permits: Arc<Semaphore>,
}

impl ParallelExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self { permits: Arc::new(Semaphore::new(concurrency.max(1))) }
    }

    pub async fn execute<F, Fut, T>(&self, tasks: Vec<F>) -> Vec<Result<T, TaskError>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let permits = self.permits.clone();
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    task().await
                })
            })
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.map_err(TaskError::from));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assertor::*;

    use super::*;

    #[tokio::test]
    async fn test_results_match_input_order() {
        let executor = ParallelExecutor::new(4);
        let tasks: Vec<_> = (0..8u64)
            .map(|i| {
                move || async move {
                    // Later tasks finish first.
                    tokio::time::sleep(Duration::from_millis(80 - i * 10)).await;
                    i
                }
            })
            .collect();
        let results = executor.execute(tasks).await;
        let values: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_that!(values).is_equal_to((0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let executor = ParallelExecutor::new(2);
        let tasks: Vec<Box<dyn FnOnce() -> futures::future::BoxFuture<'static, u64> + Send>> = vec![
            Box::new(|| Box::pin(async { 1 })),
            Box::new(|| Box::pin(async { panic!("boom") })),
            Box::new(|| Box::pin(async { 3 })),
        ];
        let results = executor.execute(tasks).await;
        assert_that!(*results[0].as_ref().unwrap()).is_equal_to(1);
        assert!(matches!(results[1], Err(TaskError::Panicked(_))));
        assert_that!(*results[2].as_ref().unwrap()).is_equal_to(3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        static RUNNING: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        let executor = ParallelExecutor::new(3);
        let tasks: Vec<_> = (0..12)
            .map(|_| {
                move || async move {
                    let running = RUNNING.fetch_add(1, Ordering::SeqCst) + 1;
                    PEAK.fetch_max(running, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    RUNNING.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();
        executor.execute(tasks).await;
        assert_that!(PEAK.load(Ordering::SeqCst)).is_at_most(3);
    }
}
