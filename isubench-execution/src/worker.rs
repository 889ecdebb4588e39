//! Worker pools
//!
//! A [`Worker`] runs one task over and over, either a fixed number of times
//! or until cancelled, with at most `max_parallelism` iterations in flight.

use crate::error::{ExecutionError, ExecutionResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use isubench_config::{LoopPolicy, PoolConfig};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type WorkerTask = Arc<dyn Fn(CancellationToken, usize) -> BoxFuture<'static, ()> + Send + Sync>;

/// Loop and parallelism policy of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    pub loop_policy: LoopPolicy,
    pub max_parallelism: usize,
}

impl From<PoolConfig> for WorkerOptions {
    fn from(config: PoolConfig) -> Self {
        Self {
            loop_policy: config.loop_policy(),
            max_parallelism: config.max_parallelism,
        }
    }
}

pub struct Worker {
    task: WorkerTask,
    options: WorkerOptions,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Create a worker running `task(cancel, iteration)`
    pub fn new<F, Fut>(task: F, options: WorkerOptions) -> ExecutionResult<Self>
    where
        F: Fn(CancellationToken, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if options.max_parallelism == 0 {
            return Err(ExecutionError::InvalidOptions(
                "max_parallelism must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            task: Arc::new(move |cancel, iteration| task(cancel, iteration).boxed()),
            options,
        })
    }

    /// Run iterations until the loop policy is exhausted or `cancel` fires,
    /// then wait for the in-flight ones; returns how many were started
    pub async fn process(&self, cancel: &CancellationToken) -> usize {
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallelism));
        let mut tasks = JoinSet::new();
        let mut started = 0usize;

        loop {
            if let LoopPolicy::Count(count) = self.options.loop_policy {
                if started >= count as usize {
                    break;
                }
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            while let Some(finished) = tasks.try_join_next() {
                log_iteration(finished);
            }

            let task = Arc::clone(&self.task);
            let cancel = cancel.clone();
            let iteration = started;
            tasks.spawn(async move {
                let _permit = permit;
                task(cancel, iteration).await;
            });
            started += 1;
        }

        while let Some(finished) = tasks.join_next().await {
            log_iteration(finished);
        }

        debug!("Worker finished after {} iterations", started);
        started
    }
}

fn log_iteration(result: Result<(), JoinError>) {
    if let Err(e) = result {
        warn!("Worker iteration did not complete: {}", e);
    }
}
