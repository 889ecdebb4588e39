//! Benchmark phase runner
//!
//! A run goes through three phases sharing one [`BenchmarkStep`]:
//! prepare (load dumps, `GET /initialize`), load (the worker pools, for a
//! fixed duration) and validation (post-load checks).

use crate::actions;
use crate::error::{ExecutionError, ExecutionResult};
use crate::scenario::Scenario;
use crate::worker::{Worker, WorkerOptions};
use futures::future::join_all;
use isubench_config::{BenchConfig, PoolConfig};
use isubench_core::validation::{validate_response, ExpectStatus};
use isubench_core::{BenchError, BenchmarkResult, BenchmarkStep, Failure};
use isubench_http::{Agent, AgentConfig};
use isubench_logging::admin;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Benchmark {
    config: BenchConfig,
    scenario: Arc<Scenario>,
    step: Arc<BenchmarkStep>,
}

impl Benchmark {
    pub fn new(config: BenchConfig) -> ExecutionResult<Self> {
        let agent_config = AgentConfig::from_target(&config.target)?;
        Ok(Self {
            config,
            scenario: Arc::new(Scenario::new(agent_config)),
            step: Arc::new(BenchmarkStep::new()),
        })
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn step(&self) -> &Arc<BenchmarkStep> {
        &self.step
    }

    /// Run every phase; a preparation error ends the run early and is
    /// reported as the result's fatal error
    pub async fn start(&self, cancel: &CancellationToken) -> BenchmarkResult {
        let started = Instant::now();

        let fatal = match self.run_phases(cancel).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Benchmark aborted: {}", e);
                Some(e.to_string())
            }
        };

        admin!(elapsed = ?started.elapsed(), "Benchmark finished");
        BenchmarkResult::from_step(&self.step, fatal)
    }

    async fn run_phases(&self, cancel: &CancellationToken) -> ExecutionResult<()> {
        admin!("Prepare phase");
        self.prepare(cancel).await?;

        admin!(duration = ?self.config.load.duration, "Load phase");
        self.load(cancel).await?;

        admin!("Validation phase");
        self.validation(cancel).await
    }

    /// Load the dumps and reset the target; every error here is fatal
    pub async fn prepare(&self, cancel: &CancellationToken) -> ExecutionResult<()> {
        let scenario = Arc::clone(&self.scenario);
        let fixtures = self.config.fixtures.clone();
        tokio::task::spawn_blocking(move || scenario.load_fixtures(&fixtures))
            .await
            .map_err(|e| ExecutionError::TaskFailed(e.to_string()))?
            .map_err(|e| self.fatal(e))?;

        let agent_config = self
            .scenario
            .agent_config()
            .clone()
            .with_timeout(self.config.target.initialize_request_timeout);
        let agent = Agent::new(agent_config).map_err(|e| self.fatal(BenchError::Agent(e)))?;

        let res = actions::get_initialize(cancel, &agent)
            .await
            .map_err(|e| self.fatal(BenchError::Request(e)))?;

        validate_response(&res, &[&ExpectStatus(200)])
            .await
            .record(&self.step);

        Ok(())
    }

    /// Run the worker pools until they drain or the load duration elapses
    pub async fn load(&self, cancel: &CancellationToken) -> ExecutionResult<()> {
        let load_cancel = cancel.child_token();
        let timer = {
            let load_cancel = load_cancel.clone();
            let duration = self.config.load.duration;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => load_cancel.cancel(),
                    _ = load_cancel.cancelled() => {}
                }
            })
        };

        let pools = [
            (
                "login-success",
                self.pool(self.config.load.login_success, |scenario, cancel, step| async move {
                    scenario.run_login_success(&cancel, &step).await
                })?,
            ),
            (
                "login-failure",
                self.pool(self.config.load.login_failure, |scenario, cancel, step| async move {
                    scenario.run_login_failure(&cancel, &step).await
                })?,
            ),
            (
                "ordered-feed",
                self.pool(self.config.load.ordered_feed, |scenario, cancel, step| async move {
                    scenario.run_ordered_feed(&cancel, &step).await
                })?,
            ),
        ];

        let iterations = join_all(pools.iter().map(|(_, worker)| worker.process(&load_cancel))).await;
        for ((name, _), count) in pools.iter().zip(iterations) {
            info!(pool = name, iterations = count, "Worker pool drained");
        }

        load_cancel.cancel();
        timer
            .await
            .map_err(|e| ExecutionError::TaskFailed(e.to_string()))?;
        Ok(())
    }

    /// Post-load checks; none are defined yet
    pub async fn validation(&self, _cancel: &CancellationToken) -> ExecutionResult<()> {
        Ok(())
    }

    fn pool<F, Fut>(&self, config: PoolConfig, case: F) -> ExecutionResult<Worker>
    where
        F: Fn(Arc<Scenario>, CancellationToken, Arc<BenchmarkStep>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scenario = Arc::clone(&self.scenario);
        let step = Arc::clone(&self.step);
        Worker::new(
            move |cancel, _| case(Arc::clone(&scenario), cancel, Arc::clone(&step)),
            WorkerOptions::from(config),
        )
    }

    /// Record a preparation error before handing it back
    fn fatal(&self, err: BenchError) -> ExecutionError {
        self.step
            .add_failure(Failure::new(err.failure_kind(), err.to_string()));
        err.into()
    }
}
