//! Worker configuration loaded from environment variables.

use std::time::Duration;

/// Runtime knobs for the worker binary.
///
/// | Env Var                 | Default | Meaning                                   |
/// |-------------------------|---------|-------------------------------------------|
/// | `WORKER_CONCURRENCY`    | `2`     | Number of concurrent worker loops         |
/// | `WORKER_POLL_MS`        | `500`   | Queue polling interval when idle          |
/// | `ENGINE_TIMEOUT_SECS`   | `0`     | Per-job engine deadline (0 = unbounded)   |
/// | `SWEEP_INTERVAL_SECS`   | `60`    | How often the recovery sweep runs         |
/// | `STALE_PENDING_SECS`    | `300`   | Age before a pending job is re-dispatched |
/// | `STALE_PROCESSING_SECS` | `1800`  | Age before a processing job is failed     |
/// | `SWEEP_BATCH_LIMIT`     | `50`    | Max records touched per sweep pass        |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub poll_interval: Duration,
    /// `None` leaves the engine call unbounded.
    pub engine_timeout: Option<Duration>,
    pub sweep_interval: Duration,
    pub stale_pending: chrono::Duration,
    pub stale_processing: chrono::Duration,
    pub sweep_batch_limit: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval: Duration::from_millis(500),
            engine_timeout: None,
            sweep_interval: Duration::from_secs(60),
            stale_pending: chrono::Duration::seconds(300),
            stale_processing: chrono::Duration::seconds(1800),
            sweep_batch_limit: 50,
        }
    }
}

impl WorkerConfig {
    /// Load from environment variables, falling back to defaults.
    /// Invalid values fail fast.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let concurrency = env_parse("WORKER_CONCURRENCY", defaults.concurrency);
        let poll_ms = env_parse("WORKER_POLL_MS", defaults.poll_interval.as_millis() as u64);
        let engine_timeout_secs: u64 = env_parse("ENGINE_TIMEOUT_SECS", 0);
        let sweep_secs = env_parse("SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs());
        let stale_pending_secs =
            env_parse("STALE_PENDING_SECS", defaults.stale_pending.num_seconds());
        let stale_processing_secs = env_parse(
            "STALE_PROCESSING_SECS",
            defaults.stale_processing.num_seconds(),
        );
        let sweep_batch_limit = env_parse("SWEEP_BATCH_LIMIT", defaults.sweep_batch_limit);

        Self {
            concurrency: concurrency.max(1),
            poll_interval: Duration::from_millis(poll_ms),
            engine_timeout: (engine_timeout_secs > 0)
                .then(|| Duration::from_secs(engine_timeout_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
            stale_pending: chrono::Duration::seconds(stale_pending_secs),
            stale_processing: chrono::Duration::seconds(stale_processing_secs),
            sweep_batch_limit,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{var} must be a valid value: {e}")),
        Err(_) => default,
    }
}
