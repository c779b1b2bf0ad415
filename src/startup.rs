//! Startup/readiness orchestrator.
//!
//! The process must not accept connections until the storage collaborator is
//! confirmed reachable. [`StartupGate::run`] probes the store, binds the
//! listener once a probe succeeds, and otherwise waits a fixed delay and
//! tries again - indefinitely, with no backoff growth. A container
//! orchestrator that starts dependents out of order simply sees the port
//! closed until the database comes up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::storage::TaskStore;

/// Phase of the startup gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Probing the store's health.
    Probing,
    /// Last attempt failed; waiting out the retry delay.
    RetryWait,
    /// Listener bound. Terminal for the process lifetime.
    Listening,
}

/// Errors a single startup attempt can fail with. Never escalated; they
/// feed the retry loop.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("database not ready: {0}")]
    Unhealthy(String),
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

/// One-shot gate from process start to a bound listener.
pub struct StartupGate {
    retry_delay: Duration,
    attempts: AtomicU64,
    state: Mutex<GateState>,
}

impl StartupGate {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            retry_delay,
            attempts: AtomicU64::new(0),
            state: Mutex::new(GateState::Probing),
        }
    }

    /// Number of startup attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Current phase of the gate.
    pub fn state(&self) -> GateState {
        *self.state.lock().expect("gate state lock poisoned")
    }

    fn set_state(&self, state: GateState) {
        *self.state.lock().expect("gate state lock poisoned") = state;
    }

    /// Probe the store and bind the listener, retrying until both succeed.
    ///
    /// Returns the bound listener. Never returns an error: unhealthy probes
    /// and bind failures are logged and retried after the fixed delay.
    pub async fn run(&self, store: &dyn TaskStore, addr: &str) -> TcpListener {
        loop {
            self.set_state(GateState::Probing);
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

            match self.attempt(store, addr).await {
                Ok(listener) => {
                    self.set_state(GateState::Listening);
                    tracing::info!("Startup probe succeeded on attempt {}", attempt);
                    return listener;
                }
                Err(e) => {
                    tracing::warn!(
                        "Startup attempt {} failed: {}; retrying in {:?}",
                        attempt,
                        e,
                        self.retry_delay
                    );
                    self.set_state(GateState::RetryWait);
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn attempt(&self, store: &dyn TaskStore, addr: &str) -> Result<TcpListener, AttemptError> {
        let health = store.health_check().await;
        if !health.is_healthy() {
            return Err(AttemptError::Unhealthy(
                health.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(TcpListener::bind(addr).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::storage::{DbHealth, StorageError};
    use crate::task::{NewTask, Task, TaskPatch, TaskStats};

    /// Store whose probe fails a configurable number of times, then succeeds.
    struct FlakyStore {
        failures: usize,
        probes: AtomicUsize,
    }

    impl FlakyStore {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                probes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskStore for FlakyStore {
        async fn health_check(&self) -> DbHealth {
            let probe = self.probes.fetch_add(1, Ordering::Relaxed);
            if probe < self.failures {
                DbHealth::unhealthy("fake", "connection refused")
            } else {
                DbHealth::healthy("fake")
            }
        }

        async fn list(&self) -> Result<Vec<Task>, StorageError> {
            Ok(vec![])
        }
        async fn get(&self, _id: i64) -> Result<Option<Task>, StorageError> {
            Ok(None)
        }
        async fn create(&self, _new: NewTask) -> Result<Task, StorageError> {
            unimplemented!("not used by gate tests")
        }
        async fn update(&self, _id: i64, _patch: TaskPatch) -> Result<Option<Task>, StorageError> {
            Ok(None)
        }
        async fn delete(&self, _id: i64) -> Result<bool, StorageError> {
            Ok(false)
        }
        async fn stats(&self) -> Result<TaskStats, StorageError> {
            Ok(TaskStats {
                total: 0,
                todo: 0,
                in_progress: 0,
                done: 0,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn binds_on_first_attempt_when_healthy() {
        let store = FlakyStore::new(0);
        let gate = StartupGate::new(Duration::from_secs(5));

        let listener = gate.run(&store, "127.0.0.1:0").await;
        drop(listener);

        assert_eq!(gate.attempts(), 1);
        assert_eq!(gate.state(), GateState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_store_recovers() {
        let store = FlakyStore::new(2);
        let gate = StartupGate::new(Duration::from_secs(5));

        let listener = gate.run(&store, "127.0.0.1:0").await;
        drop(listener);

        // Two unhealthy probes, then the third binds.
        assert_eq!(gate.attempts(), 3);
        assert_eq!(gate.state(), GateState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn gate_waits_while_unhealthy() {
        let store = FlakyStore::new(usize::MAX);
        let gate = StartupGate::new(Duration::from_secs(5));

        tokio::select! {
            _ = gate.run(&store, "127.0.0.1:0") => {
                panic!("gate must not bind while the store is unhealthy");
            }
            _ = tokio::time::sleep(Duration::from_secs(60)) => {}
        }

        // 60s of paused time at a 5s interval: the loop kept probing and
        // never left the retry cycle.
        assert!(gate.attempts() >= 12);
        assert_ne!(gate.state(), GateState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn bind_failure_is_retried() {
        let blocker = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = blocker.local_addr().unwrap().to_string();

        // Free the port partway through the retry cycle.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            drop(blocker);
        });

        let store = FlakyStore::new(0);
        let gate = StartupGate::new(Duration::from_secs(5));
        let listener = gate.run(&store, &addr).await;
        drop(listener);

        assert!(gate.attempts() >= 2);
        assert_eq!(gate.state(), GateState::Listening);
    }
}
