//! Scripted provider call for deterministic retry tests.

use parking_lot::Mutex;
use parley_error::RawFailure;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A provider call that plays back a script of outcomes.
///
/// Once the script is exhausted the fallback outcome repeats forever.
#[derive(Clone)]
pub struct ScriptedCall {
    script: Arc<Mutex<VecDeque<Result<String, RawFailure>>>>,
    fallback: Result<String, RawFailure>,
    latency: Option<Duration>,
    calls: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl ScriptedCall {
    /// Always succeeds with `text`.
    pub fn new_success(text: &str) -> Self {
        Self::with_script(Vec::new(), Ok(text.to_string()))
    }

    /// Always fails with `failure`.
    pub fn new_error(failure: RawFailure) -> Self {
        Self::with_script(Vec::new(), Err(failure))
    }

    /// Fails `failures` times with `failure`, then succeeds with `text`.
    pub fn new_fail_then_succeed(failures: usize, failure: RawFailure, text: &str) -> Self {
        let script = (0..failures).map(|_| Err(failure.clone())).collect();
        Self::with_script(script, Ok(text.to_string()))
    }

    /// Plays `script`, then repeats `fallback`.
    pub fn with_script(
        script: Vec<Result<String, RawFailure>>,
        fallback: Result<String, RawFailure>,
    ) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            latency: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Each call sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Start one call.
    pub fn call(&self) -> impl Future<Output = Result<String, RawFailure>> + 'static {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let latency = self.latency;
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
    }

    /// Number of calls started so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}
