use super::{Error, NoisyCompare, Result};
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Runs an oracle on a dedicated thread and bounds the duration of each call.
///
/// Once a call has timed out the wrapper refuses any further query:
/// the expired request may still be running, and spending budget, on the remote side.
pub struct TimeoutOracle {
    requests: Option<Sender<f64>>,
    answers: Receiver<Result<f64>>,
    timeout: Duration,
    expired: bool,
    worker: Option<JoinHandle<()>>,
}

impl TimeoutOracle {
    pub fn new<O: NoisyCompare + Send + 'static>(mut oracle: O, timeout: Duration) -> Self {
        let (requests, pending) = mpsc::channel::<f64>();
        let (answered, answers) = mpsc::channel();
        let worker = thread::spawn(move || {
            for threshold in pending {
                if answered.send(oracle.noisy_compare(threshold)).is_err() {
                    break;
                }
            }
        });
        TimeoutOracle {
            requests: Some(requests),
            answers,
            timeout,
            expired: false,
            worker: Some(worker),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Has a call already timed out
    pub fn expired(&self) -> bool {
        self.expired
    }
}

impl NoisyCompare for TimeoutOracle {
    fn noisy_compare(&mut self, threshold: f64) -> Result<f64> {
        if self.expired {
            return Err(Error::unavailable(
                "a previous query timed out and may still be running",
            ));
        }
        self.requests
            .as_ref()
            .ok_or_else(|| Error::unavailable("the oracle is shut down"))?
            .send(threshold)
            .map_err(|_| Error::unavailable("the oracle worker stopped"))?;
        match self.answers.recv_timeout(self.timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                self.expired = true;
                log::warn!("Query at threshold {threshold} exceeded {:?}", self.timeout);
                Err(Error::timeout(format!(
                    "no answer at threshold {threshold} after {:?}",
                    self.timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::unavailable("the oracle worker stopped"))
            }
        }
    }
}

impl Drop for TimeoutOracle {
    fn drop(&mut self) {
        // Closing the channel stops the worker once its current query returns
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if self.expired {
                log::debug!(
                    "Abandoning the worker of a timed out query, its late answer will be dropped"
                );
            } else {
                let _ = worker.join();
            }
        }
    }
}
