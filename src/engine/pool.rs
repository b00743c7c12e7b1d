//! Fixed-size pool of renderer workers with blocking checkout and bounded-time exchanges.
//!
//! Workers that time out, exit, or are found dead are destroyed and never replaced, so the
//! pool can only shrink during a build. Once it is empty, `checkout` fails instead of waiting.

use crossbeam_channel::RecvTimeoutError;
use log::{debug, info, warn};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::Rendered;
use crate::RendererConfig;
use crate::engine::protocol::{RenderResponse, decode_response, encode_request};
use crate::engine::worker::{ListenerEvent, Worker};
use crate::error::RenderError;

/// Snapshot of pool bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub started: usize,
    /// Workers not yet destroyed (idle + checked out).
    pub live: usize,
    pub idle: usize,
    pub checked_out: usize,
    /// Most workers ever checked out at the same time.
    pub peak_checked_out: usize,
    pub destroyed: usize,
}

struct PoolState {
    idle: Vec<Worker>,
    live: usize,
    checked_out: usize,
    peak_checked_out: usize,
    destroyed: usize,
    shut_down: bool,
}

pub struct WorkerPool {
    state: Mutex<PoolState>,
    available: Condvar,
    started: usize,
    timeout: Duration,
    grace: Duration,
}

impl WorkerPool {
    /// Launch `config.effective_pool_size()` workers. Any launch failure aborts and kills
    /// the workers already started.
    pub fn start(config: &RendererConfig) -> Result<WorkerPool, RenderError> {
        let size = config.effective_pool_size();
        let args = config.worker_args();
        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            workers.push(Worker::start(&config.executable, &args)?);
        }
        info!(
            "Started {} renderer workers ({} {})",
            size,
            config.executable,
            args.join(" ")
        );
        Ok(WorkerPool::from_workers(
            workers,
            config.timeout(),
            config.grace(),
        ))
    }

    /// Build a pool around already-started workers.
    pub fn from_workers(workers: Vec<Worker>, timeout: Duration, grace: Duration) -> WorkerPool {
        let started = workers.len();
        WorkerPool {
            state: Mutex::new(PoolState {
                idle: workers,
                live: started,
                checked_out: 0,
                peak_checked_out: 0,
                destroyed: 0,
                shut_down: false,
            }),
            available: Condvar::new(),
            started,
            timeout,
            grace,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-exchange timeout used by [`render`](Self::render).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Workers still alive (idle or checked out).
    pub fn capacity(&self) -> usize {
        self.lock().live
    }

    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            started: self.started,
            live: state.live,
            idle: state.idle.len(),
            checked_out: state.checked_out,
            peak_checked_out: state.peak_checked_out,
            destroyed: state.destroyed,
        }
    }

    /// Block until some worker is idle and take it. Fails with `PoolExhausted` when no live
    /// worker remains (or the pool was shut down), including while waiting.
    pub fn checkout(&self) -> Result<Worker, RenderError> {
        let mut state = self.lock();
        loop {
            if state.shut_down {
                return Err(RenderError::PoolExhausted {
                    started: self.started,
                });
            }
            if let Some(worker) = state.idle.pop() {
                state.checked_out += 1;
                state.peak_checked_out = state.peak_checked_out.max(state.checked_out);
                return Ok(worker);
            }
            if state.live == 0 {
                return Err(RenderError::PoolExhausted {
                    started: self.started,
                });
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Return a checked-out worker. A dead worker is destroyed instead (capacity shrinks).
    pub fn checkin(&self, mut worker: Worker) {
        if !worker.is_alive() {
            self.discard(worker);
            return;
        }
        let mut state = self.lock();
        state.checked_out -= 1;
        if state.shut_down {
            state.live -= 1;
            drop(state);
            worker.terminate(self.grace);
            return;
        }
        state.idle.push(worker);
        drop(state);
        self.available.notify_one();
    }

    /// Destroy a checked-out worker that must not be reused.
    pub fn discard(&self, mut worker: Worker) {
        worker.kill();
        let mut state = self.lock();
        state.checked_out -= 1;
        state.live -= 1;
        state.destroyed += 1;
        let live = state.live;
        drop(state);
        // Waiters must re-check `live` so an emptied pool fails instead of hanging.
        self.available.notify_all();
        warn!(
            "Renderer worker {} destroyed; {} of {} workers left",
            worker.id(),
            live,
            self.started
        );
    }

    /// Send one document to `worker` and wait at most `timeout` for its answer.
    ///
    /// On `RenderTimeout` the worker has already been killed. Use
    /// [`RenderError::worker_reusable`] to decide between `checkin` and `discard`.
    pub fn exchange(
        &self,
        worker: &mut Worker,
        markdown: &str,
        timeout: Duration,
    ) -> Result<Rendered, RenderError> {
        let worker_id = worker.id();
        if !worker.is_alive() {
            return Err(RenderError::WorkerDead { worker_id });
        }
        if !worker.drain_unsolicited() {
            return Err(RenderError::WorkerExited { worker_id });
        }

        let line = encode_request(markdown)?;
        if let Err(e) = worker.send_line(&line) {
            debug!("worker {}: request write failed: {}", worker_id, e);
            return Err(RenderError::WorkerExited { worker_id });
        }

        match worker.recv_response(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                worker.kill();
                Err(RenderError::RenderTimeout { worker_id, timeout })
            }
            Err(RecvTimeoutError::Disconnected) | Ok(ListenerEvent::Closed) => {
                Err(RenderError::WorkerExited { worker_id })
            }
            Ok(ListenerEvent::Line(line)) => match decode_response(&line)? {
                RenderResponse::Success { html, warnings } => Ok(Rendered { html, warnings }),
                RenderResponse::Failure { message } => Err(RenderError::RenderFailed { message }),
            },
        }
    }

    /// Checkout, exchange with the pool timeout, then checkin or discard.
    pub fn render(&self, markdown: &str) -> Result<Rendered, RenderError> {
        let mut worker = self.checkout()?;
        let result = self.exchange(&mut worker, markdown, self.timeout);
        match &result {
            Err(e) if !e.worker_reusable() => self.discard(worker),
            _ => self.checkin(worker),
        }
        result
    }

    /// Terminate every idle worker (closing stdin, then the grace period, then kill).
    /// Workers still checked out are terminated when they come back. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        let idle = std::mem::take(&mut state.idle);
        state.live -= idle.len();
        drop(state);
        self.available.notify_all();

        if idle.is_empty() {
            return;
        }
        debug!("Shutting down {} renderer workers", idle.len());
        let grace = self.grace;
        thread::scope(|s| {
            for mut worker in idle {
                s.spawn(move || worker.terminate(grace));
            }
        });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
