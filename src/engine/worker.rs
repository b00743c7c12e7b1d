//! One renderer process: stdin as the request sink, stdout as the response source.
//!
//! A listener thread owns stdout and forwards each line over a single-slot channel, so the
//! pool can wait for a response with a deadline instead of blocking on the pipe.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::{debug, warn};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::RenderError;
use crate::utils::config::WorkerConsts;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(1);

/// What the listener thread saw on the worker's stdout.
#[derive(Debug, PartialEq, Eq)]
pub enum ListenerEvent {
    Line(String),
    /// End of input or a read error (both mean no more responses).
    Closed,
}

pub struct Worker {
    id: usize,
    child: Child,
    stdin: Option<ChildStdin>,
    responses: Receiver<ListenerEvent>,
    terminated: bool,
}

impl Worker {
    /// Spawn `command args...`. Stderr is inherited so renderer crashes show up immediately.
    pub fn start(command: &str, args: &[String]) -> Result<Worker, RenderError> {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RenderError::Launch {
                executable: command.to_string(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Launch {
                executable: command.to_string(),
                message: "stdout was not captured".to_string(),
            });
        };

        let (tx, rx) = bounded::<ListenerEvent>(1);
        let spawned = thread::Builder::new()
            .name(format!("markpool-listener-{id}"))
            .spawn(move || listen(stdout, tx));
        if let Err(e) = spawned {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Io(e));
        }

        debug!("worker {} started (pid {})", id, child.id());
        Ok(Worker {
            id,
            child,
            stdin,
            responses: rx,
            terminated: false,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Non-blocking: false once terminated or once the process has exited.
    pub fn is_alive(&mut self) -> bool {
        !self.terminated && matches!(self.child.try_wait(), Ok(None))
    }

    /// Write one request line and flush.
    pub fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "request sink closed")
        })?;
        stdin.write_all(line.as_bytes())?;
        stdin.flush()
    }

    /// Wait at most `timeout` for the listener to report.
    pub fn recv_response(&self, timeout: Duration) -> Result<ListenerEvent, RecvTimeoutError> {
        self.responses.recv_timeout(timeout)
    }

    /// Discard lines nobody asked for (a renderer writing more than one line per request).
    /// Returns false if the listener already reported end of input.
    pub fn drain_unsolicited(&self) -> bool {
        while let Ok(event) = self.responses.try_recv() {
            match event {
                ListenerEvent::Line(line) => warn!(
                    "worker {}: discarding unsolicited output: {}",
                    self.id,
                    line.trim_end()
                ),
                ListenerEvent::Closed => return false,
            }
        }
        true
    }

    /// Close stdin, wait up to `grace` for exit, then kill. Idempotent.
    pub fn terminate(&mut self, grace: Duration) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        drop(self.stdin.take());

        let deadline = Instant::now() + grace;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("worker {} exited ({})", self.id, status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(WorkerConsts::EXIT_POLL_INTERVAL);
                }
                _ => break,
            }
        }

        if let Err(e) = self.child.kill() {
            debug!("worker {}: kill failed: {}", self.id, e);
        }
        match self.child.wait() {
            Ok(status) => debug!("worker {} killed ({})", self.id, status),
            Err(e) => warn!("worker {}: wait after kill failed: {}", self.id, e),
        }
    }

    /// Terminate without a grace period (hung or misbehaving worker).
    pub fn kill(&mut self) {
        self.terminate(Duration::ZERO);
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // The listener thread is detached: it exits on EOF or once this receiver is gone.
        if !self.terminated {
            self.kill();
        }
    }
}

/// Listener loop: forward each stdout line until EOF. Read errors count as EOF so a kill
/// mid-read never leaves a half line in the channel.
fn listen(stdout: ChildStdout, tx: Sender<ListenerEvent>) {
    let mut reader = BufReader::new(stdout);
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = tx.send(ListenerEvent::Closed);
                break;
            }
            Ok(_) => {
                if tx.send(ListenerEvent::Line(line)).is_err() {
                    break;
                }
            }
        }
    }
}
