//! Checks run once before any worker starts: the executable exists, and the renderer
//! library it needs can be loaded.

use crossbeam_channel::{Receiver, unbounded};
use log::debug;
use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::RenderError;
use crate::utils::config::WorkerConsts;

/// Resolve `name` to a full path. Names with a path separator are checked as given;
/// bare names are searched on `PATH`.
pub fn resolve_executable(name: &str) -> Result<PathBuf, RenderError> {
    let not_found = || RenderError::Launch {
        executable: name.to_string(),
        message: "executable not found. Install it or set the executable path in the \
                  renderer configuration"
            .to_string(),
    };

    let candidate = Path::new(name);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return is_executable(candidate)
            .then(|| candidate.to_path_buf())
            .ok_or_else(not_found);
    }

    let path_var = env::var_os("PATH").ok_or_else(not_found)?;
    for dir in env::split_paths(&path_var) {
        let full = dir.join(name);
        if is_executable(&full) {
            return Ok(full);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{name}.exe"));
            if is_executable(&exe) {
                return Ok(exe);
            }
        }
    }
    Err(not_found())
}

/// The runner script is passed to every worker; a missing one would make each worker exit
/// right after launch, so it is rejected before the pool starts.
pub fn check_runner(executable: &str, runner: &Path) -> Result<(), RenderError> {
    if runner.is_file() {
        return Ok(());
    }
    Err(RenderError::Launch {
        executable: executable.to_string(),
        message: format!(
            "runner script '{}' not found. Point the runner setting at the Markdoc runner",
            runner.display()
        ),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Forward `stream` in chunks until EOF. A grandchild that inherits the pipe can keep it
/// open indefinitely, so callers collect with a deadline instead of joining.
fn read_chunks<R: Read + Send + 'static>(stream: Option<R>) -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let Some(mut s) = stream else {
            return;
        };
        let mut buf = [0u8; 4096];
        loop {
            match s.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(String::from_utf8_lossy(&buf[..n]).into_owned()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Everything received before EOF or `until`, whichever comes first.
fn collect_output(chunks: &Receiver<String>, until: Instant) -> String {
    let mut out = String::new();
    while let Ok(chunk) = chunks.recv_deadline(until) {
        out.push_str(&chunk);
    }
    out
}

/// Run `executable args...` and require exit status 0 with stdout `ok`.
/// The child's stderr is included verbatim in the error.
pub fn check_importable(
    executable: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<(), RenderError> {
    let exe_name = executable.display().to_string();
    let launch_err = |message: String| RenderError::Launch {
        executable: exe_name.clone(),
        message,
    };

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_err(e.to_string()))?;
    let stdout = read_chunks(child.stdout.take());
    let stderr = read_chunks(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(launch_err(format!(
                    "preflight check did not finish within {} ms",
                    timeout.as_millis()
                )));
            }
            None => thread::sleep(WorkerConsts::EXIT_POLL_INTERVAL),
        }
    };

    let until = deadline.max(Instant::now() + WorkerConsts::OUTPUT_DRAIN);
    let out = collect_output(&stdout, until);
    let err = collect_output(&stderr, until);
    if !status.success() || out.trim() != "ok" {
        return Err(launch_err(format!(
            "renderer library is not importable ({}). Install it where the runner can \
             reach it.\nRenderer stderr: {}",
            status,
            err.trim()
        )));
    }
    debug!("preflight check passed for {}", exe_name);
    Ok(())
}
