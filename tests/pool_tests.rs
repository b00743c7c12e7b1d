//! Worker and pool tests against a fake shell renderer.
#![cfg(unix)]

mod common;

use markpool::RenderError;
use markpool::engine::{Worker, WorkerPool};
use std::thread;
use std::time::{Duration, Instant};

use common::{OK_HTML, config, fake_renderer};

// --- worker ---

#[test]
fn test_worker_start_missing_executable_is_launch_error() {
    let err = Worker::start("/definitely/not/a/renderer", &[]).err().unwrap();
    assert!(matches!(err, RenderError::Launch { .. }), "{err}");
}

#[test]
fn test_worker_terminate_is_idempotent() {
    let fx = fake_renderer();
    let args = vec![fx.script.to_string_lossy().into_owned()];
    let mut worker = Worker::start("sh", &args).unwrap();
    assert!(worker.is_alive());
    worker.terminate(Duration::from_millis(500));
    assert!(!worker.is_alive());
    worker.terminate(Duration::from_millis(500));
    assert!(!worker.is_alive());
}

// --- exchange ---

#[test]
fn test_exchange_success_with_warnings() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let mut worker = pool.checkout().unwrap();
    let rendered = pool
        .exchange(&mut worker, "WARN me", Duration::from_secs(5))
        .unwrap();
    assert_eq!(rendered.html, "<p>w</p>");
    assert_eq!(rendered.warnings, vec!["first", "second"]);
    pool.checkin(worker);
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn test_exchange_empty_html_is_success() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let rendered = pool.render("EMPTY").unwrap();
    assert_eq!(rendered.html, "");
    assert!(rendered.warnings.is_empty());
}

#[test]
fn test_render_failed_keeps_worker() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let err = pool.render("please FAIL").unwrap_err();
    match err {
        RenderError::RenderFailed { ref message } => {
            assert_eq!(message, "bad document: FAIL marker")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pool.capacity(), 1);
    assert_eq!(pool.render("# fine").unwrap().html, OK_HTML);
}

#[test]
fn test_protocol_error_keeps_live_worker() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let err = pool.render("GARBAGE").unwrap_err();
    assert!(matches!(err, RenderError::Protocol { .. }), "{err}");
    assert_eq!(pool.capacity(), 1);
    assert_eq!(pool.render("# fine").unwrap().html, OK_HTML);
}

#[test]
fn test_timeout_kills_worker_within_bound() {
    let fx = fake_renderer();
    let timeout = Duration::from_millis(300);
    let pool = WorkerPool::start(&config(&fx, 1, 300)).unwrap();
    let mut worker = pool.checkout().unwrap();

    let started = Instant::now();
    let err = pool.exchange(&mut worker, "HANG", timeout).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, RenderError::RenderTimeout { .. }), "{err}");
    assert!(!err.worker_reusable());
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_secs(2), "took {elapsed:?}");
    assert!(!worker.is_alive());

    pool.discard(worker);
    assert_eq!(pool.capacity(), 0);
    assert!(matches!(
        pool.checkout().err().unwrap(),
        RenderError::PoolExhausted { started: 1 }
    ));
}

#[test]
fn test_timed_out_worker_never_returned() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 2, 300)).unwrap();
    let err = pool.render("HANG").unwrap_err();
    assert!(matches!(err, RenderError::RenderTimeout { .. }), "{err}");

    let stats = pool.stats();
    assert_eq!(stats.live, 1);
    assert_eq!(stats.destroyed, 1);
    // The survivor keeps serving; the killed worker never comes back.
    for _ in 0..3 {
        let mut worker = pool.checkout().unwrap();
        assert!(worker.is_alive());
        pool.checkin(worker);
    }
    assert_eq!(pool.capacity(), 1);
}

#[test]
fn test_worker_exit_is_worker_exited() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let err = pool.render("EXIT now").unwrap_err();
    assert!(matches!(err, RenderError::WorkerExited { .. }), "{err}");
    assert_eq!(pool.capacity(), 0);
}

#[test]
fn test_exchange_on_dead_worker_is_worker_dead() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let mut worker = pool.checkout().unwrap();
    worker.kill();
    let err = pool
        .exchange(&mut worker, "# hi", Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, RenderError::WorkerDead { .. }), "{err}");
    // checkin drops a dead worker instead of returning it
    pool.checkin(worker);
    assert_eq!(pool.capacity(), 0);
    assert_eq!(pool.idle_count(), 0);
}

// --- pool lifecycle ---

#[test]
fn test_pool_start_launch_error() {
    let cfg = markpool::RendererConfig {
        executable: "/definitely/not/a/renderer".to_string(),
        pool_size: 2,
        preflight: None,
        ..Default::default()
    };
    let err = WorkerPool::start(&cfg).err().unwrap();
    assert!(matches!(err, RenderError::Launch { .. }), "{err}");
}

#[test]
fn test_blocked_checkout_fails_when_last_worker_destroyed() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let worker = pool.checkout().unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|| pool.checkout().err());
        thread::sleep(Duration::from_millis(100));
        pool.discard(worker);
        let err = waiter.join().unwrap();
        assert!(matches!(err, Some(RenderError::PoolExhausted { .. })));
    });
}

#[test]
fn test_blocked_checkout_gets_returned_worker() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 1, 5_000)).unwrap();
    let worker = pool.checkout().unwrap();
    let first_id = worker.id();

    thread::scope(|s| {
        let waiter = s.spawn(|| pool.checkout().map(|w| {
            let id = w.id();
            pool.checkin(w);
            id
        }));
        thread::sleep(Duration::from_millis(100));
        pool.checkin(worker);
        assert_eq!(waiter.join().unwrap().unwrap(), first_id);
    });
}

#[test]
fn test_shutdown_empties_pool() {
    let fx = fake_renderer();
    let pool = WorkerPool::start(&config(&fx, 3, 5_000)).unwrap();
    assert_eq!(pool.capacity(), 3);
    pool.shutdown();
    pool.shutdown();
    assert_eq!(pool.capacity(), 0);
    assert!(matches!(
        pool.checkout().err().unwrap(),
        RenderError::PoolExhausted { .. }
    ));
}
