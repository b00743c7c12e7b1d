//! Shared fixtures: a fake renderer written as a POSIX shell script.
//!
//! The script answers one JSON line per request line. Markers in the document text pick
//! the behaviour: FAIL, HANG, EXIT, GARBAGE, EMPTY, WARN, SLOW; anything else succeeds.

#![allow(dead_code)]

use markpool::RendererConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const FAKE_RENDERER: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *FAIL*) printf '%s\n' '{"error":"bad document: FAIL marker"}' ;;
    *HANG*) exec sleep 30 ;;
    *EXIT*) exit 3 ;;
    *GARBAGE*) printf '%s\n' 'this is not json' ;;
    *EMPTY*) printf '%s\n' '{"html":"","warnings":[]}' ;;
    *WARN*) printf '%s\n' '{"html":"<p>w</p>","warnings":["first","second"]}' ;;
    *SLOW*) sleep 0.1; printf '%s\n' '{"html":"<p>slow</p>"}' ;;
    *) printf '%s\n' '{"html":"<h1 id=\"top\">Top</h1><h2 id=\"sub\">Sub</h2>","warnings":[]}' ;;
  esac
done
"#;

pub const OK_HTML: &str = r#"<h1 id="top">Top</h1><h2 id="sub">Sub</h2>"#;

pub struct Fixture {
    pub dir: TempDir,
    pub script: PathBuf,
}

pub fn fake_renderer() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake_runner.sh");
    fs::write(&script, FAKE_RENDERER).unwrap();
    Fixture { dir, script }
}

/// Config that runs `sh <script>` with `workers` workers and no preflight.
pub fn config(fixture: &Fixture, workers: usize, timeout_ms: u64) -> RendererConfig {
    RendererConfig {
        executable: "sh".to_string(),
        runner: fixture.script.clone(),
        renderer_config: None,
        timeout_ms,
        grace_ms: 200,
        pool_size: workers,
        preflight: None,
    }
}
