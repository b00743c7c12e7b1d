//! Application configuration constants.
//! Defaults and tuning in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    output_dirname: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                output_dirname: "site".to_string(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file read by the CLI (e.g. `.markpool.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Default output directory name, relative to the docs directory.
    pub fn output_dirname(&self) -> &str {
        &self.output_dirname
    }
}

// ---- Renderer defaults ----

/// Defaults for [`RendererConfig`](crate::RendererConfig).
pub struct RendererDefaults;

impl RendererDefaults {
    pub const EXECUTABLE: &'static str = "node";
    pub const RUNNER: &'static str = "markdoc_runner.js";
    /// Per-exchange response timeout.
    pub const TIMEOUT_MS: u64 = 30_000;
    /// Time a worker gets to exit on its own after stdin closes at shutdown.
    pub const GRACE_MS: u64 = 2_000;
    /// 0 = one worker per available thread.
    pub const POOL_SIZE: usize = 0;
    /// Inline script passed after `-e` to check the renderer library is importable.
    pub const PREFLIGHT_SCRIPT: &'static str =
        "require('@markdoc/markdoc'); process.stdout.write('ok');";
    /// Upper bound on how long the preflight check may run.
    pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);
}

// ---- Workers ----

pub struct WorkerConsts;

impl WorkerConsts {
    /// How often `terminate` polls for a natural exit during the grace period.
    pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Extra time allowed to collect a preflight child's output after it exits.
    pub const OUTPUT_DRAIN: Duration = Duration::from_millis(200);
}

// ---- Site assets ----

/// Stylesheet path appended to the host's asset list.
pub const STYLESHEET_PATH: &str = "css/markdoc.css";

/// Bundled stylesheet written by the CLI next to the rendered pages.
pub const STYLESHEET_CONTENTS: &str = include_str!("../../assets/markdoc.css");
