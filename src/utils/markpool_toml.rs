//! Load `.markpool.toml` from the docs directory (CLI only). Library callers build a
//! `RendererConfig` themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::RendererConfig;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct MarkpoolToml {
    #[serde(default)]
    renderer: RendererSection,
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Default, Deserialize)]
struct RendererSection {
    executable: Option<String>,
    runner: Option<String>,
    markdoc_config: Option<String>,
    timeout_ms: Option<u64>,
    grace_ms: Option<u64>,
    workers: Option<usize>,
    preflight: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    out: Option<String>,
    exclude: Option<Vec<String>>,
    verbose: Option<bool>,
}

impl MarkpoolToml {
    pub fn out(&self) -> Option<PathBuf> {
        self.build.out.as_ref().map(PathBuf::from)
    }

    pub fn exclude(&self) -> Option<&[String]> {
        self.build.exclude.as_deref()
    }

    pub fn verbose(&self) -> Option<bool> {
        self.build.verbose
    }
}

/// Load the config file from `dir` if present. Returns None if missing or unparsable (logged).
pub fn load_markpool_toml(dir: &Path) -> Option<MarkpoolToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_markpool_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_markpool_toml(s: &str) -> Result<MarkpoolToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite config field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $config:expr, $field:ident => $config_field:ident) => {
        if let Some(v) = $section.$field {
            $config.$config_field = v;
        }
    };
}

/// Apply the file's renderer section to `config` (only fields present in the file).
/// Call before applying CLI flags.
pub fn apply_file_to_config(file: &MarkpoolToml, config: &mut RendererConfig) {
    let r = &file.renderer;
    if let Some(ref exe) = r.executable {
        config.executable = exe.clone();
    }
    if let Some(ref runner) = r.runner {
        config.runner = PathBuf::from(runner);
    }
    if let Some(ref cfg) = r.markdoc_config {
        config.renderer_config = Some(PathBuf::from(cfg));
    }
    apply_file_opt!(r, config, timeout_ms => timeout_ms);
    apply_file_opt!(r, config, grace_ms => grace_ms);
    apply_file_opt!(r, config, workers => pool_size);
    if r.preflight == Some(false) {
        config.preflight = None;
    }
}
