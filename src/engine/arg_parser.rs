use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::PackagePaths;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Render a directory of Markdown files through a pool of external Markdoc processes.
#[derive(Clone, Parser)]
#[command(name = "markpool")]
#[command(about = "Render Markdown with a pool of Markdoc workers; writes HTML and outline JSON.")]
pub struct Cli {
    /// Directory containing Markdown sources. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Output directory. Default: `site` in DIR.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Renderer executable (name on PATH or full path). Default: node.
    #[arg(long, short = 'n')]
    pub executable: Option<String>,

    /// Runner script handed to the executable.
    #[arg(long, short)]
    pub runner: Option<PathBuf>,

    /// Renderer config file, passed to the runner as `--config <path>`.
    #[arg(long, short = 'c')]
    pub markdoc_config: Option<PathBuf>,

    /// Milliseconds a worker may take per document before it is killed.
    #[arg(long, short = 't', value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Number of renderer workers. 0 = one per available thread.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Skip the "renderer library is importable" check.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub no_preflight: Option<bool>,

    /// Exclude patterns (glob syntax, `*` and `?`). Can specify multiple: -e drafts '*.tmp.md'
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Verbose output (debug logs and a progress bar).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// Output directory, defaulting to the package output dir inside DIR.
    pub fn out_dir(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| self.dir.join(PackagePaths::get().output_dirname()))
    }
}
