//! CLI command handler: a minimal host pipeline around [`Renderer`].
//!
//! Walk DIR for Markdown → start the pool → pre-render everything → resolve each page in
//! order, write its HTML and outline JSON → write the stylesheet → shut down.

use anyhow::{Context, Result};
use kdam::Animation;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, progress_callback,
};
use crate::engine::tools::{output_path_for, path_relative_to, should_render};
use crate::utils::config::STYLESHEET_CONTENTS;
use crate::utils::{Colors, MarkpoolToml, apply_file_to_config, load_markpool_toml, setup_logging};
use crate::{Document, Renderer, RendererConfig, register_stylesheet};

/// Effective settings after merging defaults, `.markpool.toml` and CLI flags (CLI wins).
struct RunSettings {
    config: RendererConfig,
    out_dir: PathBuf,
    exclude: Vec<String>,
    verbose: bool,
}

fn merge_settings(cli: &Cli, file: Option<&MarkpoolToml>) -> RunSettings {
    let mut config = RendererConfig::default();
    if let Some(file) = file {
        apply_file_to_config(file, &mut config);
    }
    if let Some(ref exe) = cli.executable {
        config.executable = exe.clone();
    }
    if let Some(ref runner) = cli.runner {
        config.runner = runner.clone();
    }
    if let Some(ref cfg) = cli.markdoc_config {
        config.renderer_config = Some(cfg.clone());
    }
    if let Some(ms) = cli.timeout {
        config.timeout_ms = ms;
    }
    if let Some(n) = cli.workers {
        config.pool_size = n;
    }
    if cli.no_preflight == Some(true) {
        config.preflight = None;
    }

    let out_dir = match (&cli.out, file.and_then(|f| f.out())) {
        (Some(out), _) => out.clone(),
        (None, Some(out)) => cli.dir.join(out),
        (None, None) => cli.out_dir(),
    };
    let mut exclude = file
        .and_then(|f| f.exclude())
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    exclude.extend(cli.exclude.iter().cloned());
    let verbose = cli
        .verbose
        .or_else(|| file.and_then(|f| f.verbose()))
        .unwrap_or(false);

    RunSettings {
        config,
        out_dir,
        exclude,
        verbose,
    }
}

/// Markdown files under `root`, sorted by path, with paths relative to `root`.
fn collect_documents(root: &Path, out_dir: &Path, exclude: &[String]) -> Result<Vec<Document>> {
    let out_rel = path_relative_to(out_dir, root);
    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = path_relative_to(entry.path(), root) else {
            continue;
        };
        if !should_render(&rel, out_rel.as_deref(), exclude) {
            continue;
        }
        let source = fs::read_to_string(entry.path())
            .with_context(|| format!("read {}", entry.path().display()))?;
        documents.push(Document::new(rel, source));
    }
    Ok(documents)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Resolve, outline and write every page in order. Returns the number of failed pages.
fn write_pages(renderer: &Renderer, documents: &mut [Document], out_dir: &Path) -> Result<usize> {
    let mut failed = 0;
    for doc in documents.iter_mut() {
        let html = match renderer.resolve(&doc.path, &doc.source) {
            Ok(html) => html,
            Err(e) => {
                error!("{}", e);
                failed += 1;
                continue;
            }
        };
        doc.outline = renderer.build_outline(&html);
        write_file(&output_path_for(out_dir, &doc.path, "html"), &html)?;
        let outline_json =
            serde_json::to_string_pretty(&doc.outline).context("serialize outline")?;
        write_file(&output_path_for(out_dir, &doc.path, "toc.json"), &outline_json)?;
        debug!(
            "{}: {} top-level headings",
            doc.path.display(),
            doc.outline.len()
        );
    }
    Ok(failed)
}

/// Run a full build of `cli.dir`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let file = load_markpool_toml(&cli.dir);
    let settings = merge_settings(cli, file.as_ref());
    setup_logging(settings.verbose);

    let mut documents = collect_documents(&cli.dir, &settings.out_dir, &settings.exclude)?;
    if documents.is_empty() {
        warn!("No Markdown files found under {}", cli.dir.display());
        return Ok(());
    }
    debug!("Found {} Markdown files", documents.len());

    let mut renderer = Renderer::start(settings.config).context("start renderer pool")?;

    let bar = settings.verbose.then(|| {
        create_progress_bar(ProgressBarConfig::new(
            documents.len(),
            "Rendering",
            Animation::Classic,
        ))
    });
    let on_done = progress_callback(&bar);
    renderer.prerender_all_with_progress(&documents, on_done.as_deref());
    if let Some(ref bar) = bar {
        finish_progress_bar(bar);
    }

    let result = write_pages(&renderer, &mut documents, &settings.out_dir);

    let mut assets = Vec::new();
    if register_stylesheet(&mut assets) {
        for asset in &assets {
            write_file(&settings.out_dir.join(asset), STYLESHEET_CONTENTS)?;
        }
    }
    let stats = renderer.pool().stats();
    renderer.shutdown();

    let failed = result?;
    info!(
        "{} | {} | {}",
        Colors::colorize(
            Colors::RENDERED,
            &format!("Rendered: {}", documents.len() - failed)
        ),
        Colors::colorize(Colors::FAILED, &format!("Failed: {}", failed)),
        Colors::colorize(
            Colors::LOST,
            &format!("Workers lost: {}", stats.destroyed)
        )
    );
    if failed > 0 {
        anyhow::bail!("{} of {} documents failed to render", failed, documents.len());
    }
    Ok(())
}
