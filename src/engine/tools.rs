//! Path and filter utilities for the CLI host

use std::path::{Path, PathBuf};

/// File extensions treated as Markdown sources.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdoc"];

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

/// True if `path` (relative to the docs root) should be rendered: a Markdown file, not
/// under the output directory, not matching any exclude pattern by name or by path.
pub fn should_render(path: &Path, out_dir_rel: Option<&Path>, exclude_patterns: &[String]) -> bool {
    if !is_markdown(path) {
        return false;
    }
    if let Some(out) = out_dir_rel
        && path.starts_with(out)
    {
        return false;
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let path_str = path.to_string_lossy().replace('\\', "/");
    !exclude_patterns
        .iter()
        .any(|p| glob_match(p, name) || glob_match(p, &path_str))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| glob_match_chars(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && glob_match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match_chars(rest, &text[1..]),
    }
}

/// Output file for a source path: same relative location, extension replaced.
/// `guide/intro.md` + `html` → `<out>/guide/intro.html`.
pub fn output_path_for(out_dir: &Path, rel_source: &Path, extension: &str) -> PathBuf {
    out_dir.join(rel_source).with_extension(extension)
}
