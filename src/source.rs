//! Source reader: lists and loads the content files of one repository.
//!
//! Only the top level of the repository's snippet directory is read. File
//! names are ordered case-insensitively (exact name as tiebreak) so every
//! build sees the same file order.

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A content file loaded from disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub path: PathBuf,
    pub content: String,
}

/// List content file names in `dir` matching `include_globs` (case-insensitively).
pub fn list_content_files(dir: &Path, include_globs: &[String]) -> Result<Vec<String>> {
    if !dir.is_dir() {
        bail!("Content directory does not exist: {}", dir.display());
    }

    let include_set = build_globset(include_globs)?;
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to list content directory: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !include_set.is_match(&name) {
            continue;
        }
        names.push(name);
    }

    sort_case_insensitive(&mut names);
    Ok(names)
}

/// Sort file names by lowercase name, then by exact name.
pub fn sort_case_insensitive(names: &mut [String]) {
    names.sort_by_cached_key(|n| (n.to_lowercase(), n.clone()));
}

/// Read one content file as UTF-8.
///
/// Invalid byte sequences are replaced with U+FFFD and logged; only I/O
/// failures are errors.
pub async fn read_source_file(dir: &Path, file_name: &str) -> Result<SourceFile> {
    let path = dir.join(file_name);
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read content file: {}", path.display()))?;

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                file = file_name,
                "content file is not valid UTF-8, invalid bytes replaced"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    Ok(SourceFile {
        file_name: file_name.to_string(),
        path,
        content,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid glob: {}", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
