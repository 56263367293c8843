//! Version-control provenance for content files.
//!
//! Three independent queries are issued per file (first seen, last updated,
//! revision count). They run concurrently and the enricher waits for all of
//! them. A query that fails or finds no history resolves to "nothing" and
//! the corresponding field falls back to its empty value; enrichment itself
//! never fails.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::models::HistoryMeta;

/// Read-only history queries against a version-control system.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Time of the revision that introduced the file.
    async fn first_seen(&self, dir: &Path, file_name: &str) -> Option<DateTime<Utc>>;

    /// Time of the most recent revision touching the file.
    async fn last_updated(&self, dir: &Path, file_name: &str) -> Option<DateTime<Utc>>;

    /// Number of revisions touching the file.
    async fn update_count(&self, dir: &Path, file_name: &str) -> Option<u32>;
}

/// Run the three history queries for one file and compose the result.
pub async fn enrich(source: &dyn HistorySource, dir: &Path, file_name: &str) -> HistoryMeta {
    let (first_seen, last_updated, update_count) = tokio::join!(
        source.first_seen(dir, file_name),
        source.last_updated(dir, file_name),
        source.update_count(dir, file_name),
    );

    if first_seen.is_none() && last_updated.is_none() {
        tracing::debug!(file = file_name, "no version history, using empty provenance");
    }

    let empty = HistoryMeta::empty();
    HistoryMeta {
        first_seen: first_seen.unwrap_or(empty.first_seen),
        last_updated: last_updated.or(first_seen).unwrap_or(empty.last_updated),
        update_count: update_count.unwrap_or(0).max(empty.update_count),
    }
}

/// History backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitHistory {
    git: PathBuf,
}

impl GitHistory {
    pub fn new() -> Self {
        GitHistory {
            git: PathBuf::from("git"),
        }
    }

    async fn git_log(&self, dir: &Path, args: &[&str], file_name: &str) -> Option<String> {
        let output = Command::new(&self.git)
            .arg("log")
            .args(args)
            .arg("--")
            .arg(file_name)
            .current_dir(dir)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                tracing::debug!(
                    file = file_name,
                    "git log failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!(file = file_name, "could not run git: {}", e);
                None
            }
        }
    }
}

impl Default for GitHistory {
    fn default() -> Self {
        GitHistory::new()
    }
}

/// First line of `git log` output parsed as a unix timestamp.
fn parse_timestamp(stdout: &str) -> Option<DateTime<Utc>> {
    let secs = stdout.lines().next()?.trim().parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

#[async_trait]
impl HistorySource for GitHistory {
    async fn first_seen(&self, dir: &Path, file_name: &str) -> Option<DateTime<Utc>> {
        let stdout = self
            .git_log(dir, &["--diff-filter=A", "--pretty=format:%at"], file_name)
            .await?;
        parse_timestamp(&stdout)
    }

    async fn last_updated(&self, dir: &Path, file_name: &str) -> Option<DateTime<Utc>> {
        let stdout = self
            .git_log(dir, &["-n", "1", "--pretty=format:%at"], file_name)
            .await?;
        parse_timestamp(&stdout)
    }

    async fn update_count(&self, dir: &Path, file_name: &str) -> Option<u32> {
        let stdout = self.git_log(dir, &["--pretty=format:%H"], file_name).await?;
        let count = stdout.lines().filter(|l| !l.trim().is_empty()).count();
        if count == 0 {
            None
        } else {
            Some(count as u32)
        }
    }
}

/// A source with no history at all; every file gets empty provenance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

#[async_trait]
impl HistorySource for NoHistory {
    async fn first_seen(&self, _dir: &Path, _file_name: &str) -> Option<DateTime<Utc>> {
        None
    }

    async fn last_updated(&self, _dir: &Path, _file_name: &str) -> Option<DateTime<Utc>> {
        None
    }

    async fn update_count(&self, _dir: &Path, _file_name: &str) -> Option<u32> {
        None
    }
}

/// Fixed, in-memory history keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    entries: HashMap<String, HistoryMeta>,
}

impl StaticHistory {
    pub fn new() -> Self {
        StaticHistory::default()
    }

    pub fn with(mut self, file_name: &str, meta: HistoryMeta) -> Self {
        self.entries.insert(file_name.to_string(), meta);
        self
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn first_seen(&self, _dir: &Path, file_name: &str) -> Option<DateTime<Utc>> {
        self.entries.get(file_name).map(|m| m.first_seen)
    }

    async fn last_updated(&self, _dir: &Path, file_name: &str) -> Option<DateTime<Utc>> {
        self.entries.get(file_name).map(|m| m.last_updated)
    }

    async fn update_count(&self, _dir: &Path, file_name: &str) -> Option<u32> {
        self.entries.get(file_name).map(|m| m.update_count)
    }
}
