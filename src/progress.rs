//! Build progress reporting.
//!
//! Reports what `snipdex build` is doing (listing repositories, processing
//! records, assembling listings) so long builds are observable. Progress is
//! emitted on **stderr** so stdout stays parseable for scripts.

use std::io::Write;

/// A single progress event for a build.
#[derive(Clone, Debug)]
pub enum BuildProgressEvent {
    /// Listing the content files of a repository.
    Reading { repository: String },
    /// `n` records built out of `total`.
    Processing { n: u64, total: u64 },
    /// Building listing pages from `records` records.
    Assembling { records: u64 },
    /// Writing outputs.
    Writing { pages: u64 },
}

/// Reports build progress. Implementations write to stderr (human or JSON).
pub trait BuildProgressReporter: Send + Sync {
    fn report(&self, event: BuildProgressEvent);
}

/// Human-friendly progress on stderr: "build  processing  1,234 / 5,000 records".
pub struct StderrProgress;

impl BuildProgressReporter for StderrProgress {
    fn report(&self, event: BuildProgressEvent) {
        let line = match &event {
            BuildProgressEvent::Reading { repository } => {
                format!("build {}  reading...\n", repository)
            }
            BuildProgressEvent::Processing { n, total } => format!(
                "build  processing  {} / {} records\n",
                format_number(*n),
                format_number(*total)
            ),
            BuildProgressEvent::Assembling { records } => {
                format!("build  assembling listings from {} records\n", format_number(*records))
            }
            BuildProgressEvent::Writing { pages } => {
                format!("build  writing {} pages\n", format_number(*pages))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BuildProgressReporter for JsonProgress {
    fn report(&self, event: BuildProgressEvent) {
        let obj = match &event {
            BuildProgressEvent::Reading { repository } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "repository": repository
            }),
            BuildProgressEvent::Processing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "processing",
                "n": n,
                "total": total
            }),
            BuildProgressEvent::Assembling { records } => serde_json::json!({
                "event": "progress",
                "phase": "assembling",
                "records": records
            }),
            BuildProgressEvent::Writing { pages } => serde_json::json!({
                "event": "progress",
                "phase": "writing",
                "pages": pages
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BuildProgressReporter for NoProgress {
    fn report(&self, _event: BuildProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn BuildProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
