//! Whole-corpus build orchestration.
//!
//! Validates repositories, fans every content file out to its own task
//! (bounded by `site.concurrency`), converges the results into one corpus
//! in global popularity order, assembles listings, and writes the outputs.
//!
//! A repository with a configuration error is skipped and the rest of the
//! build proceeds; the command still fails at the end so the problem is not
//! missed. An unreadable content directory or file aborts the build.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Config, ConfigError, RepositoryConfig};
use crate::export;
use crate::history::{GitHistory, HistorySource, NoHistory};
use crate::listing::{assemble_listings, by_popularity};
use crate::models::RankedSnippet;
use crate::progress::{BuildProgressEvent, BuildProgressReporter, ProgressMode};
use crate::snippet::{build_record, language_icons, RepositoryContext};
use crate::source::list_content_files;
use crate::style::{ScopeCompiler, StyleCompiler};

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Count records and pages without writing anything.
    pub dry_run: bool,
    /// Skip version-control queries; every record gets empty history.
    pub no_history: bool,
    pub progress: ProgressMode,
}

/// Collaborators shared by every record task.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistorySource>,
    pub compiler: Arc<dyn StyleCompiler>,
}

impl Collaborators {
    pub fn new(no_history: bool) -> Self {
        let history: Arc<dyn HistorySource> = if no_history {
            Arc::new(NoHistory)
        } else {
            Arc::new(GitHistory::new())
        };
        Collaborators {
            history,
            compiler: Arc::new(ScopeCompiler),
        }
    }
}

/// Validate repositories, logging every rejected entry.
pub fn valid_repositories(config: &Config) -> (Vec<RepositoryConfig>, Vec<ConfigError>) {
    let (repos, errors) = config.validate_repositories();
    for error in &errors {
        tracing::error!(repository = error.repo(), field = error.field(), "{}", error);
    }
    (repos, errors)
}

/// Build every record of `repos`, in global popularity order.
///
/// Ties in ranking keep repository order, then file order.
pub async fn build_corpus(
    config: &Config,
    repos: &[RepositoryConfig],
    collaborators: &Collaborators,
    reporter: &dyn BuildProgressReporter,
    now: DateTime<Utc>,
) -> Result<Vec<RankedSnippet>> {
    let icons = Arc::new(language_icons(repos));

    let mut jobs: Vec<(Arc<RepositoryContext>, String)> = Vec::new();
    for repo in repos {
        reporter.report(BuildProgressEvent::Reading {
            repository: repo.slug.clone(),
        });
        let ctx = Arc::new(RepositoryContext::new(
            Arc::new(repo.clone()),
            &config.site,
            icons.clone(),
        )?);
        let files = list_content_files(&ctx.dir, &config.site.include_globs)
            .with_context(|| format!("Failed to list repository '{}'", repo.slug))?;
        tracing::debug!(repository = %repo.slug, files = files.len(), "listed content files");
        jobs.extend(files.into_iter().map(|f| (ctx.clone(), f)));
    }

    let total = jobs.len();
    let semaphore = Arc::new(Semaphore::new(config.site.concurrency));
    let mut tasks = JoinSet::new();

    for (index, (ctx, file_name)) in jobs.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let collaborators = collaborators.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let record = build_record(
                &ctx,
                &file_name,
                collaborators.history.as_ref(),
                collaborators.compiler.as_ref(),
                now,
            )
            .await;
            (index, record)
        });
    }

    let mut slots: Vec<Option<RankedSnippet>> = vec![None; total];
    let mut done = 0u64;
    while let Some(joined) = tasks.join_next().await {
        let (index, record) = joined.context("Record task failed")?;
        slots[index] = Some(record?);
        done += 1;
        reporter.report(BuildProgressEvent::Processing {
            n: done,
            total: total as u64,
        });
    }

    let mut corpus: Vec<RankedSnippet> = slots.into_iter().flatten().collect();
    corpus.sort_by(by_popularity);
    Ok(corpus)
}

pub async fn run_build(config: &Config, opts: BuildOptions) -> Result<()> {
    let reporter = opts.progress.reporter();
    let (repos, errors) = valid_repositories(config);
    let collaborators = Collaborators::new(opts.no_history);
    let now = Utc::now();

    let corpus = build_corpus(config, &repos, &collaborators, reporter.as_ref(), now).await?;

    reporter.report(BuildProgressEvent::Assembling {
        records: corpus.len() as u64,
    });
    let pages = assemble_listings(&corpus, &repos, config.site.cards_per_page);

    if opts.dry_run {
        println!("build (dry-run)");
    } else {
        reporter.report(BuildProgressEvent::Writing {
            pages: pages.len() as u64,
        });
        export::write_outputs(&config.site.out_dir, &corpus, &pages)?;
        println!("build");
    }
    println!("  repositories: {}", repos.len());
    println!("  records: {}", corpus.len());
    println!("  pages: {}", pages.len());
    println!("  skipped repositories: {}", errors.len());
    if !opts.dry_run {
        println!("  output: {}", config.site.out_dir.display());
    }

    if !errors.is_empty() {
        let skipped = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        bail!("{} repositories skipped: {}", errors.len(), skipped);
    }

    println!("ok");
    Ok(())
}
