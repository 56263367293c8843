//! Single-record inspection.
//!
//! Builds one record exactly as a full build would and prints it together
//! with its ranking breakdown. Used by `snipdex inspect <repo> <file>`.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::build::{valid_repositories, Collaborators};
use crate::config::Config;
use crate::models::RankedSnippet;
use crate::ranking::{rank_explained, RankingBreakdown};
use crate::snippet::{build_record, language_icons, RepositoryContext};

#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    pub record: RankedSnippet,
    pub ranking: RankingBreakdown,
}

/// Build `file_name` from the repository with slug `slug`.
pub async fn inspect_record(
    config: &Config,
    slug: &str,
    file_name: &str,
    collaborators: &Collaborators,
) -> Result<InspectResponse> {
    let (repos, errors) = valid_repositories(config);

    if let Some(error) = errors.iter().find(|e| e.repo() == slug) {
        bail!("{}", error);
    }
    let Some(repo) = repos.iter().find(|r| r.slug == slug) else {
        bail!("repository not found: {}", slug);
    };

    let ctx = RepositoryContext::new(
        Arc::new(repo.clone()),
        &config.site,
        Arc::new(language_icons(&repos)),
    )?;
    let now = Utc::now();
    let record = build_record(
        &ctx,
        file_name,
        collaborators.history.as_ref(),
        collaborators.compiler.as_ref(),
        now,
    )
    .await?;
    let ranking = rank_explained(&record.snippet, &record.history, repo, now);

    Ok(InspectResponse { record, ranking })
}

pub async fn run_inspect(config: &Config, slug: &str, file_name: &str, no_history: bool) -> Result<()> {
    let response = inspect_record(config, slug, file_name, &Collaborators::new(no_history)).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
