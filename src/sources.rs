use anyhow::Result;

use crate::config::{Config, RepositoryKind};

/// Status of one configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub repository: String,
    pub kind: Option<RepositoryKind>,
    pub status: String,
    pub healthy: bool,
}

/// Statuses of every configured repository, as the build would see them.
///
/// Buildable repositories come first in file order, then rejected entries.
pub fn source_statuses(config: &Config) -> Vec<SourceStatus> {
    let (repos, errors) = config.validate_repositories();

    let valid = repos.into_iter().map(|repo| {
        let (status, healthy) = if !config.site.repository_dir(&repo).is_dir() {
            ("MISSING".to_string(), false)
        } else if repo.archived {
            ("ARCHIVED".to_string(), true)
        } else {
            ("OK".to_string(), true)
        };
        SourceStatus {
            repository: repo.slug,
            kind: Some(repo.kind),
            status,
            healthy,
        }
    });
    let invalid = errors.into_iter().map(|e| SourceStatus {
        repository: e.repo().to_string(),
        kind: None,
        status: format!("INVALID ({})", e.field()),
        healthy: false,
    });

    valid.chain(invalid).collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<10} {:<20} HEALTHY", "REPOSITORY", "KIND", "STATUS");
    for source in source_statuses(config) {
        let kind = match source.kind {
            Some(RepositoryKind::Snippets) => "snippets",
            Some(RepositoryKind::Css) => "css",
            Some(RepositoryKind::Blog) => "blog",
            None => "-",
        };
        println!(
            "{:<16} {:<10} {:<20} {}",
            source.repository, kind, source.status, source.healthy
        );
    }
    Ok(())
}
