//! TOML configuration parsing and validation.
//!
//! The file has one `[site]` table and any number of `[[repositories]]`
//! entries. Site-level problems abort the whole build. Repository entries
//! are deserialized leniently and validated one by one into immutable
//! [`RepositoryConfig`] values, so a broken entry only takes its own
//! repository out of the build.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory holding one checkout per repository (`<dir_name>/`).
    pub content_root: PathBuf,
    /// Directory receiving `index.json` and `pages/`.
    pub out_dir: PathBuf,
    #[serde(default = "default_cards_per_page")]
    pub cards_per_page: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_cards_per_page() -> usize {
    40
}
fn default_concurrency() -> usize {
    16
}
fn default_include_globs() -> Vec<String> {
    vec!["*.md".to_string()]
}

impl SiteConfig {
    /// Directory holding the content files of `repo`.
    pub fn repository_dir(&self, repo: &RepositoryConfig) -> PathBuf {
        self.content_root.join(repo.source_dir())
    }
}

/// A language marker pair: the fence tag (`short`) and the display name (`long`).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Language {
    pub short: String,
    pub long: String,
}

/// Shape of the content held by a repository.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Code snippets: `src` + `example`, plus `style` with an optional language.
    #[default]
    Snippets,
    /// Markup/style/script triples with a scoped style sheet.
    Css,
    /// Long-form posts without code roles.
    Blog,
}

/// A repository entry exactly as written in the file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RepositoryEntry {
    pub name: Option<String>,
    pub dir_name: Option<String>,
    pub snippet_path: Option<String>,
    pub repo_url: Option<String>,
    pub slug: Option<String>,
    #[serde(default)]
    pub kind: RepositoryKind,
    pub language: Option<Language>,
    pub second_language: Option<Language>,
    pub optional_language: Option<Language>,
    #[serde(default)]
    pub featured: u32,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub unlisted: bool,
    pub icon: Option<String>,
    pub bias_penalty_multiplier: Option<f64>,
    #[serde(default)]
    pub tag_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub keyword_scores: BTreeMap<String, f64>,
}

/// Validated, immutable per-repository configuration.
///
/// Shared by reference (`Arc`) across every record built from the repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub dir_name: String,
    pub snippet_path: String,
    pub repo_url: String,
    pub slug: String,
    pub kind: RepositoryKind,
    pub language: Option<Language>,
    pub second_language: Option<Language>,
    pub optional_language: Option<Language>,
    pub featured: u32,
    pub archived: bool,
    pub unlisted: bool,
    pub icon: Option<String>,
    pub bias_penalty_multiplier: f64,
    pub tag_scores: BTreeMap<String, f64>,
    /// Keys are lowercase.
    pub keyword_scores: BTreeMap<String, f64>,
}

/// A repository entry that cannot be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("repository '{repo}': missing required field `{field}`")]
    MissingField { repo: String, field: &'static str },

    #[error("repository '{repo}': invalid `{field}`: {reason}")]
    InvalidField {
        repo: String,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn repo(&self) -> &str {
        match self {
            ConfigError::MissingField { repo, .. } | ConfigError::InvalidField { repo, .. } => repo,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::MissingField { field, .. } | ConfigError::InvalidField { field, .. } => {
                field
            }
        }
    }
}

impl RepositoryEntry {
    /// Best available human label for diagnostics.
    pub fn label(&self, index: usize) -> String {
        self.slug
            .clone()
            .or_else(|| self.dir_name.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("#{}", index))
    }

    pub fn validate(&self, index: usize) -> std::result::Result<RepositoryConfig, ConfigError> {
        let repo = self.label(index);
        let required = |value: &Option<String>, field: &'static str| {
            value
                .as_ref()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingField {
                    repo: repo.clone(),
                    field,
                })
        };

        let name = required(&self.name, "name")?;
        let dir_name = required(&self.dir_name, "dir_name")?;
        let snippet_path = required(&self.snippet_path, "snippet_path")?;
        let repo_url = required(&self.repo_url, "repo_url")?;
        let slug = required(&self.slug, "slug")?;

        if self.kind != RepositoryKind::Blog && self.language.is_none() {
            return Err(ConfigError::MissingField {
                repo,
                field: "language",
            });
        }

        let bias_penalty_multiplier = self.bias_penalty_multiplier.unwrap_or(1.0);
        if !bias_penalty_multiplier.is_finite() || bias_penalty_multiplier < 1.0 {
            return Err(ConfigError::InvalidField {
                repo,
                field: "bias_penalty_multiplier",
                reason: format!("must be a finite number >= 1.0, got {}", bias_penalty_multiplier),
            });
        }

        for (field, scores) in [
            ("tag_scores", &self.tag_scores),
            ("keyword_scores", &self.keyword_scores),
        ] {
            if let Some((key, weight)) = scores
                .iter()
                .find(|(_, w)| !w.is_finite() || **w < 0.0)
            {
                return Err(ConfigError::InvalidField {
                    repo,
                    field,
                    reason: format!("weight for '{}' must be non-negative, got {}", key, weight),
                });
            }
        }

        Ok(RepositoryConfig {
            name,
            dir_name,
            snippet_path,
            repo_url: repo_url.trim_end_matches('/').to_string(),
            slug: slug.trim_matches('/').to_string(),
            kind: self.kind,
            language: self.language.clone(),
            second_language: self.second_language.clone(),
            optional_language: self.optional_language.clone(),
            featured: self.featured,
            archived: self.archived,
            unlisted: self.unlisted,
            icon: self.icon.clone(),
            bias_penalty_multiplier,
            tag_scores: self.tag_scores.clone(),
            keyword_scores: self
                .keyword_scores
                .iter()
                .map(|(k, w)| (k.to_lowercase(), *w))
                .collect(),
        })
    }
}

impl RepositoryConfig {
    /// `<dir_name>/<snippet_path>`, also the prefix of every record id.
    pub fn source_dir(&self) -> String {
        format!("{}/{}", self.dir_name, self.snippet_path)
    }

    /// Listing base URL, e.g. `/python`.
    pub fn listing_url(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Prefix of record slugs, e.g. `/python/s`.
    pub fn slug_prefix(&self) -> String {
        format!("/{}/s", self.slug)
    }

    pub fn repo_url_prefix(&self) -> String {
        format!("{}/blob/master/{}", self.repo_url, self.snippet_path)
    }

    pub fn is_blog(&self) -> bool {
        self.kind == RepositoryKind::Blog
    }

    /// True for snippet repositories that declare an optional style language.
    pub fn has_optional_language(&self) -> bool {
        self.kind == RepositoryKind::Snippets
            && self
                .optional_language
                .as_ref()
                .is_some_and(|l| !l.short.is_empty())
    }

    /// Display name of the repository language (`Python`), if any.
    pub fn language_name(&self) -> Option<&str> {
        self.language.as_ref().map(|l| l.long.as_str())
    }

    /// Fence language tags whose annotation is stripped from code blocks.
    pub fn fence_markers(&self) -> Vec<&str> {
        let mut markers = Vec::new();
        match self.kind {
            RepositoryKind::Blog => {}
            RepositoryKind::Snippets => {
                markers.extend(self.language.as_ref().map(|l| l.short.as_str()));
                if self.has_optional_language() {
                    markers.extend(self.optional_language.as_ref().map(|l| l.short.as_str()));
                }
            }
            RepositoryKind::Css => {
                for lang in [
                    &self.language,
                    &self.second_language,
                    &self.optional_language,
                ] {
                    markers.extend(lang.as_ref().map(|l| l.short.as_str()));
                }
            }
        }
        markers.retain(|m| !m.is_empty());
        markers
    }
}

impl Config {
    /// Validate every repository entry.
    ///
    /// Returns the buildable repositories in file order, plus one error per
    /// entry that was rejected. Slugs must be unique across valid entries.
    pub fn validate_repositories(&self) -> (Vec<RepositoryConfig>, Vec<ConfigError>) {
        let mut valid = Vec::new();
        let mut errors = Vec::new();
        let mut seen_slugs = HashSet::new();

        for (i, entry) in self.repositories.iter().enumerate() {
            match entry.validate(i) {
                Ok(repo) => {
                    if !seen_slugs.insert(repo.slug.clone()) {
                        errors.push(ConfigError::InvalidField {
                            reason: format!("duplicate slug '{}'", repo.slug),
                            repo: repo.slug,
                            field: "slug",
                        });
                        continue;
                    }
                    valid.push(repo);
                }
                Err(e) => errors.push(e),
            }
        }

        (valid, errors)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.site.cards_per_page == 0 {
        bail!("site.cards_per_page must be > 0");
    }

    if config.site.concurrency == 0 {
        bail!("site.concurrency must be > 0");
    }

    if config.site.include_globs.is_empty() {
        bail!("site.include_globs must list at least one pattern");
    }

    Ok(config)
}
