//! Per-record pipeline: read → extract → enrich → tokenize → rank.
//!
//! Every record is built independently from its own file and the shared,
//! read-only [`RepositoryContext`]; nothing here touches other records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::code_blocks::extract_code_blocks;
use crate::config::{RepositoryConfig, SiteConfig};
use crate::frontmatter::extract_raw_snippet;
use crate::history::{enrich, HistorySource};
use crate::models::{
    file_stem, Expertise, HistoryMeta, ParsedSnippet, RankedSnippet, RawSnippet, Tags,
};
use crate::ordered::OrderedSet;
use crate::ranking::rank;
use crate::rules::{fence_rules, text_rules, RuleSet};
use crate::source::read_source_file;
use crate::style::StyleCompiler;
use crate::text::{normalize_text, seo_slug};
use crate::tokenizer::search_tokens;

/// Icon of a language, used to decorate long-form records tagged with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageIcon {
    /// Display name, e.g. `Python`.
    pub language: String,
    pub icon: String,
}

/// Language icons of every code repository that declares both.
pub fn language_icons(repos: &[RepositoryConfig]) -> Vec<LanguageIcon> {
    repos
        .iter()
        .filter(|r| !r.is_blog())
        .filter_map(|r| {
            Some(LanguageIcon {
                language: r.language_name()?.to_string(),
                icon: r.icon.clone()?,
            })
        })
        .collect()
}

/// Everything a record needs from its repository, compiled once per build.
#[derive(Debug, Clone)]
pub struct RepositoryContext {
    pub repo: Arc<RepositoryConfig>,
    /// Directory holding the repository's content files.
    pub dir: PathBuf,
    text_rules: RuleSet,
    fence_rules: RuleSet,
    language_icons: Arc<Vec<LanguageIcon>>,
}

impl RepositoryContext {
    pub fn new(
        repo: Arc<RepositoryConfig>,
        site: &SiteConfig,
        language_icons: Arc<Vec<LanguageIcon>>,
    ) -> Result<Self> {
        Ok(RepositoryContext {
            dir: site.repository_dir(&repo),
            text_rules: text_rules()?,
            fence_rules: fence_rules(&repo.fence_markers())?,
            language_icons,
            repo,
        })
    }

    /// Icon for a record: for long-form records the icon of the first
    /// language named among its tags, otherwise the repository icon.
    pub fn icon_for(&self, tags: &Tags) -> Option<String> {
        if self.repo.is_blog() {
            let tagged = self
                .language_icons
                .iter()
                .find(|l| tags.contains_ignore_case(&l.language));
            if let Some(lang) = tagged {
                return Some(lang.icon.clone());
            }
        }
        self.repo.icon.clone()
    }
}

/// Turn a raw file into a fully parsed record.
pub fn parse_snippet(
    raw: &RawSnippet,
    ctx: &RepositoryContext,
    compiler: &dyn StyleCompiler,
) -> ParsedSnippet {
    let repo = &ctx.repo;
    let stem = raw.stem();

    let title = match raw.metadata.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => {
            tracing::warn!(file = %raw.file_name, "missing title, using file name");
            stem.to_string()
        }
    };

    let tags = Tags::parse(&raw.metadata.tags);
    let text = normalize_text(raw, repo, &ctx.text_rules);
    let code = extract_code_blocks(&raw.body, repo, &ctx.fence_rules, compiler, stem);
    let tokens = search_tokens(repo, &title, &tags, &text.short);

    let (record_type, expertise, cover, authors) = if repo.is_blog() {
        let record_type = match raw.metadata.post_type.as_deref() {
            Some(post_type) => format!("blog.{}", post_type),
            None => "blog".to_string(),
        };
        let authors = raw
            .metadata
            .authors
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect::<OrderedSet<_>>()
            .into_vec();
        (
            record_type,
            Some(Expertise::Blog),
            raw.metadata.cover.clone(),
            authors,
        )
    } else {
        ("snippet".to_string(), Expertise::from_tags(&tags), None, Vec::new())
    };

    ParsedSnippet {
        id: format!("{}/{}", repo.source_dir(), stem),
        file_name: raw.file_name.clone(),
        title,
        record_type,
        tags,
        code,
        text,
        expertise,
        cover,
        authors,
        search_tokens: tokens,
    }
}

/// Attach history, ranking and repository-derived fields.
pub fn rank_snippet(
    snippet: ParsedSnippet,
    history: HistoryMeta,
    ctx: &RepositoryContext,
    now: DateTime<Utc>,
) -> RankedSnippet {
    let repo = &ctx.repo;
    let ranking = rank(&snippet, &history, repo, now);

    RankedSnippet {
        slug: format!(
            "{}/{}",
            repo.slug_prefix(),
            seo_slug(file_stem(&snippet.file_name))
        ),
        url: format!("{}/{}", repo.repo_url_prefix(), snippet.file_name),
        icon: ctx.icon_for(&snippet.tags),
        repository: repo.slug.clone(),
        language: repo.language.clone(),
        ranking,
        history,
        snippet,
    }
}

/// Build one record from its file.
///
/// Reading the file and querying its history run concurrently. A file that
/// cannot be read is an error; everything else degrades to defaults.
pub async fn build_record(
    ctx: &RepositoryContext,
    file_name: &str,
    history: &dyn HistorySource,
    compiler: &dyn StyleCompiler,
    now: DateTime<Utc>,
) -> Result<RankedSnippet> {
    let (file, meta) = tokio::join!(
        read_source_file(&ctx.dir, file_name),
        enrich(history, &ctx.dir, file_name),
    );
    let file = file?;

    let raw = extract_raw_snippet(&file.file_name, &file.content);
    let parsed = parse_snippet(&raw, ctx, compiler);
    Ok(rank_snippet(parsed, meta, ctx, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, RepositoryEntry, RepositoryKind};
    use crate::history::{NoHistory, StaticHistory};
    use crate::models::CodeBlocks;
    use crate::style::ScopeCompiler;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn site(root: &std::path::Path) -> SiteConfig {
        SiteConfig {
            content_root: root.to_path_buf(),
            out_dir: root.join("out"),
            cards_per_page: 40,
            concurrency: 4,
            include_globs: vec!["*.md".to_string()],
        }
    }

    fn python() -> RepositoryConfig {
        let mut entry = RepositoryEntry {
            name: Some("30 seconds of Python".to_string()),
            dir_name: Some("30python".to_string()),
            snippet_path: Some("snippets".to_string()),
            repo_url: Some("https://github.com/30-seconds/30-seconds-of-python".to_string()),
            slug: Some("python".to_string()),
            icon: Some("py".to_string()),
            language: Some(Language {
                short: "py".to_string(),
                long: "Python".to_string(),
            }),
            ..Default::default()
        };
        entry.tag_scores.insert("list".to_string(), 4.0);
        entry.validate(0).unwrap()
    }

    fn blog() -> RepositoryConfig {
        RepositoryEntry {
            name: Some("30 seconds Blog".to_string()),
            dir_name: Some("30blog".to_string()),
            snippet_path: Some("blog_posts".to_string()),
            repo_url: Some("https://github.com/30-seconds/30-seconds-blog".to_string()),
            slug: Some("blog".to_string()),
            kind: RepositoryKind::Blog,
            icon: Some("blog".to_string()),
            ..Default::default()
        }
        .validate(1)
        .unwrap()
    }

    fn context(repo: RepositoryConfig, root: &std::path::Path) -> RepositoryContext {
        let icons = Arc::new(language_icons(&[python(), blog()]));
        RepositoryContext::new(Arc::new(repo), &site(root), icons).unwrap()
    }

    const ALL_EQUAL: &str = "---\ntitle: all_equal\ntags: list,beginner\n---\n\nChecks if all elements in a list are equal.\n\n- Use `set()`.\n\n```py\ndef all_equal(lst):\n  return len(set(lst)) == 1\n```\n\n```py\nall_equal([1, 1]) # True\n```\n";

    #[test]
    fn test_parse_snippet_record() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(python(), tmp.path());
        let raw = extract_raw_snippet("all_equal.md", ALL_EQUAL);
        let parsed = parse_snippet(&raw, &ctx, &ScopeCompiler);

        assert_eq!(parsed.id, "30python/snippets/all_equal");
        assert_eq!(parsed.title, "all_equal");
        assert_eq!(parsed.record_type, "snippet");
        assert_eq!(parsed.expertise, Some(Expertise::Beginner));
        assert_eq!(parsed.tags.primary.as_deref(), Some("list"));
        assert_eq!(parsed.text.short, "Checks if all elements in a list are equal.");
        assert_eq!(
            parsed.search_tokens,
            "all_equal py python list checks elements equal"
        );
        let CodeBlocks::Standard { src, example, style } = &parsed.code else {
            panic!("expected standard layout");
        };
        assert_eq!(src, "def all_equal(lst):\n  return len(set(lst)) == 1");
        assert_eq!(example, "all_equal([1, 1]) # True");
        assert_eq!(style, &None);
    }

    #[test]
    fn test_ranked_record_links() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(python(), tmp.path());
        let raw = extract_raw_snippet("all_equal.md", ALL_EQUAL);
        let ranked = rank_snippet(
            parse_snippet(&raw, &ctx, &ScopeCompiler),
            HistoryMeta::empty(),
            &ctx,
            now(),
        );

        assert_eq!(ranked.slug, "/python/s/all-equal");
        assert_eq!(
            ranked.url,
            "https://github.com/30-seconds/30-seconds-of-python/blob/master/snippets/all_equal.md"
        );
        assert_eq!(ranked.icon.as_deref(), Some("py"));
        assert_eq!(ranked.repository, "python");
        assert!(ranked.ranking >= 4.0);
    }

    #[test]
    fn test_long_form_record() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(blog(), tmp.path());
        let raw = extract_raw_snippet(
            "python-tips.md",
            "---\ntitle: Python tips\ntype: list\ntags: python,list,intermediate\nauthors: chalarangelo,maciv,chalarangelo\ncover: blog_images/tips.jpg\n---\n\nA few tips.\n\n```py\nx = 1\n```\n",
        );
        let parsed = parse_snippet(&raw, &ctx, &ScopeCompiler);

        assert_eq!(parsed.record_type, "blog.list");
        assert!(parsed.is_long_form());
        assert_eq!(parsed.expertise, Some(Expertise::Blog));
        assert_eq!(parsed.code, CodeBlocks::None);
        assert_eq!(parsed.authors, vec!["chalarangelo", "maciv"]);
        assert_eq!(parsed.cover.as_deref(), Some("blog_images/tips.jpg"));
        assert_eq!(parsed.text.short, "A few tips....");
        assert!(parsed.text.full.contains("```py"));
        assert_eq!(ctx.icon_for(&parsed.tags).as_deref(), Some("py"));
    }

    #[test]
    fn test_missing_header_still_builds_record() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(python(), tmp.path());
        let raw = extract_raw_snippet("bare.md", "No header here.\n");
        let parsed = parse_snippet(&raw, &ctx, &ScopeCompiler);
        assert_eq!(parsed.title, "bare");
        assert!(parsed.tags.all.is_empty());
        assert_eq!(parsed.expertise, None);
        assert!(!parsed.code.has("src"));
    }

    #[tokio::test]
    async fn test_build_record_from_disk() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("30python").join("snippets");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("all_equal.md"), ALL_EQUAL).unwrap();

        let ctx = context(python(), tmp.path());
        let meta = HistoryMeta {
            first_seen: Utc.timestamp_opt(1_500_000_000, 0).unwrap(),
            last_updated: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            update_count: 4,
        };
        let history = StaticHistory::new().with("all_equal.md", meta);
        let record = build_record(&ctx, "all_equal.md", &history, &ScopeCompiler, now())
            .await
            .unwrap();
        assert_eq!(record.history, meta);
        assert_eq!(record.title(), "all_equal");

        let missing = build_record(&ctx, "nope.md", &NoHistory, &ScopeCompiler, now()).await;
        assert!(missing.is_err());
    }
}
