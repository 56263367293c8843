//! Core data models used throughout snipdex.
//!
//! These types represent the records that flow through the per-file
//! pipeline (read → parse → enrich → tokenize → rank) and end up in the
//! corpus-wide index consumed by the listing assembler.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Language;
use crate::frontmatter::SnippetMetadata;
use crate::ordered::OrderedSet;

/// One content file split into its metadata header and body.
#[derive(Debug, Clone)]
pub struct RawSnippet {
    pub file_name: String,
    pub metadata: SnippetMetadata,
    pub body: String,
}

impl RawSnippet {
    /// File name without its extension, e.g. `all_equal` for `all_equal.md`.
    pub fn stem(&self) -> &str {
        file_stem(&self.file_name)
    }
}

/// File name without its extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

/// Declared tags, unique, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags {
    pub all: Vec<String>,
    pub primary: Option<String>,
}

impl Tags {
    /// Parse a comma-separated tag string. Blank entries are dropped.
    pub fn parse(tag_str: &str) -> Self {
        let all = tag_str
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<OrderedSet<_>>()
            .into_vec();
        let primary = all.first().cloned();
        Tags { all, primary }
    }

    pub fn contains_ignore_case(&self, tag: &str) -> bool {
        self.all.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Tags that are searchable, i.e. not an expertise level.
    pub fn without_expertise(&self) -> impl Iterator<Item = &str> {
        self.all
            .iter()
            .map(String::as_str)
            .filter(|t| Expertise::from_tag(t).is_none())
    }
}

/// Fixed difficulty scale, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expertise {
    Beginner,
    Intermediate,
    Advanced,
    Blog,
}

impl Expertise {
    /// Level named by a tag. `blog` is never a tag-derived level.
    pub fn from_tag(tag: &str) -> Option<Expertise> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Expertise::Beginner),
            "intermediate" => Some(Expertise::Intermediate),
            "advanced" => Some(Expertise::Advanced),
            _ => None,
        }
    }

    /// First expertise level among `tags`.
    pub fn from_tags(tags: &Tags) -> Option<Expertise> {
        tags.all.iter().find_map(|t| Expertise::from_tag(t))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Expertise::Beginner => "beginner",
            Expertise::Intermediate => "intermediate",
            Expertise::Advanced => "advanced",
            Expertise::Blog => "blog",
        }
    }
}

/// Code segments keyed by role. Empty strings mean "not present".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum CodeBlocks {
    /// `style` is `None` when the repository declares no optional language.
    Standard {
        style: Option<String>,
        src: String,
        example: String,
    },
    /// Markup/style/script triple. `scoped_css` is `css` compiled under the
    /// record's scope selector.
    Web {
        html: String,
        css: String,
        js: String,
        scoped_css: String,
    },
    None,
}

impl CodeBlocks {
    /// True if the role exists and is non-empty.
    pub fn has(&self, role: &str) -> bool {
        let value = match (self, role) {
            (CodeBlocks::Standard { style, .. }, "style") => style.as_deref(),
            (CodeBlocks::Standard { src, .. }, "src") => Some(src.as_str()),
            (CodeBlocks::Standard { example, .. }, "example") => Some(example.as_str()),
            (CodeBlocks::Web { html, .. }, "html") => Some(html.as_str()),
            (CodeBlocks::Web { css, .. }, "css") => Some(css.as_str()),
            (CodeBlocks::Web { js, .. }, "js") => Some(js.as_str()),
            _ => None,
        };
        value.is_some_and(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnippetText {
    pub full: String,
    pub short: String,
}

/// A fully parsed record, before version-control enrichment and ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSnippet {
    pub id: String,
    pub file_name: String,
    pub title: String,
    /// `snippet`, or `blog.<type>` for long-form content.
    #[serde(rename = "type")]
    pub record_type: String,
    pub tags: Tags,
    pub code: CodeBlocks,
    pub text: SnippetText,
    pub expertise: Option<Expertise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    pub search_tokens: String,
}

impl ParsedSnippet {
    pub fn is_long_form(&self) -> bool {
        self.record_type.starts_with("blog")
    }
}

/// Version-control provenance of a content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryMeta {
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub update_count: u32,
}

impl HistoryMeta {
    /// Value used for files without any recorded history.
    pub fn empty() -> Self {
        HistoryMeta {
            first_seen: DateTime::<Utc>::UNIX_EPOCH,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            update_count: 1,
        }
    }
}

impl Default for HistoryMeta {
    fn default() -> Self {
        HistoryMeta::empty()
    }
}

/// The unit stored in the corpus-wide index.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSnippet {
    #[serde(flatten)]
    pub snippet: ParsedSnippet,
    #[serde(flatten)]
    pub history: HistoryMeta,
    pub ranking: f64,
    /// Slug of the repository the file lives in.
    pub repository: String,
    pub language: Option<Language>,
    pub slug: String,
    pub url: String,
    pub icon: Option<String>,
}

impl RankedSnippet {
    pub fn title(&self) -> &str {
        &self.snippet.title
    }

    pub fn expertise(&self) -> Option<Expertise> {
        self.snippet.expertise
    }

    pub fn primary_tag(&self) -> Option<&str> {
        self.snippet.tags.primary.as_deref()
    }
}
