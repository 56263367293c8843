//! Build-time relevance ranking.
//!
//! A record's score is the sum of three signals divided by its repository's
//! `bias_penalty_multiplier`:
//!
//! - **tag**: `tag_scores[tag]` summed over the record's declared tags;
//! - **keyword**: `keyword_scores[k]` for every configured keyword found in
//!   the short excerpt or title (see [`keyword_matches`]);
//! - **activity**: a bounded curve over revision count and recency of the
//!   last revision:
//!
//! ```text
//! activity = ACTIVITY_WEIGHT * ( ½ * (1 - e^(-(update_count - 1) / UPDATE_SCALE))
//!                              + ½ * e^(-age_days * ln 2 / RECENCY_HALF_LIFE_DAYS) )
//! ```
//!
//! Age is measured against a reference time fixed once per build, so every
//! record in a build is ranked against the same clock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RepositoryConfig;
use crate::models::{HistoryMeta, ParsedSnippet, Tags};

/// Upper bound of the activity signal.
pub const ACTIVITY_WEIGHT: f64 = 2.0;
/// Revision count at which the revision half of the curve reaches ~63%.
pub const UPDATE_SCALE: f64 = 8.0;
/// Days after which the recency half of the curve has halved.
pub const RECENCY_HALF_LIFE_DAYS: f64 = 180.0;

/// Per-signal breakdown of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingBreakdown {
    pub tag_score: f64,
    pub keyword_score: f64,
    pub activity_score: f64,
    /// The repository's bias penalty multiplier.
    pub multiplier: f64,
    /// `(tag_score + keyword_score + activity_score) / multiplier`.
    pub total: f64,
}

pub fn tag_signal(tags: &Tags, repo: &RepositoryConfig) -> f64 {
    tags.all
        .iter()
        .filter_map(|tag| {
            repo.tag_scores
                .get(tag)
                .or_else(|| repo.tag_scores.get(&tag.to_lowercase()))
        })
        .sum()
}

/// True if `keyword` (lowercase) occurs in `text`.
///
/// A keyword ending in a separator (`math:`) only matches at the start of a
/// whitespace-delimited word; any other keyword matches as a substring.
pub fn keyword_matches(keyword: &str, text: &str) -> bool {
    let text = text.to_lowercase();
    match keyword.chars().last() {
        None => false,
        Some(last) if !last.is_alphanumeric() => {
            text.split_whitespace().any(|word| word.starts_with(keyword))
        }
        Some(_) => text.contains(keyword),
    }
}

pub fn keyword_signal(short_text: &str, title: &str, repo: &RepositoryConfig) -> f64 {
    repo.keyword_scores
        .iter()
        .filter(|(keyword, _)| {
            keyword_matches(keyword, short_text) || keyword_matches(keyword, title)
        })
        .map(|(_, weight)| weight)
        .sum()
}

pub fn activity_signal(history: &HistoryMeta, now: DateTime<Utc>) -> f64 {
    let revisions = f64::from(history.update_count.saturating_sub(1));
    let age_days = ((now - history.last_updated).num_seconds() as f64 / 86_400.0).max(0.0);

    let revision_part = 1.0 - (-revisions / UPDATE_SCALE).exp();
    let recency_part = (-age_days * std::f64::consts::LN_2 / RECENCY_HALF_LIFE_DAYS).exp();

    ACTIVITY_WEIGHT * (0.5 * revision_part + 0.5 * recency_part)
}

pub fn rank_explained(
    snippet: &ParsedSnippet,
    history: &HistoryMeta,
    repo: &RepositoryConfig,
    now: DateTime<Utc>,
) -> RankingBreakdown {
    let tag_score = tag_signal(&snippet.tags, repo);
    let keyword_score = keyword_signal(&snippet.text.short, &snippet.title, repo);
    let activity_score = activity_signal(history, now);
    let multiplier = repo.bias_penalty_multiplier;

    let total = (tag_score + keyword_score + activity_score) / multiplier;
    RankingBreakdown {
        tag_score,
        keyword_score,
        activity_score,
        multiplier,
        total: if total.is_finite() { total.max(0.0) } else { 0.0 },
    }
}

/// Ranking of one record; always finite and non-negative.
pub fn rank(
    snippet: &ParsedSnippet,
    history: &HistoryMeta,
    repo: &RepositoryConfig,
    now: DateTime<Utc>,
) -> f64 {
    rank_explained(snippet, history, repo, now).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, RepositoryEntry};
    use crate::models::{CodeBlocks, Expertise, SnippetText};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn repo(multiplier: f64) -> RepositoryConfig {
        let mut entry = RepositoryEntry {
            name: Some("30 seconds of Python".to_string()),
            dir_name: Some("30python".to_string()),
            snippet_path: Some("snippets".to_string()),
            repo_url: Some("https://example.com/python".to_string()),
            slug: Some("python".to_string()),
            language: Some(Language {
                short: "py".to_string(),
                long: "Python".to_string(),
            }),
            bias_penalty_multiplier: Some(multiplier),
            ..Default::default()
        };
        entry.tag_scores.insert("list".to_string(), 5.0);
        entry.tag_scores.insert("math".to_string(), 1.0);
        entry.keyword_scores.insert("Math:".to_string(), 1.0);
        entry.keyword_scores.insert("sort".to_string(), 3.0);
        entry.validate(0).unwrap()
    }

    fn snippet(title: &str, tags: &str, short: &str) -> ParsedSnippet {
        let tags = Tags::parse(tags);
        ParsedSnippet {
            id: format!("30python/snippets/{}", title),
            file_name: format!("{}.md", title),
            title: title.to_string(),
            record_type: "snippet".to_string(),
            expertise: Expertise::from_tags(&tags),
            tags,
            code: CodeBlocks::None,
            text: SnippetText {
                full: short.to_string(),
                short: short.to_string(),
            },
            cover: None,
            authors: Vec::new(),
            search_tokens: String::new(),
        }
    }

    fn history(update_count: u32, days_ago: i64) -> HistoryMeta {
        HistoryMeta {
            first_seen: now() - Duration::days(1000),
            last_updated: now() - Duration::days(days_ago),
            update_count,
        }
    }

    #[test]
    fn test_tag_weights_order_records() {
        let repo = repo(1.0);
        let h = history(3, 30);
        let a = rank(&snippet("a", "list,beginner", "Text."), &h, &repo, now());
        let b = rank(&snippet("b", "math,advanced", "Text."), &h, &repo, now());
        assert!(a > b);
    }

    #[test]
    fn test_multiplier_halves_score() {
        let s = snippet("a", "list", "Sorts a list.");
        let h = history(5, 10);
        let one = rank(&s, &h, &repo(1.0), now());
        let two = rank(&s, &h, &repo(2.0), now());
        assert!((one - 2.0 * two).abs() < 1e-9);
    }

    #[test]
    fn test_higher_multiplier_strictly_lowers() {
        let s = snippet("a", "", "");
        let h = history(1, 0);
        let base = rank(&s, &h, &repo(1.5), now());
        assert!(rank(&s, &h, &repo(1.6), now()) < base);
    }

    #[test]
    fn test_ranking_never_negative() {
        let s = snippet("x", "", "");
        let r = rank(&s, &HistoryMeta::empty(), &repo(1.0), now());
        assert!(r >= 0.0);
        assert!(r.is_finite());
    }

    #[test]
    fn test_keyword_separator_matches_word_prefix_only() {
        assert!(keyword_matches("math:", "Uses math:floor to round."));
        assert!(keyword_matches("math:", "MATH:PI constant"));
        assert!(!keyword_matches("math:", "A mathematical helper"));
        assert!(!keyword_matches("math:", "see amath: here"));
        assert!(keyword_matches("sort", "Unsorted input"));
        assert!(!keyword_matches("", "anything"));
    }

    #[test]
    fn test_keyword_counts_once_and_checks_title() {
        let repo = repo(1.0);
        assert_eq!(keyword_signal("sort sort sort", "", &repo), 3.0);
        assert_eq!(keyword_signal("", "Sort by key", &repo), 3.0);
        assert_eq!(keyword_signal("Uses math:sqrt", "Sort", &repo), 4.0);
    }

    #[test]
    fn test_activity_monotonic_and_bounded() {
        let mut previous = 0.0;
        for count in [1, 2, 5, 20, 200, 10_000] {
            let score = activity_signal(&history(count, 30), now());
            assert!(score >= previous);
            assert!(score <= ACTIVITY_WEIGHT);
            previous = score;
        }

        let mut previous = f64::MAX;
        for days in [0, 1, 30, 180, 3650] {
            let score = activity_signal(&history(4, days), now());
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_future_timestamp_is_clamped() {
        let fresh = activity_signal(&history(1, 0), now());
        let future = activity_signal(&history(1, -10), now());
        assert_eq!(fresh, future);
        assert!((fresh - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_adds_up() {
        let repo = repo(1.25);
        let b = rank_explained(
            &snippet("Sort list", "list,math", "Sorts using math:floor"),
            &history(2, 90),
            &repo,
            now(),
        );
        assert_eq!(b.tag_score, 6.0);
        assert_eq!(b.keyword_score, 4.0);
        assert_eq!(b.multiplier, 1.25);
        assert!((b.total - (b.tag_score + b.keyword_score + b.activity_score) / 1.25).abs() < 1e-9);
    }
}
