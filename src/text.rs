//! Text normalisation: the free-text head of a file, its short excerpt, and
//! URL slugs derived from file names.

use crate::config::RepositoryConfig;
use crate::models::{RawSnippet, SnippetText};
use crate::rules::RuleSet;

const FENCE: &str = "```";

/// A long-form excerpt ends at the first blank line if it comes this early...
const EXCERPT_BREAK_LIMIT: usize = 180;
/// ...otherwise at the first space after this many bytes.
const EXCERPT_SOFT_CUT: usize = 160;

/// Body text before the first fence, with `rules` applied.
pub fn text_head(body: &str, rules: &RuleSet, repo: &RepositoryConfig) -> String {
    let head = match body.find(FENCE) {
        Some(pos) => &body[..pos],
        None => body,
    };
    rules.apply(head, repo.kind).trim().to_string()
}

/// Snippet excerpt: everything before the first blank line.
pub fn snippet_short_text(head: &str) -> String {
    match head.find("\n\n") {
        Some(pos) => head[..pos].trim().to_string(),
        None => head.trim().to_string(),
    }
}

/// Long-form excerpt: the `excerpt` header if set, otherwise a cut of the text.
pub fn long_form_short_text(head: &str, excerpt: Option<&str>) -> String {
    if let Some(excerpt) = excerpt.map(str::trim).filter(|e| !e.is_empty()) {
        return excerpt.to_string();
    }

    let cut = match head.find("\n\n") {
        Some(pos) if pos <= EXCERPT_BREAK_LIMIT => pos,
        _ => head
            .char_indices()
            .find(|(i, c)| *i >= EXCERPT_SOFT_CUT && *c == ' ')
            .map(|(i, _)| i)
            .unwrap_or(head.len()),
    };
    format!("{}...", head[..cut].trim_end())
}

/// Full and short text of a record.
pub fn normalize_text(raw: &RawSnippet, repo: &RepositoryConfig, rules: &RuleSet) -> SnippetText {
    if repo.is_blog() {
        let full = rules.apply(&raw.body, repo.kind).trim().to_string();
        let short = long_form_short_text(&full, raw.metadata.excerpt.as_deref());
        SnippetText { full, short }
    } else {
        let full = text_head(&raw.body, rules, repo);
        let short = snippet_short_text(&full);
        SnippetText { full, short }
    }
}

/// Kebab-case slug of a file stem: `allEqual`, `all_equal` → `all-equal`.
pub fn seo_slug(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, RepositoryEntry, RepositoryKind};
    use crate::frontmatter::SnippetMetadata;
    use crate::rules::text_rules;

    fn repo(kind: RepositoryKind) -> RepositoryConfig {
        RepositoryEntry {
            name: Some("Repo".to_string()),
            dir_name: Some("repo".to_string()),
            snippet_path: Some("snippets".to_string()),
            repo_url: Some("https://example.com/repo".to_string()),
            slug: Some("repo".to_string()),
            kind,
            language: Some(Language {
                short: "js".to_string(),
                long: "JavaScript".to_string(),
            }),
            ..Default::default()
        }
        .validate(0)
        .unwrap()
    }

    fn raw(body: &str, excerpt: Option<&str>) -> RawSnippet {
        RawSnippet {
            file_name: "x.md".to_string(),
            metadata: SnippetMetadata {
                excerpt: excerpt.map(str::to_string),
                ..Default::default()
            },
            body: body.to_string(),
        }
    }

    #[test]
    fn test_snippet_text_stops_at_fence_and_blank_line() {
        let text = normalize_text(
            &raw(
                "\r\nChecks if all elements are equal.\r\n\r\nUse `Array.every()`.\r\n\r\n```js\nconst x = 1;\n```",
                None,
            ),
            &repo(RepositoryKind::Snippets),
            &text_rules().unwrap(),
        );
        assert_eq!(text.short, "Checks if all elements are equal.");
        assert_eq!(
            text.full,
            "Checks if all elements are equal.\n\nUse `Array.every()`."
        );
    }

    #[test]
    fn test_snippet_without_blank_line_uses_whole_head() {
        assert_eq!(snippet_short_text("One line only."), "One line only.");
    }

    #[test]
    fn test_long_form_prefers_excerpt() {
        let text = normalize_text(
            &raw("Body.\n\n```js\nx\n```\n\nMore.", Some("  Custom excerpt ")),
            &repo(RepositoryKind::Blog),
            &text_rules().unwrap(),
        );
        assert_eq!(text.short, "Custom excerpt");
        assert!(text.full.contains("```js"));
        assert!(text.full.ends_with("More."));
    }

    #[test]
    fn test_long_form_cut_at_early_blank_line() {
        assert_eq!(
            long_form_short_text("Short intro.\n\nRest of the post.", None),
            "Short intro...."
        );
    }

    #[test]
    fn test_long_form_soft_cut_after_limit() {
        let head = format!("{} tail words here", "word ".repeat(40));
        let short = long_form_short_text(&head, Some("   "));
        assert!(short.ends_with("..."));
        let cut = short.len() - 3;
        assert!(cut >= EXCERPT_SOFT_CUT);
        assert!(cut < head.len());
    }

    #[test]
    fn test_seo_slug() {
        assert_eq!(seo_slug("allEqual"), "all-equal");
        assert_eq!(seo_slug("all_equal"), "all-equal");
        assert_eq!(seo_slug("URLParameters"), "url-parameters");
        assert_eq!(seo_slug("is-prime"), "is-prime");
        assert_eq!(seo_slug("sum_by2"), "sum-by2");
        assert_eq!(seo_slug("Flexbox Centering"), "flexbox-centering");
    }
}
