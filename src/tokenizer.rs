//! Search token construction.
//!
//! [`tokenize`] turns an excerpt into lowercase word tokens with stop words
//! and punctuation removed. [`search_tokens`] combines those tokens with a
//! record's title, language names and searchable tags into the persisted
//! `search_tokens` string. No stemming is applied anywhere.

use crate::config::RepositoryConfig;
use crate::models::Tags;
use crate::ordered::OrderedSet;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercase word tokens of `text`, in order, stop words removed.
///
/// Repeated words are kept; deduplication happens when tokens are combined.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// Join `parts` into one lowercase, space-separated string with each word
/// kept at its first occurrence.
pub fn join_tokens<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = OrderedSet::new();
    for part in parts {
        for word in part.as_ref().to_lowercase().split_whitespace() {
            seen.insert(word.to_string());
        }
    }
    seen.into_vec().join(" ")
}

/// Search tokens of a record.
pub fn search_tokens(repo: &RepositoryConfig, title: &str, tags: &Tags, short_text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if repo.is_blog() {
        parts.extend(tags.without_expertise().map(str::to_string));
        parts.extend(tokenize(&format!("{} {}", short_text, title)));
    } else {
        parts.push(title.to_string());
        if let Some(language) = &repo.language {
            parts.push(language.short.clone());
            parts.push(language.long.clone());
        }
        parts.extend(tags.without_expertise().map(str::to_string));
        parts.extend(tokenize(short_text));
    }

    join_tokens(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, RepositoryEntry, RepositoryKind};

    fn repo(kind: RepositoryKind) -> RepositoryConfig {
        RepositoryEntry {
            name: Some("30 seconds of Python".to_string()),
            dir_name: Some("30python".to_string()),
            snippet_path: Some("snippets".to_string()),
            repo_url: Some("https://example.com/python".to_string()),
            slug: Some("python".to_string()),
            kind,
            language: Some(Language {
                short: "py".to_string(),
                long: "Python".to_string(),
            }),
            ..Default::default()
        }
        .validate(0)
        .unwrap()
    }

    #[test]
    fn test_tokenize_filters_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("Checks if all the elements in a list are equal."),
            vec!["checks", "elements", "list", "equal"]
        );
        assert!(tokenize("  ...!? ").is_empty());
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let text = "Returns the sum of an array, after mapping each element to a value.";
        let first = tokenize(text);
        for _ in 0..10 {
            assert_eq!(tokenize(text), first);
        }
    }

    #[test]
    fn test_tokenize_no_stemming() {
        assert_eq!(tokenize("Mapping maps mapped"), vec!["mapping", "maps", "mapped"]);
    }

    #[test]
    fn test_join_tokens_dedups_first_occurrence() {
        assert_eq!(join_tokens(["B a", "b", "C A"]), "b a c");
    }

    #[test]
    fn test_snippet_search_tokens() {
        let tokens = search_tokens(
            &repo(RepositoryKind::Snippets),
            "All equal",
            &Tags::parse("list,beginner"),
            "Checks if all elements in a list are equal.",
        );
        assert_eq!(tokens, "all equal py python list checks elements");
        assert!(!tokens.contains("beginner"));
    }

    #[test]
    fn test_long_form_search_tokens() {
        let tokens = search_tokens(
            &repo(RepositoryKind::Blog),
            "Understanding Closures",
            &Tags::parse("javascript,function,intermediate"),
            "A closure is a function bundled with its scope.",
        );
        assert_eq!(
            tokens,
            "javascript function closure bundled scope understanding closures"
        );
    }
}
