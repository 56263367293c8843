//! Metadata header extraction.
//!
//! Content files start with a `---`-delimited header of `key: value` lines
//! followed by the body:
//!
//! ```text
//! ---
//! title: All equal
//! tags: list,beginner
//! ---
//! Checks if all elements in a list are equal.
//! ```
//!
//! Only the subset of YAML that content files actually use is understood:
//! plain, quoted, and bracketed list values, and `>`/`|` block scalars.
//! A missing or malformed header is never an error; the record gets default
//! metadata and the problem is logged.

use serde::Serialize;

use crate::models::RawSnippet;

const DELIMITER: &str = "---";

/// Header fields recognised on content files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnippetMetadata {
    pub title: Option<String>,
    /// Raw comma-separated tag string.
    pub tags: String,
    /// Long-form post type (`story`, `list`, ...).
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub cover: Option<String>,
    /// Raw comma-separated author ids.
    pub authors: Option<String>,
    pub excerpt: Option<String>,
}

/// Result of splitting a file: header, body, and any recoverable problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub metadata: SnippetMetadata,
    pub body: String,
    pub warnings: Vec<String>,
}

/// Split raw file content into metadata and body.
pub fn split_front_matter(content: &str) -> FrontMatter {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut warnings = Vec::new();

    let mut lines = content.split_inclusive('\n');
    let first = lines.next().unwrap_or("");
    if first.trim_end() != DELIMITER {
        warnings.push("missing metadata header".to_string());
        return FrontMatter {
            metadata: SnippetMetadata::default(),
            body: content.to_string(),
            warnings,
        };
    }

    let mut header: Vec<&str> = Vec::new();
    let mut consumed = first.len();
    let mut closed = false;
    for line in lines {
        consumed += line.len();
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == "..." {
            closed = true;
            break;
        }
        header.push(trimmed);
    }

    if !closed {
        warnings.push("unterminated metadata header".to_string());
        return FrontMatter {
            metadata: SnippetMetadata::default(),
            body: content.to_string(),
            warnings,
        };
    }

    let metadata = parse_header(&header, &mut warnings);
    FrontMatter {
        metadata,
        body: content[consumed..].to_string(),
        warnings,
    }
}

fn parse_header(lines: &[&str], warnings: &mut Vec<String>) -> SnippetMetadata {
    let mut metadata = SnippetMetadata::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let Some((key, raw_value)) = line.split_once(':') else {
            warnings.push(format!("ignoring header line without a key: '{}'", line));
            continue;
        };
        let key = key.trim();
        let raw_value = raw_value.trim();

        let value = match raw_value {
            ">" | ">-" | "|" | "|-" => {
                let mut block = Vec::new();
                while i < lines.len()
                    && (lines[i].starts_with(' ') || lines[i].starts_with('\t') || lines[i].is_empty())
                {
                    block.push(lines[i].trim());
                    i += 1;
                }
                let joiner = if raw_value.starts_with('>') { " " } else { "\n" };
                block
                    .into_iter()
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(joiner)
            }
            _ => unquote(raw_value),
        };

        match key {
            "title" => metadata.title = Some(value).filter(|v| !v.is_empty()),
            "tags" => metadata.tags = value,
            "type" => metadata.post_type = Some(value).filter(|v| !v.is_empty()),
            "cover" => metadata.cover = Some(value).filter(|v| !v.is_empty()),
            "authors" => metadata.authors = Some(value).filter(|v| !v.is_empty()),
            "excerpt" => metadata.excerpt = Some(value),
            _ => {}
        }
    }

    metadata
}

/// Strip matching quotes; flatten `[a, b]` lists to `a,b`.
fn unquote(value: &str) -> String {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        return inner
            .split(',')
            .map(|v| unquote(v.trim()))
            .collect::<Vec<_>>()
            .join(",");
    }
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

/// Build a [`RawSnippet`] from a file's content, logging header problems.
pub fn extract_raw_snippet(file_name: &str, content: &str) -> RawSnippet {
    let FrontMatter {
        metadata,
        body,
        warnings,
    } = split_front_matter(content);

    for warning in &warnings {
        tracing::warn!(file = file_name, "{}", warning);
    }

    RawSnippet {
        file_name: file_name.to_string(),
        metadata,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_header_and_body() {
        let fm = split_front_matter(
            "---\ntitle: All equal\ntags: list,beginner\n---\n\nChecks things.\n\n```py\nx\n```\n",
        );
        assert!(fm.warnings.is_empty());
        assert_eq!(fm.metadata.title.as_deref(), Some("All equal"));
        assert_eq!(fm.metadata.tags, "list,beginner");
        assert!(fm.body.starts_with("\nChecks things."));
    }

    #[test]
    fn test_quoted_and_list_values() {
        let fm = split_front_matter(
            "---\ntitle: \"Colons: everywhere\"\ntags: [list, 'math']\nauthors: chalarangelo\n---\nBody",
        );
        assert_eq!(fm.metadata.title.as_deref(), Some("Colons: everywhere"));
        assert_eq!(fm.metadata.tags, "list,math");
        assert_eq!(fm.metadata.authors.as_deref(), Some("chalarangelo"));
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn test_block_scalar_excerpt() {
        let fm = split_front_matter(
            "---\ntitle: Post\ntype: story\nexcerpt: >-\n  First line\n  second line\ncover: blog_images/x.jpg\n---\nBody",
        );
        assert_eq!(
            fm.metadata.excerpt.as_deref(),
            Some("First line second line")
        );
        assert_eq!(fm.metadata.post_type.as_deref(), Some("story"));
        assert_eq!(fm.metadata.cover.as_deref(), Some("blog_images/x.jpg"));
    }

    #[test]
    fn test_missing_header_is_recoverable() {
        let fm = split_front_matter("Just text\n");
        assert_eq!(fm.metadata, SnippetMetadata::default());
        assert_eq!(fm.body, "Just text\n");
        assert_eq!(fm.warnings.len(), 1);
    }

    #[test]
    fn test_unterminated_header_is_recoverable() {
        let fm = split_front_matter("---\ntitle: Oops\nno end\n");
        assert_eq!(fm.metadata.title, None);
        assert_eq!(fm.warnings, vec!["unterminated metadata header".to_string()]);
    }

    #[test]
    fn test_crlf_header() {
        let fm = split_front_matter("---\r\ntitle: Windows\r\ntags: a,b\r\n---\r\nBody\r\n");
        assert_eq!(fm.metadata.title.as_deref(), Some("Windows"));
        assert_eq!(fm.metadata.tags, "a,b");
        assert_eq!(fm.body, "Body\r\n");
    }

    #[test]
    fn test_bad_line_warns_but_keeps_rest() {
        let fm = split_front_matter("---\ngarbage\ntitle: Kept\n---\n");
        assert_eq!(fm.metadata.title.as_deref(), Some("Kept"));
        assert_eq!(fm.warnings.len(), 1);
    }
}
