//! Code-block extraction and role assignment.
//!
//! Fenced regions are collected in file order, stripped of their delimiters
//! (and of the language annotation when it is one of the repository's
//! markers), trimmed, then assigned to roles by repository kind:
//!
//! | Kind | Fences | Roles |
//! |------|--------|-------|
//! | `snippets` | 1-2 | `src`, `example` |
//! | `snippets` with optional language | 3 | `style`, `src`, `example` |
//! | `css` | 3 | `html`, `css`, `js` (+ `scoped_css`) |
//! | `blog` | any | none |
//!
//! Missing roles become empty strings. Extra fences are ignored.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{RepositoryConfig, RepositoryKind};
use crate::models::CodeBlocks;
use crate::rules::RuleSet;
use crate::style::StyleCompiler;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid regex"));

/// Raw fenced regions of `body`, delimiters included.
pub fn find_fences(body: &str) -> Vec<&str> {
    FENCE_RE.find_iter(body).map(|m| m.as_str()).collect()
}

/// Fence contents with delimiters and known language annotations removed.
pub fn clean_fences(body: &str, rules: &RuleSet, kind: RepositoryKind) -> Vec<String> {
    find_fences(body)
        .into_iter()
        .map(|fence| rules.apply(fence, kind).trim().to_string())
        .collect()
}

/// Extract the code roles of one record.
///
/// `scope` is the record's scope identifier (its file stem), used when
/// compiling the style of markup/style/script records.
pub fn extract_code_blocks(
    body: &str,
    repo: &RepositoryConfig,
    rules: &RuleSet,
    compiler: &dyn StyleCompiler,
    scope: &str,
) -> CodeBlocks {
    if repo.is_blog() {
        return CodeBlocks::None;
    }

    let blocks = clean_fences(body, rules, repo.kind);
    let role = |i: usize| blocks.get(i).cloned().unwrap_or_default();

    if blocks.len() < 2 {
        tracing::warn!(
            file = scope,
            fences = blocks.len(),
            "fewer code blocks than expected, missing roles left empty"
        );
    }

    match repo.kind {
        RepositoryKind::Css => {
            let css = role(1);
            let scoped_css = match compiler.compile_scoped(scope, &css) {
                Ok(compiled) => compiled,
                Err(e) => {
                    tracing::warn!(file = scope, "style compilation failed: {:#}", e);
                    String::new()
                }
            };
            CodeBlocks::Web {
                html: role(0),
                css,
                js: role(2),
                scoped_css,
            }
        }
        _ if repo.has_optional_language() && blocks.len() > 2 => CodeBlocks::Standard {
            style: Some(role(0)),
            src: role(1),
            example: role(2),
        },
        _ => CodeBlocks::Standard {
            style: repo.has_optional_language().then(String::new),
            src: role(0),
            example: role(1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, RepositoryEntry};
    use crate::rules::fence_rules;
    use crate::style::ScopeCompiler;
    use anyhow::{bail, Result};

    fn lang(short: &str, long: &str) -> Option<Language> {
        Some(Language {
            short: short.to_string(),
            long: long.to_string(),
        })
    }

    fn repo(kind: RepositoryKind, optional: bool) -> RepositoryConfig {
        let mut entry = RepositoryEntry {
            name: Some("Repo".to_string()),
            dir_name: Some("repo".to_string()),
            snippet_path: Some("snippets".to_string()),
            repo_url: Some("https://example.com/repo".to_string()),
            slug: Some("repo".to_string()),
            kind,
            language: lang("js", "JavaScript"),
            ..Default::default()
        };
        if kind == RepositoryKind::Css {
            entry.language = lang("html", "HTML");
            entry.second_language = lang("css", "CSS");
            entry.optional_language = lang("js", "JavaScript");
        } else if optional {
            entry.optional_language = lang("css", "CSS");
        }
        entry.validate(0).unwrap()
    }

    fn extract(body: &str, repo: &RepositoryConfig) -> CodeBlocks {
        let rules = fence_rules(&repo.fence_markers()).unwrap();
        extract_code_blocks(body, repo, &rules, &ScopeCompiler, "my-snippet")
    }

    #[test]
    fn test_src_and_example() {
        let body = "Text.\n\n```js\nconst f = x => x;\n```\n\n```js\nf(1); // 1\n```\n";
        assert_eq!(
            extract(body, &repo(RepositoryKind::Snippets, false)),
            CodeBlocks::Standard {
                style: None,
                src: "const f = x => x;".to_string(),
                example: "f(1); // 1".to_string(),
            }
        );
    }

    #[test]
    fn test_two_fences_with_optional_language() {
        let body = "```js\nsrc();\n```\n```js\nexample();\n```";
        assert_eq!(
            extract(body, &repo(RepositoryKind::Snippets, true)),
            CodeBlocks::Standard {
                style: Some(String::new()),
                src: "src();".to_string(),
                example: "example();".to_string(),
            }
        );
    }

    #[test]
    fn test_three_fences_with_optional_language() {
        let body = "```css\n.a { color: red; }\n```\n```js\nsrc();\n```\n```js\nexample();\n```";
        assert_eq!(
            extract(body, &repo(RepositoryKind::Snippets, true)),
            CodeBlocks::Standard {
                style: Some(".a { color: red; }".to_string()),
                src: "src();".to_string(),
                example: "example();".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_fences_are_empty() {
        let code = extract("Only prose here.", &repo(RepositoryKind::Snippets, false));
        assert_eq!(
            code,
            CodeBlocks::Standard {
                style: None,
                src: String::new(),
                example: String::new(),
            }
        );
        assert!(!code.has("src"));
    }

    #[test]
    fn test_web_triple_with_scoped_css() {
        let body = "```html\n<p class=\"x\">Hi</p>\n```\n```css\n.x { color: red; }\n```\n```js\nalert(1);\n```\n```js\nignored();\n```";
        let CodeBlocks::Web {
            html,
            css,
            js,
            scoped_css,
        } = extract(body, &repo(RepositoryKind::Css, false))
        else {
            panic!("expected web layout");
        };
        assert_eq!(html, "<p class=\"x\">Hi</p>");
        assert_eq!(css, ".x { color: red; }");
        assert_eq!(js, "alert(1);");
        assert!(scoped_css.contains("[data-scope=\"my-snippet\"] .x"));
    }

    #[test]
    fn test_web_without_script() {
        let body = "```html\n<p></p>\n```\n```css\np { margin: 0; }\n```";
        let code = extract(body, &repo(RepositoryKind::Css, false));
        assert!(code.has("html"));
        assert!(code.has("css"));
        assert!(!code.has("js"));
    }

    struct FailingCompiler;

    impl StyleCompiler for FailingCompiler {
        fn compile_scoped(&self, _scope: &str, _css: &str) -> Result<String> {
            bail!("boom")
        }
    }

    #[test]
    fn test_style_failure_is_recoverable() {
        let repo = repo(RepositoryKind::Css, false);
        let rules = fence_rules(&repo.fence_markers()).unwrap();
        let body = "```html\n<p></p>\n```\n```css\np {}\n```";
        let CodeBlocks::Web { scoped_css, css, .. } =
            extract_code_blocks(body, &repo, &rules, &FailingCompiler, "x")
        else {
            panic!("expected web layout");
        };
        assert_eq!(scoped_css, "");
        assert_eq!(css, "p {}");
    }

    #[test]
    fn test_blog_has_no_code() {
        let body = "```js\nx\n```";
        assert_eq!(extract(body, &repo(RepositoryKind::Blog, false)), CodeBlocks::None);
    }

    #[test]
    fn test_unknown_annotation_kept() {
        let body = "```py\nprint(1)\n```";
        let CodeBlocks::Standard { src, .. } = extract(body, &repo(RepositoryKind::Snippets, false))
        else {
            panic!("expected standard layout");
        };
        assert_eq!(src, "py\nprint(1)");
    }
}
