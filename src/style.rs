//! Style compilation for markup/style/script snippets.
//!
//! A snippet's style fence is compiled as
//! `[data-scope="<id>"] { <css> }` so its rules only apply inside the
//! snippet's live preview. [`StyleCompiler`] is the seam for that step;
//! [`ScopeCompiler`] is the built-in implementation, which flattens nested
//! rules the way a SCSS compiler does for the subset of syntax snippets use:
//! nested selectors, `&` parent references, and conditional at-rules
//! (`@media`, `@supports`, ...) bubbled out of their parent rule.

use anyhow::{bail, Result};

/// Compiles raw style text under a scope selector.
pub trait StyleCompiler: Send + Sync {
    fn compile_scoped(&self, scope: &str, css: &str) -> Result<String>;
}

/// At-rules whose bodies hold rules that must be scoped.
const CONDITIONAL_AT_RULES: &[&str] = &["@media", "@supports", "@container", "@layer", "@document"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeCompiler;

impl StyleCompiler for ScopeCompiler {
    fn compile_scoped(&self, scope: &str, css: &str) -> Result<String> {
        let source = format!("[data-scope=\"{}\"] {{ {} }}", scope, strip_comments(css));
        compile(&source)
    }
}

enum Item<'a> {
    Declaration(&'a str),
    Block { header: &'a str, body: &'a str },
}

/// Compile a flat-or-nested style sheet into flat CSS.
pub fn compile(source: &str) -> Result<String> {
    let mut out = String::new();
    for item in split_items(source)? {
        match item {
            Item::Declaration(statement) => {
                out.push_str(statement);
                out.push_str(";\n");
            }
            Item::Block { header, body } if header.starts_with('@') => {
                if is_conditional(header) {
                    out.push_str(&format!("{} {{\n{}}}\n", header, compile(body)?));
                } else {
                    out.push_str(&format!("{} {{{}}}\n", header, body));
                }
            }
            Item::Block { header, body } => {
                let selectors = header.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>();
                flatten_rule(&selectors, body, &mut out)?;
            }
        }
    }
    Ok(out)
}

fn flatten_rule(selectors: &[String], body: &str, out: &mut String) -> Result<()> {
    let mut declarations = Vec::new();
    let mut nested = String::new();

    for item in split_items(body)? {
        match item {
            Item::Declaration(decl) => declarations.push(decl),
            Item::Block { header, body } if header.starts_with('@') => {
                if is_conditional(header) {
                    let mut inner = String::new();
                    flatten_rule(selectors, body, &mut inner)?;
                    nested.push_str(&format!("{} {{\n{}}}\n", header, inner));
                } else {
                    nested.push_str(&format!("{} {{{}}}\n", header, body));
                }
            }
            Item::Block { header, body } => {
                let children = combine_selectors(selectors, header);
                flatten_rule(&children, body, &mut nested)?;
            }
        }
    }

    if !declarations.is_empty() {
        out.push_str(&format!(
            "{} {{\n  {}; }}\n",
            selectors.join(", "),
            declarations.join(";\n  ")
        ));
    }
    out.push_str(&nested);
    Ok(())
}

fn combine_selectors(parents: &[String], header: &str) -> Vec<String> {
    let mut combined = Vec::new();
    for child in header.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        for parent in parents {
            if child.contains('&') {
                combined.push(child.replace('&', parent));
            } else {
                combined.push(format!("{} {}", parent, child));
            }
        }
    }
    combined
}

fn is_conditional(header: &str) -> bool {
    let name = header.split_whitespace().next().unwrap_or("");
    CONDITIONAL_AT_RULES.contains(&name)
}

/// Split a rule body into top-level declarations and blocks.
fn split_items(src: &str) -> Result<Vec<Item<'_>>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut header_end = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in src.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => {
                if depth == 0 {
                    header_end = i;
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    bail!("unbalanced '}}' at byte {}", i);
                }
                depth -= 1;
                if depth == 0 {
                    items.push(Item::Block {
                        header: src[start..header_end].trim(),
                        body: &src[header_end + 1..i],
                    });
                    start = i + 1;
                }
            }
            ';' if depth == 0 => {
                let statement = src[start..i].trim();
                if !statement.is_empty() {
                    items.push(Item::Declaration(statement));
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        bail!("unbalanced '{{': {} block(s) left open", depth);
    }
    let trailing = src[start..].trim();
    if !trailing.is_empty() {
        items.push(Item::Declaration(trailing));
    }
    Ok(items)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
