//! Declarative text-transform rules.
//!
//! Every regex-driven rewrite of raw content goes through a [`RuleSet`]: an
//! ordered list of `(matcher, replacement, applicability)` rules evaluated
//! left to right. Each rule is small enough to test on its own.

use anyhow::{Context, Result};
use regex::Regex;
use std::borrow::Cow;

use crate::config::RepositoryKind;

/// Which repositories a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Always,
    Only(RepositoryKind),
    Except(RepositoryKind),
}

impl Applicability {
    pub fn matches(&self, kind: RepositoryKind) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::Only(k) => *k == kind,
            Applicability::Except(k) => *k != kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextRule {
    pub name: &'static str,
    pub matcher: Regex,
    /// Replacement template; `$1`-style group references are expanded.
    pub replacement: String,
    pub applies_to: Applicability,
}

impl TextRule {
    pub fn new(name: &'static str, pattern: &str, replacement: &str) -> Result<Self> {
        let matcher = Regex::new(pattern)
            .with_context(|| format!("Invalid pattern for rule '{}': {}", name, pattern))?;
        Ok(TextRule {
            name,
            matcher,
            replacement: replacement.to_string(),
            applies_to: Applicability::Always,
        })
    }

    pub fn applies_to(mut self, applicability: Applicability) -> Self {
        self.applies_to = applicability;
        self
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.matcher.replace_all(text, self.replacement.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<TextRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<TextRule>) -> Self {
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every applicable rule over `text`, in order.
    pub fn apply(&self, text: &str, kind: RepositoryKind) -> String {
        let mut current = text.to_string();
        for rule in self.rules.iter().filter(|r| r.applies_to.matches(kind)) {
            if rule.matcher.is_match(&current) {
                current = rule.apply(&current).into_owned();
            }
        }
        current
    }
}

/// Line-ending normalisation applied to every text head.
pub fn text_rules() -> Result<RuleSet> {
    Ok(RuleSet::new(vec![TextRule::new(
        "crlf-to-lf",
        r"\r\n",
        "\n",
    )?]))
}

/// Strips fence delimiters, together with the language annotation when it
/// is one of `markers`, from a single fenced block.
pub fn fence_rules(markers: &[&str]) -> Result<RuleSet> {
    let pattern = if markers.is_empty() {
        "(?m)^```".to_string()
    } else {
        let alternatives = markers
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        format!("(?m)^```(?:{})?", alternatives)
    };
    Ok(RuleSet::new(vec![
        TextRule::new("crlf-to-lf", r"\r\n", "\n")?,
        TextRule::new("fence-delimiters", &pattern, "")?,
    ]))
}
