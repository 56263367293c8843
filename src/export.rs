//! Persist the build outputs as JSON for the static site.
//!
//! Produces `index.json` (every record, in global popularity order) and one
//! `pages/<path>.json` page context per listing page. The site root `/` is
//! written as `pages/index.json`.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::config::Language;
use crate::listing::{ListingPage, ListingType, Paginator, Sorter, Sublink};
use crate::models::{Expertise, RankedSnippet};

#[derive(Serialize)]
struct IndexData<'a> {
    records: &'a [RankedSnippet],
}

/// The card-sized view of a record shown on listing pages.
#[derive(Debug, Serialize)]
pub struct SnippetPreview<'a> {
    pub title: &'a str,
    pub expertise: Option<Expertise>,
    pub primary_tag: Option<&'a str>,
    pub language: Option<&'a Language>,
    pub icon: Option<&'a str>,
    pub description: &'a str,
    pub url: &'a str,
    pub search_tokens: &'a str,
}

impl<'a> SnippetPreview<'a> {
    pub fn from_record(record: &'a RankedSnippet) -> Self {
        SnippetPreview {
            title: record.title(),
            expertise: record.expertise(),
            primary_tag: record.primary_tag(),
            language: record.language.as_ref(),
            icon: record.icon.as_deref(),
            description: &record.snippet.text.short,
            url: &record.slug,
            search_tokens: &record.snippet.search_tokens,
        }
    }
}

#[derive(Serialize)]
struct PageContext<'a> {
    path: &'a str,
    snippet_list: Vec<SnippetPreview<'a>>,
    paginator: &'a Paginator,
    sorter: &'a Sorter,
    listing_sublinks: &'a [Sublink],
    listing_type: ListingType,
    listing_name: &'a str,
    listing_title: &'a str,
    snippet_count: usize,
}

impl<'a> PageContext<'a> {
    fn from_page(page: &'a ListingPage<'a>) -> Self {
        PageContext {
            path: &page.path,
            snippet_list: page
                .records
                .iter()
                .map(|r| SnippetPreview::from_record(r))
                .collect(),
            paginator: &page.paginator,
            sorter: &page.sorter,
            listing_sublinks: &page.listing_sublinks,
            listing_type: page.listing_type,
            listing_name: &page.listing_name,
            listing_title: &page.listing_title,
            snippet_count: page.snippet_count,
        }
    }
}

/// File a page context is written to, under `out_dir/pages`.
///
/// Fails for any page path that is not made of plain segments.
pub fn page_file(out_dir: &Path, page_path: &str) -> Result<PathBuf> {
    let relative = page_path.trim_matches('/');
    let relative = if relative.is_empty() { "index" } else { relative };
    if !Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        bail!("Invalid page path: {}", page_path);
    }
    Ok(out_dir.join("pages").join(format!("{}.json", relative)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the corpus index and every page context under `out_dir`.
pub fn write_outputs(out_dir: &Path, corpus: &[RankedSnippet], pages: &[ListingPage<'_>]) -> Result<()> {
    write_json(&out_dir.join("index.json"), &IndexData { records: corpus })?;

    for page in pages {
        write_json(&page_file(out_dir, &page.path)?, &PageContext::from_page(page))?;
    }

    tracing::info!(
        records = corpus.len(),
        pages = pages.len(),
        "wrote outputs to {}",
        out_dir.display()
    );
    Ok(())
}
