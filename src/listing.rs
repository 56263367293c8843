//! Listing assembly.
//!
//! Takes the complete ranked corpus and produces every listing page:
//!
//! ```text
//! grouping                     base url              pages
//! global                       /list                 /list/{p,a,e}/<n>
//! repository (not archived)    /<slug>               /<slug>/{p,a,e}/<n>
//! repository + primary tag     /<slug>/t/<tag>       /<slug>/t/<tag>/{p,a,e}/<n>
//! ```
//!
//! `<tag>` is the slug of the tag, so content can never add path segments.
//!
//! Each (grouping, order) pair is filtered, stably sorted, and cut into
//! fixed-size pages independently of every other pair, so the pairs are
//! assembled in parallel. Page 1 of the global popularity listing is also
//! emitted as the site root `/`.

use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::config::RepositoryConfig;
use crate::models::{Expertise, RankedSnippet};
use crate::text::seo_slug;

/// Featured rank given to repositories without one, so they sort last.
const UNFEATURED_RANK: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Popularity,
    Alphabetical,
    Expertise,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [
        SortOrder::Popularity,
        SortOrder::Alphabetical,
        SortOrder::Expertise,
    ];

    /// URL segment: `p`, `a` or `e`.
    pub fn segment(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "p",
            SortOrder::Alphabetical => "a",
            SortOrder::Expertise => "e",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "Popularity",
            SortOrder::Alphabetical => "Alphabetical",
            SortOrder::Expertise => "Expertise",
        }
    }

    pub fn compare(&self, a: &RankedSnippet, b: &RankedSnippet) -> Ordering {
        match self {
            SortOrder::Popularity => by_popularity(a, b),
            SortOrder::Alphabetical => by_title(a, b),
            SortOrder::Expertise => by_expertise(a.expertise(), b.expertise()).then_with(|| by_title(a, b)),
        }
    }
}

/// Ranking, highest first.
pub fn by_popularity(a: &RankedSnippet, b: &RankedSnippet) -> Ordering {
    b.ranking.partial_cmp(&a.ranking).unwrap_or(Ordering::Equal)
}

/// Title, case-insensitively.
pub fn by_title(a: &RankedSnippet, b: &RankedSnippet) -> Ordering {
    a.title().to_lowercase().cmp(&b.title().to_lowercase())
}

/// Expertise scale order, unclassified records last.
fn by_expertise(a: Option<Expertise>, b: Option<Expertise>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Main,
    Language,
    Blog,
    Tag,
}

/// Position of a page among the pages of one (grouping, order) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub page_number: usize,
    pub total_pages: usize,
    pub base_url: String,
    pub order: SortOrder,
    /// Absent when there is no previous page or only one page in total.
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Paginator {
    fn new(page_number: usize, total_pages: usize, base_url: &str, order: SortOrder) -> Self {
        let controls = total_pages >= 2;
        let link = |n: usize| page_url(base_url, order, n);
        Paginator {
            page_number,
            total_pages,
            base_url: base_url.to_string(),
            order,
            prev: (controls && page_number > 1).then(|| link(page_number - 1)),
            next: (controls && page_number < total_pages).then(|| link(page_number + 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sublink {
    pub name: String,
    pub url: String,
    pub selected: bool,
}

/// The order links of a grouping, with the active one selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sorter {
    pub orders: Vec<Sublink>,
    pub selected: SortOrder,
}

impl Sorter {
    fn new(base_url: &str, selected: SortOrder) -> Self {
        Sorter {
            orders: SortOrder::ALL
                .iter()
                .map(|o| Sublink {
                    name: o.title().to_string(),
                    url: page_url(base_url, *o, 1),
                    selected: *o == selected,
                })
                .collect(),
            selected,
        }
    }
}

/// One generated listing page.
#[derive(Debug, Clone)]
pub struct ListingPage<'a> {
    pub path: String,
    pub records: Vec<&'a RankedSnippet>,
    pub paginator: Paginator,
    pub sorter: Sorter,
    pub listing_sublinks: Vec<Sublink>,
    pub listing_type: ListingType,
    pub listing_name: String,
    pub listing_title: String,
    /// Records in the whole grouping, not just this page.
    pub snippet_count: usize,
}

pub fn page_url(base_url: &str, order: SortOrder, page_number: usize) -> String {
    format!("{}/{}/{}", base_url, order.segment(), page_number)
}

/// Split `items` into contiguous chunks of `size`; the last may be shorter.
pub fn paginate<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// Cross-navigation of a grouping.
#[derive(Debug, Clone)]
enum Navigation {
    /// Links to repository listings: `(name, listing url)`.
    Repositories(Vec<(String, String)>),
    /// `[All, tag...]` of one repository; `active` is the selected tag.
    Tags {
        base_url: String,
        tags: Vec<String>,
        active: Option<String>,
    },
    None,
}

impl Navigation {
    fn sublinks(&self, order: SortOrder) -> Vec<Sublink> {
        match self {
            Navigation::Repositories(links) => links
                .iter()
                .map(|(name, url)| Sublink {
                    name: name.clone(),
                    url: page_url(url, order, 1),
                    selected: false,
                })
                .collect(),
            Navigation::Tags {
                base_url,
                tags,
                active,
            } => {
                let mut links = vec![Sublink {
                    name: "All".to_string(),
                    url: page_url(base_url, order, 1),
                    selected: active.is_none(),
                }];
                links.extend(tags.iter().map(|tag| Sublink {
                    name: capitalize(tag),
                    url: page_url(&tag_url(base_url, tag), order, 1),
                    selected: active.as_deref() == Some(tag.as_str()),
                }));
                links
            }
            Navigation::None => Vec::new(),
        }
    }
}

/// A filtered view of the corpus with its listing metadata.
#[derive(Debug, Clone)]
struct Grouping<'a> {
    base_url: String,
    listing_type: ListingType,
    listing_name: String,
    listing_title: String,
    records: Vec<&'a RankedSnippet>,
    navigation: Navigation,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Base url of a tag grouping.
pub fn tag_url(base_url: &str, tag: &str) -> String {
    format!("{}/t/{}", base_url, seo_slug(tag))
}

/// Distinct primary tags of a repository's records, sorted.
///
/// Tags without a usable slug are dropped; of several tags sharing a slug
/// only the first in sort order is kept.
pub fn listing_tags(corpus: &[RankedSnippet], repo: &RepositoryConfig) -> Vec<String> {
    if repo.is_blog() {
        return Vec::new();
    }
    let mut slugs = HashSet::new();
    corpus
        .iter()
        .filter(|r| r.repository == repo.slug)
        .filter_map(|r| r.primary_tag())
        .filter(|t| Expertise::from_tag(t).is_none())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|t| {
            let slug = seo_slug(t);
            !slug.is_empty() && slugs.insert(slug)
        })
        .collect()
}

/// Records shown in the listing of `repo`: its own plus merged long-form ones.
fn repository_records<'a: 'r, 'r>(
    corpus: &'a [RankedSnippet],
    repo: &'r RepositoryConfig,
) -> impl Iterator<Item = &'a RankedSnippet> + 'r {
    let language = repo.language_name();
    corpus
        .iter()
        .filter(move |r| r.repository == repo.slug || is_merged_long_form(r, language))
}

/// Repositories linked from the global listing: not unlisted, not archived,
/// with at least one record, by `featured` (0 last) then name.
pub fn main_sublinks(corpus: &[RankedSnippet], repos: &[RepositoryConfig]) -> Vec<(String, String)> {
    let mut listed: Vec<&RepositoryConfig> = repos
        .iter()
        .filter(|r| !r.unlisted && !r.archived)
        .filter(|r| repository_records(corpus, r).next().is_some())
        .collect();
    let rank = |r: &RepositoryConfig| {
        if r.featured > 0 {
            r.featured
        } else {
            UNFEATURED_RANK
        }
    };
    listed.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name)));
    listed
        .into_iter()
        .map(|r| (r.name.clone(), r.listing_url()))
        .collect()
}

fn is_merged_long_form(record: &RankedSnippet, language: Option<&str>) -> bool {
    match language {
        Some(language) => {
            record.snippet.is_long_form() && record.snippet.tags.contains_ignore_case(language)
        }
        None => false,
    }
}

fn build_groupings<'a>(corpus: &'a [RankedSnippet], repos: &[RepositoryConfig]) -> Vec<Grouping<'a>> {
    let mut groupings = vec![Grouping {
        base_url: "/list".to_string(),
        listing_type: ListingType::Main,
        listing_name: "Snippet List".to_string(),
        listing_title: "Snippet List".to_string(),
        records: corpus.iter().collect(),
        navigation: Navigation::Repositories(main_sublinks(corpus, repos)),
    }];

    for repo in repos.iter().filter(|r| !r.archived) {
        let language = repo.language_name();
        let base_url = repo.listing_url();
        let tags = listing_tags(corpus, repo);
        let (listing_type, listing_title) = match language {
            Some(language) if !repo.is_blog() => {
                (ListingType::Language, format!("{} Snippets", language))
            }
            _ => (ListingType::Blog, "Blog".to_string()),
        };

        groupings.push(Grouping {
            base_url: base_url.clone(),
            listing_type,
            listing_name: listing_title.clone(),
            listing_title: listing_title.clone(),
            records: repository_records(corpus, repo).collect(),
            navigation: if repo.is_blog() {
                Navigation::None
            } else {
                Navigation::Tags {
                    base_url: base_url.clone(),
                    tags: tags.clone(),
                    active: None,
                }
            },
        });

        for tag in &tags {
            let slug = seo_slug(tag);
            let has_tag = |t: &str| seo_slug(t) == slug;
            groupings.push(Grouping {
                base_url: tag_url(&base_url, tag),
                listing_type: ListingType::Tag,
                listing_name: format!("{} {} Snippets", language.unwrap_or_default(), capitalize(tag)),
                listing_title: listing_title.clone(),
                records: corpus
                    .iter()
                    .filter(|r| {
                        (r.repository == repo.slug && r.primary_tag().is_some_and(|t| has_tag(t)))
                            || (is_merged_long_form(r, language)
                                && r.snippet.tags.all.iter().any(|t| has_tag(t.as_str())))
                    })
                    .collect(),
                navigation: Navigation::Tags {
                    base_url: base_url.clone(),
                    tags: tags.clone(),
                    active: Some(tag.clone()),
                },
            });
        }
    }

    groupings
}

fn assemble_pages<'a>(
    grouping: &Grouping<'a>,
    order: SortOrder,
    cards_per_page: usize,
) -> Vec<ListingPage<'a>> {
    let mut sorted = grouping.records.clone();
    sorted.sort_by(|a, b| order.compare(a, b));

    let chunks = paginate(&sorted, cards_per_page);
    let total_pages = chunks.len();
    let sorter = Sorter::new(&grouping.base_url, order);
    let listing_sublinks = grouping.navigation.sublinks(order);

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, records)| ListingPage {
            path: page_url(&grouping.base_url, order, i + 1),
            records,
            paginator: Paginator::new(i + 1, total_pages, &grouping.base_url, order),
            sorter: sorter.clone(),
            listing_sublinks: listing_sublinks.clone(),
            listing_type: grouping.listing_type,
            listing_name: grouping.listing_name.clone(),
            listing_title: grouping.listing_title.clone(),
            snippet_count: grouping.records.len(),
        })
        .collect()
}

/// Every listing page of the corpus, plus the site root.
///
/// Groupings with no records produce no pages.
pub fn assemble_listings<'a>(
    corpus: &'a [RankedSnippet],
    repos: &[RepositoryConfig],
    cards_per_page: usize,
) -> Vec<ListingPage<'a>> {
    let groupings = build_groupings(corpus, repos);
    let pairs: Vec<(&Grouping<'a>, SortOrder)> = groupings
        .iter()
        .flat_map(|g| SortOrder::ALL.into_iter().map(move |o| (g, o)))
        .collect();

    let mut pages: Vec<ListingPage<'a>> = pairs
        .par_iter()
        .map(|(grouping, order)| assemble_pages(grouping, *order, cards_per_page))
        .flatten()
        .collect();

    let root = pages
        .iter()
        .find(|p| {
            p.listing_type == ListingType::Main
                && p.paginator.order == SortOrder::Popularity
                && p.paginator.page_number == 1
        })
        .cloned();
    if let Some(mut root) = root {
        root.path = "/".to_string();
        pages.insert(0, root);
    }

    pages
}
