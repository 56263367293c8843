//! # snipdex
//!
//! Build-time content ranking and search-index pipeline for snippet and
//! blog repositories.
//!
//! snipdex reads markdown content files from a set of configured
//! repositories, extracts their metadata and code blocks, enriches them with
//! version-control history, ranks them, and assembles paginated, sorted
//! listing pages for a static site.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Source    │──▶│  Frontmatter │──▶│ Code blocks  │
//! │   reader    │   │  + metadata  │   │ + text       │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!        │                                    │
//!        ▼                                    ▼
//! ┌─────────────┐                      ┌──────────────┐
//! │   History   │─────────────────────▶│   Ranking    │
//! │  (git log)  │                      │ + tokenizer  │
//! └─────────────┘                      └──────┬───────┘
//!                                             │
//!                                             ▼
//!                      ┌──────────────┐   ┌──────────────┐
//!                      │ index.json + │◀──│   Listing    │
//!                      │   pages/     │   │  assembler   │
//!                      └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! snipdex sources                    # check configured repositories
//! snipdex build --dry-run            # count records and pages
//! snipdex build                      # write index.json and pages/
//! snipdex inspect python head.md     # one record with its ranking breakdown
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and repository validation |
//! | [`models`] | Core record types |
//! | [`source`] | Content file discovery and reading |
//! | [`frontmatter`] | Front matter splitting and metadata |
//! | [`code_blocks`] | Fenced code block extraction |
//! | [`style`] | Scoped stylesheet compilation |
//! | [`history`] | Version-control history enrichment |
//! | [`rules`] | Text rewriting rules |
//! | [`text`] | Text normalization, excerpts, slugs |
//! | [`tokenizer`] | Search token generation |
//! | [`ranking`] | Ranking score and breakdown |
//! | [`snippet`] | Per-record pipeline |
//! | [`listing`] | Sorting, grouping, and pagination |
//! | [`build`] | Whole-corpus build |
//! | [`export`] | JSON output |
//! | [`inspect`] | Single-record inspection |
//! | [`sources`] | Repository status |
//! | [`progress`] | Build progress reporting |

pub mod build;
pub mod code_blocks;
pub mod config;
pub mod export;
pub mod frontmatter;
pub mod history;
pub mod inspect;
pub mod listing;
pub mod models;
pub mod ordered;
pub mod progress;
pub mod ranking;
pub mod rules;
pub mod snippet;
pub mod source;
pub mod sources;
pub mod style;
pub mod text;
pub mod tokenizer;
