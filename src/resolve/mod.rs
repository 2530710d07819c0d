//! Source resolution
//!
//! - Extract: pull playable media URLs out of upstream embed pages
//! - Catalog: build the priority-ordered list of candidate sources

pub mod catalog;
pub mod extract;

pub use catalog::{build_catalog, SlotTemplates, SourceSlots};
pub use extract::MediaExtractor;

use thiserror::Error;

/// Resolution layer errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}
