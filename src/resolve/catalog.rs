//! Source catalog construction
//!
//! Turns the named upstream slots for a title into the ordered list of
//! candidate sources the session controller walks on failure. The policy is
//! fixed: the enhanced slot is tried twice (first as an extractable stream,
//! then as a raw embedded frame on the same URL) before any other upstream.

use serde::{Deserialize, Serialize};

use crate::models::{CandidateSource, SourceStrategy};

/// Named upstream slots for one title; absent slots are skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSlots {
    /// Direct/enhanced upstream, eligible for stream extraction
    pub enhanced: Option<String>,
    /// Standard embed-only upstream
    pub standard: Option<String>,
    /// Last-resort embed-only upstream
    pub alternate: Option<String>,
}

impl SourceSlots {
    /// Render slot URL templates for a title id
    pub fn from_templates(title_id: &str, templates: &SlotTemplates) -> Self {
        Self {
            enhanced: templates.enhanced.as_deref().map(|t| render(t, title_id)),
            standard: templates.standard.as_deref().map(|t| render(t, title_id)),
            alternate: templates.alternate.as_deref().map(|t| render(t, title_id)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enhanced.is_none() && self.standard.is_none() && self.alternate.is_none()
    }
}

/// Per-slot URL templates with an `{id}` placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTemplates {
    pub enhanced: Option<String>,
    pub standard: Option<String>,
    pub alternate: Option<String>,
}

fn render(template: &str, title_id: &str) -> String {
    template.replace("{id}", title_id)
}

/// Build the priority-ordered catalog for a set of upstream slots
///
/// The enhanced slot is listed twice against the same URL: once for stream
/// extraction at the top priority, once as an embedded-frame fallback right
/// behind it. Remaining slots append as frame entries in fixed order. The
/// returned order never changes at runtime; failures only move the cursor.
pub fn build_catalog(slots: &SourceSlots) -> Vec<CandidateSource> {
    let mut catalog = Vec::new();
    let mut priority = 0u8;

    if let Some(url) = &slots.enhanced {
        catalog.push(CandidateSource {
            name: "Primary".to_string(),
            locator_url: url.clone(),
            strategy: SourceStrategy::Resolved,
            priority,
        });
        priority += 1;
        catalog.push(CandidateSource {
            name: "Primary (embed)".to_string(),
            locator_url: url.clone(),
            strategy: SourceStrategy::Frame,
            priority,
        });
        priority += 1;
    }

    if let Some(url) = &slots.standard {
        catalog.push(CandidateSource {
            name: "Mirror".to_string(),
            locator_url: url.clone(),
            strategy: SourceStrategy::Frame,
            priority,
        });
        priority += 1;
    }

    if let Some(url) = &slots.alternate {
        catalog.push(CandidateSource {
            name: "Backup".to_string(),
            locator_url: url.clone(),
            strategy: SourceStrategy::Frame,
            priority,
        });
    }

    catalog
}
