//! The Edimap: one mapping model per message type and version.

use std::sync::OnceLock;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{SegmentGroup, Structure};
use crate::base::Delimiters;
use crate::config::UnmappedPolicy;

// ============================================================================
// KEYS AND DESCRIPTION
// ============================================================================

/// Identifies a mapping model: message name plus version.
///
/// For UN/EDIFACT the name is the message type (`INVOIC`) and the version is
/// the version and release joined by `:` (`D:93A`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageKey {
    pub name: SmolStr,
    pub version: SmolStr,
}

impl MessageKey {
    pub fn new(name: impl Into<SmolStr>, version: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Name, version and namespace of a mapping model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub name: SmolStr,
    pub version: SmolStr,
    /// Namespace URI of every element produced from this model.
    pub namespace: String,
    /// Prefix used in qualified element names; unprefixed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<SmolStr>,
}

impl Description {
    pub fn new(
        name: impl Into<SmolStr>,
        version: impl Into<SmolStr>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            namespace: namespace.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<SmolStr>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.name.clone(), self.version.clone())
    }
}

// ============================================================================
// EDIMAP
// ============================================================================

/// A complete mapping model.
///
/// Built once, validated, then shared read-only (usually behind an `Arc`)
/// by every parse that needs it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edimap {
    pub description: Description,
    #[serde(default)]
    pub delimiters: Delimiters,
    #[serde(rename = "segments")]
    pub root: SegmentGroup,
    /// Overrides the parser's unmapped segment policy for this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmapped_segments: Option<UnmappedPolicy>,
    #[serde(skip)]
    known_codes: OnceLock<FxHashSet<SmolStr>>,
}

impl Edimap {
    pub fn new(description: Description, delimiters: Delimiters, root: SegmentGroup) -> Self {
        Self {
            description,
            delimiters,
            root,
            unmapped_segments: None,
            known_codes: OnceLock::new(),
        }
    }

    pub fn with_unmapped_segments(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped_segments = Some(policy);
        self
    }

    pub fn key(&self) -> MessageKey {
        self.description.key()
    }

    /// True if any segment anywhere in the model carries `code`.
    pub fn is_known_code(&self, code: &str) -> bool {
        self.known_codes
            .get_or_init(|| {
                let mut codes = FxHashSet::default();
                collect_codes(&self.root, &mut codes);
                codes
            })
            .contains(code)
    }
}

fn collect_codes(group: &SegmentGroup, codes: &mut FxHashSet<SmolStr>) {
    for child in &group.children {
        match child {
            Structure::Group(nested) => collect_codes(nested, codes),
            Structure::Segment(segment) => {
                codes.insert(segment.code.clone());
            }
        }
    }
}

impl PartialEq for Edimap {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.delimiters == other.delimiters
            && self.root == other.root
            && self.unmapped_segments == other.unmapped_segments
    }
}

impl Eq for Edimap {}
