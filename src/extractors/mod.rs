//! Candidate extractors
//!
//! Each module implements one extraction strategy behind [`FieldExtractor`].
//! The resolver consults them in [`Source::PRIORITY`] order.

mod css_extractor;
mod jsonld_extractor;
mod site_profile_extractor;
mod table_extractor;
mod text_pattern_extractor;

pub use css_extractor::*;
pub use jsonld_extractor::*;
pub use site_profile_extractor::*;
pub use table_extractor::*;
pub use text_pattern_extractor::*;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::CoursePage;
use crate::fields::{FieldSpec, FieldTable};
use crate::profiles::SiteProfileTable;

/// Which strategy produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    StructuredData,
    SiteProfile,
    TableKeyValue,
    GenericSelector,
    TextPattern,
}

impl Source {
    pub const PRIORITY: [Source; 5] = [
        Source::StructuredData,
        Source::SiteProfile,
        Source::TableKeyValue,
        Source::GenericSelector,
        Source::TextPattern,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::StructuredData => "structured_data",
            Source::SiteProfile => "site_profile",
            Source::TableKeyValue => "table_key_value",
            Source::GenericSelector => "generic_selector",
            Source::TextPattern => "text_pattern",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated raw text proposed for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: Source,
    pub raw: String,
}

impl Candidate {
    pub fn new(source: Source, raw: impl Into<String>) -> Self {
        Self {
            source,
            raw: raw.into(),
        }
    }
}

/// One extraction strategy.
///
/// Implementations only read the page and their tables.
pub trait FieldExtractor: Send + Sync {
    fn source(&self) -> Source;

    /// Candidates for `spec.field`, best first
    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate>;
}

/// The five strategies in priority order
pub fn default_extractors(
    fields: Arc<FieldTable>,
    profiles: Arc<SiteProfileTable>,
    accepted_types: &[String],
) -> Vec<Box<dyn FieldExtractor>> {
    vec![
        Box::new(JsonLdExtractor::new(accepted_types.to_vec())),
        Box::new(SiteProfileExtractor::new(profiles)),
        Box::new(TableExtractor::new(fields)),
        Box::new(CssExtractor),
        Box::new(TextPatternExtractor),
    ]
}
