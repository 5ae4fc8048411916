//! Generic CSS selector extraction
//!
//! Applies the site-agnostic selectors carried by each field spec.

use super::{Candidate, FieldExtractor, Source};
use crate::document::CoursePage;
use crate::fields::FieldSpec;

pub struct CssExtractor;

impl FieldExtractor for CssExtractor {
    fn source(&self) -> Source {
        Source::GenericSelector
    }

    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate> {
        page.first_match(&spec.selectors)
            .into_iter()
            .map(|raw| Candidate::new(Source::GenericSelector, raw))
            .collect()
    }
}
