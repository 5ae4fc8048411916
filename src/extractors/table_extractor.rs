//! Key/value extraction from tables, definition lists and label/value containers

use std::sync::Arc;

use tracing::debug;

use super::{Candidate, FieldExtractor, Source};
use crate::document::CoursePage;
use crate::fields::{FieldSpec, FieldTable, LabelMatch};

/// Shorter values carry no information
const MIN_VALUE_CHARS: usize = 2;

pub struct TableExtractor {
    fields: Arc<FieldTable>,
}

impl TableExtractor {
    pub fn new(fields: Arc<FieldTable>) -> Self {
        Self { fields }
    }
}

impl FieldExtractor for TableExtractor {
    fn source(&self) -> Source {
        Source::TableKeyValue
    }

    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (label, value) in page.key_value_pairs() {
            if value.chars().count() < MIN_VALUE_CHARS {
                continue;
            }
            match self.fields.match_label(label) {
                LabelMatch::Field(field) if field == spec.field => {
                    candidates.push(Candidate::new(Source::TableKeyValue, value.clone()));
                }
                LabelMatch::Ambiguous(fields) if fields.contains(&spec.field) => {
                    debug!(url = page.url(), %label, ?fields, "skipping ambiguous label");
                }
                _ => {}
            }
        }
        candidates
    }
}
