//! Per-field strategy cascade

use std::sync::Arc;

use tracing::{debug, trace};

use crate::document::CoursePage;
use crate::extractors::FieldExtractor;
use crate::fields::{CourseField, FieldTable};
use crate::record::ResolvedField;

/// Runs the extractors for one field and keeps the first valid candidate
pub struct FieldResolver {
    fields: Arc<FieldTable>,
    extractors: Vec<Box<dyn FieldExtractor>>,
}

impl FieldResolver {
    /// `extractors` are consulted in the given order
    pub fn new(fields: Arc<FieldTable>, extractors: Vec<Box<dyn FieldExtractor>>) -> Self {
        Self { fields, extractors }
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Resolve one field.
    ///
    /// The first extractor with at least one valid candidate decides the
    /// value; later extractors are not consulted.
    pub fn resolve(&self, page: &CoursePage, field: CourseField) -> ResolvedField {
        let spec = self.fields.get(field);

        for extractor in &self.extractors {
            for candidate in extractor.extract(page, spec) {
                match spec.accept(&candidate.raw) {
                    Some(value) => {
                        debug!(%field, source = %candidate.source, %value, "resolved field");
                        return ResolvedField::Resolved {
                            value,
                            source: candidate.source,
                            raw: candidate.raw,
                            unit: spec.unit.clone(),
                        };
                    }
                    None => {
                        trace!(%field, source = %candidate.source, raw = %candidate.raw, "rejected candidate");
                    }
                }
            }
        }

        debug!(%field, url = page.url(), "field unresolved");
        ResolvedField::Unresolved
    }
}
